//! Explicit construction descriptions.
//!
//! An [`Activator`] names the implementation type, the ordered dependencies its
//! factory needs, and the factory itself. The resolver satisfies the
//! dependencies and hands them to the factory as [`Arguments`], in declaration
//! order.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use serde::Serialize;

use crate::container::{ContainerInner, ScopeCache};
use crate::error::{BoxError, BuildError, ContainerError};
use crate::producer::InstanceProducer;
use crate::types::TypeInfo;

/// A produced value. Trait-object services are stored as `Arc<dyn Trait>`
/// payloads inside the outer `Arc`.
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory =
    Arc<dyn Fn(&Arguments) -> Result<Option<Instance>, BoxError> + Send + Sync>;

/// How a dependency is handed to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Built before the consumer and passed by value.
    Direct,
    /// Passed as a [`Lazy`] handle and built on first use.
    Lazy,
    /// Every element of the collection registered for the service.
    Collection,
    /// The component a decorator wraps.
    Decoratee,
    /// The wrapped component, passed as a [`Lazy`] handle.
    LazyDecoratee,
    /// Membership edge from a collection to one of its items.
    Item,
}

impl DependencyKind {
    pub fn is_lazy(&self) -> bool {
        matches!(self, DependencyKind::Lazy | DependencyKind::LazyDecoratee)
    }
}

/// A dependency declared by an activator.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub service: TypeInfo,
    pub kind: DependencyKind,
    pub parameter: Option<String>,
}

impl Dependency {
    pub fn on(service: TypeInfo) -> Self {
        Self::with_kind(service, DependencyKind::Direct)
    }

    pub fn lazy(service: TypeInfo) -> Self {
        Self::with_kind(service, DependencyKind::Lazy)
    }

    /// All elements registered for `element`.
    pub fn collection(element: TypeInfo) -> Self {
        Self::with_kind(element, DependencyKind::Collection)
    }

    pub fn decoratee(service: TypeInfo) -> Self {
        Self::with_kind(service, DependencyKind::Decoratee)
    }

    pub fn lazy_decoratee(service: TypeInfo) -> Self {
        Self::with_kind(service, DependencyKind::LazyDecoratee)
    }

    /// Name the constructor parameter, used in error messages.
    pub fn named(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    fn with_kind(service: TypeInfo, kind: DependencyKind) -> Self {
        Self {
            service,
            kind,
            parameter: None,
        }
    }
}

/// Explicit constructor description: implementation type, dependencies, factory.
#[derive(Clone)]
pub struct Activator {
    implementation: TypeInfo,
    dependencies: Vec<Dependency>,
    factory: Factory,
}

impl Activator {
    /// Activator whose factory always produces a value.
    pub fn new<T, F>(implementation: TypeInfo, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::nullable(implementation, move |args| {
            factory(args).map(|value| Some(Arc::new(value) as Instance))
        })
    }

    /// Activator for the concrete type `T`.
    pub fn of<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::new(TypeInfo::of::<T>(), factory)
    }

    /// Activator whose factory may produce no value (`Ok(None)`).
    pub fn nullable<F>(implementation: TypeInfo, factory: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Option<Instance>, BoxError> + Send + Sync + 'static,
    {
        Self {
            implementation,
            dependencies: Vec::new(),
            factory: Arc::new(factory),
        }
    }

    /// Declare a direct dependency on `service`.
    pub fn depends_on(self, service: TypeInfo) -> Self {
        self.with(Dependency::on(service))
    }

    pub fn with(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn implementation(&self) -> &TypeInfo {
        &self.implementation
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub(crate) fn activate(&self, args: &Arguments) -> Result<Option<Instance>, BoxError> {
        (self.factory)(args)
    }
}

impl fmt::Debug for Activator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activator")
            .field("implementation", &self.implementation)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Resolved dependency values handed to a factory, in declaration order.
pub struct Arguments {
    implementation: TypeInfo,
    values: Vec<Instance>,
}

impl Arguments {
    pub(crate) fn new(implementation: TypeInfo, values: Vec<Instance>) -> Self {
        Self {
            implementation,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn instance(&self, index: usize) -> Result<Instance, BoxError> {
        self.values.get(index).cloned().ok_or_else(|| {
            format!(
                "{} has no dependency at position {} ({} declared)",
                self.implementation,
                index,
                self.values.len()
            )
            .into()
        })
    }

    /// Concrete dependency value.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, BoxError> {
        self.instance(index)?
            .downcast::<T>()
            .map_err(|_| self.mismatch(index, std::any::type_name::<T>()))
    }

    /// Trait-object dependency value (stored as an `Arc<S>` payload).
    pub fn service<S: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<S>, BoxError> {
        let value = self.instance(index)?;
        value
            .downcast_ref::<Arc<S>>()
            .cloned()
            .ok_or_else(|| self.mismatch(index, std::any::type_name::<S>()))
    }

    /// Elements of a collection dependency.
    pub fn collection(&self, index: usize) -> Result<Vec<Instance>, BoxError> {
        let value = self.instance(index)?;
        value
            .downcast_ref::<Vec<Instance>>()
            .cloned()
            .ok_or_else(|| self.mismatch(index, "collection"))
    }

    /// Elements of a collection of trait objects.
    pub fn services<S: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Vec<Arc<S>>, BoxError> {
        self.collection(index)?
            .iter()
            .map(|item| {
                item.downcast_ref::<Arc<S>>()
                    .cloned()
                    .ok_or_else(|| self.mismatch(index, std::any::type_name::<S>()))
            })
            .collect()
    }

    pub fn lazy(&self, index: usize) -> Result<Lazy, BoxError> {
        let value = self.instance(index)?;
        value
            .downcast_ref::<Lazy>()
            .cloned()
            .ok_or_else(|| self.mismatch(index, "Lazy"))
    }

    fn mismatch(&self, index: usize, requested: &str) -> BoxError {
        format!(
            "dependency {} of {} can't be used as {}",
            index, self.implementation, requested
        )
        .into()
    }
}

/// Deferred access to a producer. Building through the handle marks the
/// producer instantiated, exactly like a direct build.
#[derive(Clone)]
pub struct Lazy {
    container: Weak<ContainerInner>,
    producer: Arc<InstanceProducer>,
    scope: Option<Arc<ScopeCache>>,
}

impl Lazy {
    pub(crate) fn new(
        container: Weak<ContainerInner>,
        producer: Arc<InstanceProducer>,
        scope: Option<Arc<ScopeCache>>,
    ) -> Self {
        Self {
            container,
            producer,
            scope,
        }
    }

    pub fn producer(&self) -> &Arc<InstanceProducer> {
        &self.producer
    }

    pub fn get(&self) -> Result<Instance, ContainerError> {
        let inner = self.container.upgrade().ok_or_else(|| {
            crate::error::BuildFailure::new(
                BuildError::ContainerDropped,
                self.producer.implementation().name(),
            )
        })?;
        let container = crate::container::Container::from_inner(inner);
        Ok(crate::resolver::Resolution::new(&container, self.scope.clone())
            .build(&self.producer)?)
    }

    pub fn get_as<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        self.get()?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                service: self.producer.service().name().to_string(),
                requested: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn service<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>, ContainerError> {
        self.get()?
            .downcast_ref::<Arc<S>>()
            .cloned()
            .ok_or_else(|| ContainerError::TypeMismatch {
                service: self.producer.service().name().to_string(),
                requested: std::any::type_name::<S>().to_string(),
            })
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("producer", &self.producer.key())
            .finish_non_exhaustive()
    }
}
