//! The container: registration surface, composition lifecycle and resolution.
//!
//! Every mutation takes the registry write lock and checks the lifecycle under
//! it, so a mutation either lands before the freeze or fails with
//! [`ContainerError::Locked`]. Resolution never holds a lock while user code
//! runs.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::ThreadId;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use crate::activation::{Activator, Dependency, DependencyKind, Instance};
use crate::config::RivetConfig;
use crate::error::{BuildError, BuildFailure, ContainerError};
use crate::lifecycle::{CompositionState, Lifecycle};
use crate::lifestyle::Lifestyle;
use crate::producer::{ConstructionStrategy, InstanceProducer, ProducerRole, ResolvedDependency};
use crate::registration::Registration;
use crate::registry::{CollectionItem, ItemPlan, OpenCollectionItem, ProducerRegistry};
use crate::resolver::Resolution;
use crate::types::{ProducerKey, RegistrationId, TypeInfo};

pub(crate) struct ContainerInner {
    config: RivetConfig,
    lifecycle: Lifecycle,
    registry: RwLock<ProducerRegistry>,
}

/// A dependency-injection container. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(RivetConfig::default())
    }

    pub fn with_config(config: RivetConfig) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                config,
                lifecycle: Lifecycle::default(),
                registry: RwLock::new(ProducerRegistry::default()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ContainerInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ContainerInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn config(&self) -> &RivetConfig {
        &self.inner.config
    }

    pub fn state(&self) -> CompositionState {
        self.inner.lifecycle.state()
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.lifecycle.is_frozen()
    }

    // --- registration -----------------------------------------------------

    /// Register `registration` as the one-to-one producer of `service`.
    pub fn register(&self, service: TypeInfo, registration: Registration) -> Result<(), ContainerError> {
        self.register_for_all(&[service], registration)
    }

    /// Register a factory delegate for `service`.
    pub fn register_factory(
        &self,
        service: TypeInfo,
        activator: Activator,
        lifestyle: Lifestyle,
    ) -> Result<(), ContainerError> {
        self.register(service, Registration::delegate(activator, lifestyle))
    }

    /// Register an existing value for `service`.
    pub fn register_instance<T: Any + Send + Sync>(
        &self,
        service: TypeInfo,
        value: T,
    ) -> Result<(), ContainerError> {
        let implementation = TypeInfo::of::<T>();
        self.register(service, Registration::instance(implementation, value))
    }

    /// Register one registration under several services. The producers share
    /// the registration and therefore its cached instance.
    pub fn register_for_all(
        &self,
        services: &[TypeInfo],
        registration: Registration,
    ) -> Result<(), ContainerError> {
        let mut registry = self.inner.registry.write();
        self.inner.lifecycle.ensure_open("register")?;
        let allow_override = self.inner.config.container.allow_overriding_registrations;
        if !allow_override {
            if let Some(taken) = services.iter().find(|s| registry.is_registered(s)) {
                return Err(ContainerError::DuplicateRegistration {
                    service: taken.name().to_string(),
                });
            }
        }
        let registration = Arc::new(registration);
        for service in services {
            tracing::debug!(
                service = %service,
                implementation = %registration.implementation(),
                lifestyle = %registration.lifestyle(),
                "registered"
            );
            registry.register(service.clone(), registration.clone(), allow_override)?;
        }
        Ok(())
    }

    /// Register the items of the collection of `element`. Appends when the
    /// collection already exists.
    pub fn register_collection(
        &self,
        element: TypeInfo,
        items: Vec<CollectionItem>,
    ) -> Result<(), ContainerError> {
        let mut registry = self.inner.registry.write();
        self.inner.lifecycle.ensure_open("register_collection")?;
        tracing::debug!(element = %element, items = items.len(), "collection registered");
        registry.add_collection_items(&element, items);
        Ok(())
    }

    pub fn append_to_collection(&self, element: TypeInfo, item: CollectionItem) -> Result<(), ContainerError> {
        let mut registry = self.inner.registry.write();
        self.inner.lifecycle.ensure_open("append_to_collection")?;
        registry.add_collection_items(&element, vec![item]);
        Ok(())
    }

    /// Register items of the collection of every closed version of `definition`.
    pub fn register_open_collection(
        &self,
        definition: TypeInfo,
        items: Vec<OpenCollectionItem>,
    ) -> Result<(), ContainerError> {
        let mut registry = self.inner.registry.write();
        self.inner.lifecycle.ensure_open("register_open_collection")?;
        tracing::debug!(definition = %definition, items = items.len(), "open collection registered");
        registry.add_open_collection_items(&definition, items);
        Ok(())
    }

    /// Wrap every producer of `service` (one-to-one, implicit, collection
    /// items) in a decorator. The activator reaches the wrapped component through
    /// a [`Dependency::decoratee`] or [`Dependency::lazy_decoratee`].
    pub fn register_decorator(
        &self,
        service: TypeInfo,
        activator: Activator,
        lifestyle: Lifestyle,
    ) -> Result<(), ContainerError> {
        let mut registry = self.inner.registry.write();
        self.inner.lifecycle.ensure_open("register_decorator")?;
        tracing::debug!(service = %service, decorator = %activator.implementation(), "decorator registered");
        registry.add_decorator(service, activator, lifestyle);
        Ok(())
    }

    /// Make a concrete type constructible without an explicit registration.
    pub fn add_known_type(&self, activator: Activator) -> Result<(), ContainerError> {
        let mut registry = self.inner.registry.write();
        self.inner.lifecycle.ensure_open("add_known_type")?;
        registry.add_known_type(activator);
        Ok(())
    }

    pub fn on_unregistered_type<F>(&self, hook: F) -> Result<(), ContainerError>
    where
        F: Fn(&TypeInfo) -> Option<Registration> + Send + Sync + 'static,
    {
        let mut registry = self.inner.registry.write();
        self.inner.lifecycle.ensure_open("on_unregistered_type")?;
        registry.unregistered_hooks.push(Arc::new(hook));
        Ok(())
    }

    pub fn on_strategy_prepared<F>(&self, hook: F) -> Result<(), ContainerError>
    where
        F: Fn(&InstanceProducer, &ConstructionStrategy) + Send + Sync + 'static,
    {
        let mut registry = self.inner.registry.write();
        self.inner.lifecycle.ensure_open("on_strategy_prepared")?;
        registry.strategy_hooks.push(Arc::new(hook));
        Ok(())
    }

    // --- lifecycle ----------------------------------------------------------

    /// Freeze the composition. Idempotent; decorators are applied on the
    /// transition.
    pub fn freeze(&self) {
        if self.inner.lifecycle.is_frozen() {
            return;
        }
        let mut registry = self.inner.registry.write();
        if self.inner.lifecycle.freeze() {
            registry.seal();
            tracing::debug!("container frozen");
        }
    }

    // --- resolution ---------------------------------------------------------

    pub fn get_instance(&self, service: &TypeInfo) -> Result<Instance, ContainerError> {
        self.resolve(service, None)
    }

    /// Resolve a concrete type registered as itself.
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        let service = TypeInfo::of::<T>();
        downcast::<T>(self.resolve(&service, None)?, &service)
    }

    /// Resolve a trait-object service, e.g. `get_service::<dyn Plugin>()`.
    pub fn get_service<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>, ContainerError> {
        let service = TypeInfo::of::<S>();
        downcast_service::<S>(self.resolve(&service, None)?, &service)
    }

    pub fn get_all_instances(&self, element: &TypeInfo) -> Result<Vec<Instance>, ContainerError> {
        self.resolve_all(element, None)
    }

    pub fn get_all_services<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<S>>, ContainerError> {
        let element = TypeInfo::of::<S>();
        self.resolve_all(&element, None)?
            .into_iter()
            .map(|item| downcast_service::<S>(item, &element))
            .collect()
    }

    pub fn begin_scope(&self) -> Scope {
        Scope {
            container: self.clone(),
            cache: Arc::new(ScopeCache::default()),
        }
    }

    /// The producer that would serve `service`. Never instantiates.
    pub fn producer_for(&self, service: &TypeInfo) -> Result<Arc<InstanceProducer>, ContainerError> {
        self.freeze();
        self.find_or_resolve(service, None)
            .map_err(|error| BuildFailure::new(error, service.name()).with_path(vec![service.name().to_string()]).into())
    }

    /// The producer for the collection of `element`; empty when nothing is registered.
    pub fn collection_producer(&self, element: &TypeInfo) -> Arc<InstanceProducer> {
        self.freeze();
        if let Some(existing) = self.inner.registry.read().collection_producer(element) {
            return existing;
        }
        self.inner
            .registry
            .write()
            .insert_collection_producer(element)
    }

    /// Every producer the composition defines, closed collections of open
    /// collections included. Freezes the container.
    pub fn producers(&self) -> Vec<Arc<InstanceProducer>> {
        self.freeze();
        let elements = self.inner.registry.read().collection_elements();
        for element in &elements {
            self.collection_producer(element);
        }
        self.inner.registry.read().producers()
    }

    /// Prepare (and memoise) the construction strategy of `producer`: resolve
    /// every dependency to a producer. Never instantiates anything.
    pub fn prepare_strategy(
        &self,
        producer: &InstanceProducer,
    ) -> Result<Arc<ConstructionStrategy>, BuildFailure> {
        if let Some(strategy) = producer.strategy() {
            return Ok(strategy.clone());
        }
        self.freeze();
        let mut fresh = false;
        let strategy = producer
            .strategy_cell()
            .get_or_try_init(|| {
                fresh = true;
                self.build_strategy(producer).map(Arc::new)
            })
            .map_err(|error| {
                BuildFailure::new(error, producer.implementation().name())
                    .with_path(vec![producer.service().name().to_string()])
            })?
            .clone();

        if fresh {
            tracing::debug!(
                service = %producer.service(),
                dependencies = strategy.dependencies.len(),
                "strategy prepared"
            );
            let hooks = self.inner.registry.read().strategy_hooks.clone();
            for hook in hooks {
                hook(producer, strategy.as_ref());
            }
        }
        Ok(strategy)
    }

    /// Build `producer` inside `scope`.
    pub fn instantiate(&self, producer: &Arc<InstanceProducer>, scope: &Scope) -> Result<Instance, BuildFailure> {
        Resolution::new(self, Some(scope.cache.clone())).build(producer)
    }

    /// Monotonic counter bumped whenever a producer is added after registration.
    pub fn registry_generation(&self) -> u64 {
        self.inner.registry.read().generation()
    }

    /// Producers `thread` added after `generation`.
    pub fn discovered_since(&self, generation: u64, thread: ThreadId) -> Vec<ProducerKey> {
        self.inner.registry.read().discovered_since(generation, thread)
    }

    // --- internals ----------------------------------------------------------

    fn resolve(&self, service: &TypeInfo, scope: Option<Arc<ScopeCache>>) -> Result<Instance, ContainerError> {
        let producer = self.producer_for(service)?;
        Ok(Resolution::new(self, scope).build(&producer)?)
    }

    fn resolve_all(&self, element: &TypeInfo, scope: Option<Arc<ScopeCache>>) -> Result<Vec<Instance>, ContainerError> {
        let producer = self.collection_producer(element);
        let value = Resolution::new(self, scope).build(&producer)?;
        value
            .downcast_ref::<Vec<Instance>>()
            .cloned()
            .ok_or_else(|| ContainerError::TypeMismatch {
                service: element.collection_name(),
                requested: "Vec<Instance>".to_string(),
            })
    }

    fn build_strategy(&self, producer: &InstanceProducer) -> Result<ConstructionStrategy, BuildError> {
        if let ProducerRole::Collection { element } = producer.role() {
            let dependencies = self
                .collect_items(element)?
                .into_iter()
                .map(|item| ResolvedDependency {
                    kind: DependencyKind::Item,
                    parameter: None,
                    producer: item,
                })
                .collect();
            return Ok(ConstructionStrategy::new(dependencies));
        }

        let enforce = self.inner.config.container.enforce_lifestyle_mismatches;
        let mut dependencies = Vec::new();
        for dependency in producer.registration().activator().dependencies() {
            let target = match dependency.kind {
                DependencyKind::Direct | DependencyKind::Lazy | DependencyKind::Item => {
                    self.find_or_resolve(&dependency.service, Some((producer, dependency)))?
                }
                DependencyKind::Collection => self.collection_producer(&dependency.service),
                DependencyKind::Decoratee | DependencyKind::LazyDecoratee => producer
                    .decoratee()
                    .cloned()
                    .ok_or_else(|| unregistered(&dependency.service, Some((producer, dependency))))?,
            };
            if enforce
                && matches!(dependency.kind, DependencyKind::Direct | DependencyKind::Decoratee)
                && producer.lifestyle().outlives(target.lifestyle())
            {
                return Err(BuildError::LifestyleMismatch {
                    consumer: producer.implementation().name().to_string(),
                    consumer_lifestyle: producer.lifestyle().name().to_string(),
                    dependency: target.service().name().to_string(),
                    implementation: target.implementation().name().to_string(),
                    dependency_lifestyle: target.lifestyle().name().to_string(),
                });
            }
            dependencies.push(ResolvedDependency {
                kind: dependency.kind,
                parameter: dependency.parameter.clone(),
                producer: target,
            });
        }
        Ok(ConstructionStrategy::new(dependencies))
    }

    /// Resolve a one-to-one dependency: registered or implicit producer,
    /// then hooks, then (when enabled) a known concrete type.
    fn find_or_resolve(
        &self,
        service: &TypeInfo,
        consumer: Option<(&InstanceProducer, &Dependency)>,
    ) -> Result<Arc<InstanceProducer>, BuildError> {
        if let Some(existing) = self.inner.registry.read().lookup(service) {
            return Ok(existing);
        }
        if let Some(producer) = self.resolve_through_hooks(service) {
            return Ok(producer);
        }
        if self.inner.config.container.resolve_unregistered_concrete_types && !service.is_abstract() {
            if let Some(producer) = self.resolve_known_type(service) {
                return Ok(producer);
            }
        }
        Err(unregistered(service, consumer))
    }

    fn resolve_through_hooks(&self, service: &TypeInfo) -> Option<Arc<InstanceProducer>> {
        let hooks = self.inner.registry.read().unregistered_hooks.clone();
        hooks.iter().find_map(|hook| hook(service)).map(|registration| {
            self.inner
                .registry
                .write()
                .insert_implicit(service, registration)
        })
    }

    fn resolve_known_type(&self, service: &TypeInfo) -> Option<Arc<InstanceProducer>> {
        let activator = self.inner.registry.read().known_type(service)?;
        let registration = Registration::auto(activator, Lifestyle::transient());
        Some(
            self.inner
                .registry
                .write()
                .insert_implicit(service, registration),
        )
    }

    /// Item producers of the collection of `element`, decorators applied.
    fn collect_items(&self, element: &TypeInfo) -> Result<Vec<Arc<InstanceProducer>>, BuildError> {
        let plans = self.inner.registry.read().item_plans(element);
        let mut items = Vec::with_capacity(plans.len());
        for plan in plans {
            let (producer, wrap) = match plan {
                ItemPlan::Producer(producer) => (producer, true),
                ItemPlan::Type(t) => {
                    let producer = self.resolve_item_type(element, &t, None)?;
                    let wrap = &t != element;
                    (producer, wrap)
                }
                ItemPlan::OpenAbstract { open, closed } => {
                    let producer = self.resolve_item_type(element, &closed, Some(&open))?;
                    let wrap = &closed != element;
                    (producer, wrap)
                }
                ItemPlan::Generic {
                    entry,
                    item,
                    lifestyle,
                    factory,
                } => match factory(element.arguments()) {
                    Some(activator) => {
                        let producer = self.inner.registry.write().insert_generic_item(
                            (entry, item, element.clone()),
                            activator,
                            lifestyle,
                        );
                        (producer, true)
                    }
                    None => continue,
                },
            };
            let producer = if wrap {
                self.inner.registry.write().decorate(element, producer)
            } else {
                producer
            };
            items.push(producer);
        }
        Ok(items)
    }

    /// Resolve a type supplied as a collection item. Concrete known types are
    /// always container-registered; abstract types need a registration or a hook.
    fn resolve_item_type(
        &self,
        element: &TypeInfo,
        item: &TypeInfo,
        open: Option<&TypeInfo>,
    ) -> Result<Arc<InstanceProducer>, BuildError> {
        if let Some(existing) = self.inner.registry.read().lookup(item) {
            return Ok(existing);
        }
        if let Some(producer) = self.resolve_through_hooks(item) {
            return Ok(producer);
        }
        if !item.is_abstract() {
            if let Some(producer) = self.resolve_known_type(item) {
                return Ok(producer);
            }
            return Err(BuildError::Unregistered {
                service: item.name().to_string(),
                consumer: Some(element.collection_name()),
                parameter: None,
            });
        }
        let rendered = match open {
            Some(open) => format!("{} (closed as {})", open.name(), item.name()),
            None => item.name().to_string(),
        };
        Err(BuildError::UnregisteredCollectionItem {
            element: element.name().to_string(),
            item: rendered,
            definition: item.name().to_string(),
        })
    }
}

fn unregistered(service: &TypeInfo, consumer: Option<(&InstanceProducer, &Dependency)>) -> BuildError {
    BuildError::Unregistered {
        service: service.name().to_string(),
        consumer: consumer.map(|(p, _)| p.implementation().name().to_string()),
        parameter: consumer.and_then(|(_, d)| d.parameter.clone()),
    }
}

fn downcast<T: Any + Send + Sync>(instance: Instance, service: &TypeInfo) -> Result<Arc<T>, ContainerError> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            service: service.name().to_string(),
            requested: std::any::type_name::<T>().to_string(),
        })
}

fn downcast_service<S: ?Sized + Send + Sync + 'static>(
    instance: Instance,
    service: &TypeInfo,
) -> Result<Arc<S>, ContainerError> {
    instance
        .downcast_ref::<Arc<S>>()
        .cloned()
        .ok_or_else(|| ContainerError::TypeMismatch {
            service: service.name().to_string(),
            requested: std::any::type_name::<S>().to_string(),
        })
}

/// Per-scope instance cache, one slot per registration.
#[derive(Default)]
pub(crate) struct ScopeCache {
    slots: Mutex<HashMap<RegistrationId, Arc<OnceCell<Instance>>>>,
}

impl ScopeCache {
    pub fn slot(&self, registration: RegistrationId) -> Arc<OnceCell<Instance>> {
        self.slots.lock().entry(registration).or_default().clone()
    }
}

/// A resolution scope. Scoped lifestyles cache one instance per scope.
#[derive(Clone)]
pub struct Scope {
    container: Container,
    cache: Arc<ScopeCache>,
}

impl Scope {
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn get_instance(&self, service: &TypeInfo) -> Result<Instance, ContainerError> {
        self.container.resolve(service, Some(self.cache.clone()))
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        let service = TypeInfo::of::<T>();
        downcast::<T>(self.get_instance(&service)?, &service)
    }

    pub fn get_service<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>, ContainerError> {
        let service = TypeInfo::of::<S>();
        downcast_service::<S>(self.get_instance(&service)?, &service)
    }

    pub fn get_all_instances(&self, element: &TypeInfo) -> Result<Vec<Instance>, ContainerError> {
        self.container.resolve_all(element, Some(self.cache.clone()))
    }
}
