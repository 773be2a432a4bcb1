use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::activation::{DependencyKind, Instance};
use crate::lifestyle::Lifestyle;
use crate::registration::Registration;
use crate::types::{ProducerKey, TypeInfo};

/// Why a producer exists in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ProducerRole {
    /// Explicit one-to-one registration.
    Registered,
    /// Created on demand: unregistered-type hooks or concrete-type fallback.
    Implicit,
    /// Hidden item of a registered collection.
    CollectionItem { collection: TypeInfo },
    /// The collection itself.
    Collection { element: TypeInfo },
    /// Decorator layer; layer 1 wraps the undecorated component.
    Decorator { layer: usize },
}

/// A node of the object graph: one service type bound to one registration.
pub struct InstanceProducer {
    service: TypeInfo,
    registration: Arc<Registration>,
    role: ProducerRole,
    decoratee: Option<Arc<InstanceProducer>>,
    decorated: AtomicBool,
    strategy: OnceCell<Arc<ConstructionStrategy>>,
    instantiated: AtomicBool,
}

impl InstanceProducer {
    pub(crate) fn new(service: TypeInfo, registration: Arc<Registration>, role: ProducerRole) -> Self {
        Self {
            service,
            registration,
            role,
            decoratee: None,
            decorated: AtomicBool::new(false),
            strategy: OnceCell::new(),
            instantiated: AtomicBool::new(false),
        }
    }

    pub(crate) fn decorator(
        service: TypeInfo,
        registration: Arc<Registration>,
        layer: usize,
        decoratee: Arc<InstanceProducer>,
    ) -> Self {
        let mut producer = Self::new(service, registration, ProducerRole::Decorator { layer });
        producer.decoratee = Some(decoratee);
        producer
    }

    pub fn key(&self) -> ProducerKey {
        ProducerKey {
            service: self.service.id().to_string(),
            registration: self.registration.id(),
        }
    }

    pub fn service(&self) -> &TypeInfo {
        &self.service
    }

    pub fn registration(&self) -> &Arc<Registration> {
        &self.registration
    }

    pub fn implementation(&self) -> &TypeInfo {
        self.registration.implementation()
    }

    pub fn lifestyle(&self) -> &Lifestyle {
        self.registration.lifestyle()
    }

    pub fn role(&self) -> &ProducerRole {
        &self.role
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.role, ProducerRole::Collection { .. })
    }

    pub fn is_decorator(&self) -> bool {
        matches!(self.role, ProducerRole::Decorator { .. })
    }

    /// Whether a decorator wraps this producer.
    pub fn is_decorated(&self) -> bool {
        self.decorated.load(Ordering::Acquire)
    }

    pub(crate) fn mark_decorated(&self) {
        self.decorated.store(true, Ordering::Release);
    }

    /// The producer a decorator layer wraps.
    pub fn decoratee(&self) -> Option<&Arc<InstanceProducer>> {
        self.decoratee.as_ref()
    }

    /// The prepared strategy, if preparation has happened.
    pub fn strategy(&self) -> Option<&Arc<ConstructionStrategy>> {
        self.strategy.get()
    }

    pub(crate) fn strategy_cell(&self) -> &OnceCell<Arc<ConstructionStrategy>> {
        &self.strategy
    }

    /// Whether an instance has actually been produced. Preparing a strategy
    /// does not count.
    pub fn is_instantiated(&self) -> bool {
        self.instantiated.load(Ordering::Acquire)
    }

    pub(crate) fn mark_instantiated(&self) {
        self.instantiated.store(true, Ordering::Release);
    }

    /// The container-wide cached instance. Never creates one.
    pub fn cached_instance(&self) -> Option<&Instance> {
        self.registration.cached_instance()
    }
}

impl fmt::Debug for InstanceProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceProducer")
            .field("service", &self.service)
            .field("registration", &self.registration)
            .field("role", &self.role)
            .field("decorated", &self.is_decorated())
            .field("instantiated", &self.is_instantiated())
            .finish()
    }
}

/// One satisfied dependency of a prepared strategy.
#[derive(Debug, Clone)]
pub struct ResolvedDependency {
    pub kind: DependencyKind,
    pub parameter: Option<String>,
    pub producer: Arc<InstanceProducer>,
}

/// The memoised build plan of a producer: its dependencies resolved to
/// producers, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ConstructionStrategy {
    pub dependencies: Vec<ResolvedDependency>,
}

impl ConstructionStrategy {
    pub fn new(dependencies: Vec<ResolvedDependency>) -> Self {
        Self { dependencies }
    }
}
