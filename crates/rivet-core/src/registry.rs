//! The producer registry: every instance producer, indexed by stable identity.
//!
//! Iteration order is insertion order throughout, so graph building, the
//! verification walk and every analyzer see producers in the same order for the
//! same composition.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::ThreadId;

use crate::activation::Activator;
use crate::error::ContainerError;
use crate::lifestyle::Lifestyle;
use crate::producer::{ConstructionStrategy, InstanceProducer, ProducerRole};
use crate::registration::Registration;
use crate::types::{ProducerKey, TypeInfo};

/// Hook consulted when a requested service has no registration.
pub type UnregisteredTypeHook = Arc<dyn Fn(&TypeInfo) -> Option<Registration> + Send + Sync>;

/// Hook told about every freshly prepared construction strategy.
pub type StrategyHook = Arc<dyn Fn(&InstanceProducer, &ConstructionStrategy) + Send + Sync>;

/// Builds an activator for a generic implementation closed over type arguments,
/// or declines with `None` when the arguments don't fit its constraints.
pub type GenericFactory = Arc<dyn Fn(&[TypeInfo]) -> Option<Activator> + Send + Sync>;

/// One item of a closed collection.
pub enum CollectionItem {
    /// A dedicated registration, hidden behind its own item producer.
    Registration(Registration),
    /// A type, resolved like any other dependency when the collection is prepared.
    Type(TypeInfo),
}

/// One item of an open-generic collection.
pub enum OpenCollectionItem {
    /// A registration for one closed service of the definition.
    Registration {
        service: TypeInfo,
        registration: Registration,
    },
    /// A type. Concrete types apply to every closed service they implement; the
    /// open definition itself applies to every closed version of it.
    Type(TypeInfo),
    /// A generic implementation closed on demand.
    Generic {
        definition: TypeInfo,
        lifestyle: Lifestyle,
        factory: GenericFactory,
    },
}

impl OpenCollectionItem {
    pub fn generic<F>(definition: TypeInfo, lifestyle: Lifestyle, factory: F) -> Self
    where
        F: Fn(&[TypeInfo]) -> Option<Activator> + Send + Sync + 'static,
    {
        OpenCollectionItem::Generic {
            definition,
            lifestyle,
            factory: Arc::new(factory),
        }
    }
}

#[derive(Clone)]
pub(crate) enum ItemSource {
    Producer(Arc<InstanceProducer>),
    Type(TypeInfo),
}

/// What the container must resolve to build one collection item.
pub(crate) enum ItemPlan {
    Producer(Arc<InstanceProducer>),
    Type(TypeInfo),
    /// The abstract open definition, closed over the collection's arguments.
    OpenAbstract { open: TypeInfo, closed: TypeInfo },
    Generic {
        entry: usize,
        item: usize,
        lifestyle: Lifestyle,
        factory: GenericFactory,
    },
}

struct CollectionEntry {
    element: TypeInfo,
    items: Vec<ItemSource>,
}

enum OpenItemSource {
    Producer(Arc<InstanceProducer>),
    Type(TypeInfo),
    Generic {
        lifestyle: Lifestyle,
        factory: GenericFactory,
    },
}

struct OpenCollectionEntry {
    definition: TypeInfo,
    items: Vec<OpenItemSource>,
}

struct DecoratorEntry {
    service: TypeInfo,
    activator: Activator,
    lifestyle: Lifestyle,
}

struct Discovery {
    generation: u64,
    thread: ThreadId,
    key: ProducerKey,
}

#[derive(Default)]
pub(crate) struct ProducerRegistry {
    registered: Vec<Arc<InstanceProducer>>,
    by_service: HashMap<TypeInfo, usize>,
    visible: HashMap<TypeInfo, Arc<InstanceProducer>>,
    collections: Vec<CollectionEntry>,
    open_collections: Vec<OpenCollectionEntry>,
    decorators: Vec<DecoratorEntry>,
    known_types: HashMap<TypeInfo, Activator>,
    implicit: Vec<Arc<InstanceProducer>>,
    implicit_by_service: HashMap<TypeInfo, Arc<InstanceProducer>>,
    collection_producers: Vec<Arc<InstanceProducer>>,
    collection_by_element: HashMap<TypeInfo, Arc<InstanceProducer>>,
    generic_items: HashMap<(usize, usize, TypeInfo), Arc<InstanceProducer>>,
    discovered: Vec<Discovery>,
    generation: u64,
    pub(crate) unregistered_hooks: Vec<UnregisteredTypeHook>,
    pub(crate) strategy_hooks: Vec<StrategyHook>,
}

impl ProducerRegistry {
    pub fn register(
        &mut self,
        service: TypeInfo,
        registration: Arc<Registration>,
        allow_override: bool,
    ) -> Result<(), ContainerError> {
        let producer = Arc::new(InstanceProducer::new(
            service.clone(),
            registration,
            ProducerRole::Registered,
        ));
        match self.by_service.get(&service) {
            Some(_) if !allow_override => Err(ContainerError::DuplicateRegistration {
                service: service.name().to_string(),
            }),
            Some(&index) => {
                tracing::debug!(service = %service, "overriding registration");
                self.registered[index] = producer;
                Ok(())
            }
            None => {
                self.by_service.insert(service, self.registered.len());
                self.registered.push(producer);
                Ok(())
            }
        }
    }

    pub fn is_registered(&self, service: &TypeInfo) -> bool {
        self.by_service.contains_key(service)
    }

    pub fn add_collection_items(&mut self, element: &TypeInfo, items: Vec<CollectionItem>) {
        let sources: Vec<ItemSource> = items
            .into_iter()
            .map(|item| match item {
                CollectionItem::Registration(registration) => {
                    ItemSource::Producer(Arc::new(InstanceProducer::new(
                        element.clone(),
                        Arc::new(registration),
                        ProducerRole::CollectionItem {
                            collection: element.clone(),
                        },
                    )))
                }
                CollectionItem::Type(t) => ItemSource::Type(t),
            })
            .collect();
        match self.collections.iter_mut().find(|c| &c.element == element) {
            Some(entry) => entry.items.extend(sources),
            None => self.collections.push(CollectionEntry {
                element: element.clone(),
                items: sources,
            }),
        }
    }

    pub fn add_open_collection_items(&mut self, definition: &TypeInfo, items: Vec<OpenCollectionItem>) {
        let sources: Vec<OpenItemSource> = items
            .into_iter()
            .map(|item| match item {
                OpenCollectionItem::Registration {
                    service,
                    registration,
                } => OpenItemSource::Producer(Arc::new(InstanceProducer::new(
                    service.clone(),
                    Arc::new(registration),
                    ProducerRole::CollectionItem { collection: service },
                ))),
                OpenCollectionItem::Type(t) => OpenItemSource::Type(t),
                OpenCollectionItem::Generic {
                    lifestyle, factory, ..
                } => OpenItemSource::Generic { lifestyle, factory },
            })
            .collect();
        match self
            .open_collections
            .iter_mut()
            .find(|c| &c.definition == definition)
        {
            Some(entry) => entry.items.extend(sources),
            None => self.open_collections.push(OpenCollectionEntry {
                definition: definition.clone(),
                items: sources,
            }),
        }
    }

    pub fn add_decorator(&mut self, service: TypeInfo, activator: Activator, lifestyle: Lifestyle) {
        self.decorators.push(DecoratorEntry {
            service,
            activator,
            lifestyle,
        });
    }

    pub fn add_known_type(&mut self, activator: Activator) {
        self.known_types
            .insert(activator.implementation().clone(), activator);
    }

    pub fn known_type(&self, implementation: &TypeInfo) -> Option<Activator> {
        self.known_types.get(implementation).cloned()
    }

    /// Apply decorators to every registered producer. Runs once, at freeze.
    pub fn seal(&mut self) {
        let registered = self.registered.clone();
        for base in registered {
            let outer = self.decorate(base.service(), base.clone());
            self.visible.insert(base.service().clone(), outer);
        }
    }

    /// Wrap `base` in every decorator registered for `service`, in registration
    /// order. Returns the outermost layer.
    pub fn decorate(&mut self, service: &TypeInfo, base: Arc<InstanceProducer>) -> Arc<InstanceProducer> {
        let layers: Vec<(Activator, Lifestyle)> = self
            .decorators
            .iter()
            .filter(|d| &d.service == service)
            .map(|d| (d.activator.clone(), d.lifestyle.clone()))
            .collect();
        let mut current = base;
        for (index, (activator, lifestyle)) in layers.into_iter().enumerate() {
            if current.service() == service {
                current.mark_decorated();
            }
            let registration = Arc::new(Registration::new(activator, lifestyle));
            let layer = Arc::new(InstanceProducer::decorator(
                service.clone(),
                registration,
                index + 1,
                current,
            ));
            self.record(&layer);
            current = layer;
        }
        current
    }

    pub fn has_decorators(&self, service: &TypeInfo) -> bool {
        self.decorators.iter().any(|d| &d.service == service)
    }

    /// Registered or implicit producer for `service`, decorators applied.
    pub fn lookup(&self, service: &TypeInfo) -> Option<Arc<InstanceProducer>> {
        self.visible
            .get(service)
            .or_else(|| self.implicit_by_service.get(service))
            .cloned()
    }

    /// Add an implicit producer unless another thread won the race.
    pub fn insert_implicit(&mut self, service: &TypeInfo, registration: Registration) -> Arc<InstanceProducer> {
        if let Some(existing) = self.lookup(service) {
            return existing;
        }
        let base = Arc::new(InstanceProducer::new(
            service.clone(),
            Arc::new(registration),
            ProducerRole::Implicit,
        ));
        self.record(&base);
        let outer = self.decorate(service, base);
        self.implicit.push(outer.clone());
        self.implicit_by_service.insert(service.clone(), outer.clone());
        tracing::debug!(service = %service, implementation = %outer.implementation(), "implicit producer added");
        outer
    }

    pub fn collection_producer(&self, element: &TypeInfo) -> Option<Arc<InstanceProducer>> {
        self.collection_by_element.get(element).cloned()
    }

    pub fn insert_collection_producer(&mut self, element: &TypeInfo) -> Arc<InstanceProducer> {
        if let Some(existing) = self.collection_producer(element) {
            return existing;
        }
        let producer = Arc::new(InstanceProducer::new(
            element.clone(),
            Arc::new(Registration::collection(element)),
            ProducerRole::Collection {
                element: element.clone(),
            },
        ));
        self.record(&producer);
        self.collection_producers.push(producer.clone());
        self.collection_by_element
            .insert(element.clone(), producer.clone());
        producer
    }

    /// Item producer for a generic item closed over `element`'s arguments.
    pub fn insert_generic_item(
        &mut self,
        key: (usize, usize, TypeInfo),
        activator: Activator,
        lifestyle: Lifestyle,
    ) -> Arc<InstanceProducer> {
        if let Some(existing) = self.generic_items.get(&key) {
            return existing.clone();
        }
        let element = key.2.clone();
        let producer = Arc::new(InstanceProducer::new(
            element.clone(),
            Arc::new(Registration::new(activator, lifestyle)),
            ProducerRole::CollectionItem { collection: element },
        ));
        self.record(&producer);
        self.generic_items.insert(key, producer.clone());
        producer
    }

    /// What must be resolved to build the collection of `element`, in order:
    /// closed-collection items first, then items of every matching open collection.
    pub fn item_plans(&self, element: &TypeInfo) -> Vec<ItemPlan> {
        let mut plans = Vec::new();
        if let Some(entry) = self.collections.iter().find(|c| &c.element == element) {
            for source in &entry.items {
                plans.push(match source {
                    ItemSource::Producer(p) => ItemPlan::Producer(p.clone()),
                    ItemSource::Type(t) => ItemPlan::Type(t.clone()),
                });
            }
        }
        for (entry_index, entry) in self.open_collections.iter().enumerate() {
            if !element.closes(&entry.definition) {
                continue;
            }
            for (item_index, source) in entry.items.iter().enumerate() {
                match source {
                    OpenItemSource::Producer(p) if p.service() == element => {
                        plans.push(ItemPlan::Producer(p.clone()))
                    }
                    OpenItemSource::Producer(_) => {}
                    OpenItemSource::Type(t) if t.is_open() => {
                        if element.closes(t) {
                            plans.push(ItemPlan::OpenAbstract {
                                open: t.clone(),
                                closed: t.close(element.arguments()),
                            });
                        }
                    }
                    OpenItemSource::Type(t) => {
                        if t.implements(element) {
                            plans.push(ItemPlan::Type(t.clone()));
                        }
                    }
                    OpenItemSource::Generic { lifestyle, factory } => plans.push(ItemPlan::Generic {
                        entry: entry_index,
                        item: item_index,
                        lifestyle: lifestyle.clone(),
                        factory: factory.clone(),
                    }),
                }
            }
        }
        plans
    }

    /// Element types of every registered collection, closed types of open
    /// collections included.
    pub fn collection_elements(&self) -> Vec<TypeInfo> {
        let mut elements: Vec<TypeInfo> = self.collections.iter().map(|c| c.element.clone()).collect();
        for entry in &self.open_collections {
            for source in &entry.items {
                let closed: Vec<TypeInfo> = match source {
                    OpenItemSource::Producer(p) => vec![p.service().clone()],
                    OpenItemSource::Type(t) if !t.is_open() => {
                        let mut services: Vec<TypeInfo> = t
                            .services()
                            .iter()
                            .filter(|s| s.closes(&entry.definition))
                            .cloned()
                            .collect();
                        if t.closes(&entry.definition) {
                            services.push(t.clone());
                        }
                        services
                    }
                    _ => Vec::new(),
                };
                for service in closed {
                    if !elements.contains(&service) {
                        elements.push(service);
                    }
                }
            }
        }
        elements
    }

    /// Every producer known so far: registered (decorators applied), then
    /// collections, then implicit producers, each in creation order.
    pub fn producers(&self) -> Vec<Arc<InstanceProducer>> {
        let mut out = Vec::with_capacity(
            self.registered.len() + self.collection_producers.len() + self.implicit.len(),
        );
        for base in &self.registered {
            out.push(
                self.visible
                    .get(base.service())
                    .cloned()
                    .unwrap_or_else(|| base.clone()),
            );
        }
        out.extend(self.collection_producers.iter().cloned());
        out.extend(self.implicit.iter().cloned());
        out
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Producers created by `thread` after `generation`.
    pub fn discovered_since(&self, generation: u64, thread: ThreadId) -> Vec<ProducerKey> {
        self.discovered
            .iter()
            .filter(|d| d.generation > generation && d.thread == thread)
            .map(|d| d.key.clone())
            .collect()
    }

    fn record(&mut self, producer: &InstanceProducer) {
        self.generation += 1;
        self.discovered.push(Discovery {
            generation: self.generation,
            thread: std::thread::current().id(),
            key: producer.key(),
        });
    }
}
