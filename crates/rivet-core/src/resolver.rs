//! Instantiation of producers.
//!
//! Caching is delegated to the lifestyle: per-resolve builds always run, per-scope
//! and per-container builds go through a `OnceCell`, so at most one build is in
//! flight per cache slot and concurrent callers share its result.

use std::sync::Arc;

use crate::activation::{Arguments, DependencyKind, Instance, Lazy};
use crate::container::{Container, ScopeCache};
use crate::error::{BuildError, BuildFailure};
use crate::lifestyle::Caching;
use crate::producer::{ConstructionStrategy, InstanceProducer, ProducerRole};
use crate::types::{ProducerKey, RegistrationId};

struct Frame {
    key: ProducerKey,
    registration: RegistrationId,
    service: String,
    implementation: String,
}

/// One resolution request, tracking the path from the requested producer down
/// to the one being built.
pub(crate) struct Resolution<'a> {
    container: &'a Container,
    scope: Option<Arc<ScopeCache>>,
    stack: Vec<Frame>,
}

impl<'a> Resolution<'a> {
    pub fn new(container: &'a Container, scope: Option<Arc<ScopeCache>>) -> Self {
        Self {
            container,
            scope,
            stack: Vec::new(),
        }
    }

    pub fn build(&mut self, producer: &Arc<InstanceProducer>) -> Result<Instance, BuildFailure> {
        let key = producer.key();
        let registration = producer.registration().id();
        // A registration already on the stack would re-enter its own cache cell.
        if let Some(start) = self
            .stack
            .iter()
            .position(|f| f.key == key || f.registration == registration)
        {
            let mut path: Vec<String> = self.stack[start..]
                .iter()
                .map(|f| f.implementation.clone())
                .collect();
            path.push(producer.implementation().name().to_string());
            return Err(self.fail(producer, BuildError::Cycle { path }));
        }

        let strategy = self
            .container
            .prepare_strategy(producer)
            .map_err(|failure| {
                let mut path = self.service_path();
                path.extend(failure.path.iter().cloned());
                failure.with_path(path)
            })?;

        self.stack.push(Frame {
            key,
            registration,
            service: producer.service().name().to_string(),
            implementation: producer.implementation().name().to_string(),
        });
        let result = self.cached(producer, &strategy);
        self.stack.pop();

        if result.is_ok() {
            producer.mark_instantiated();
        }
        result
    }

    fn cached(
        &mut self,
        producer: &Arc<InstanceProducer>,
        strategy: &ConstructionStrategy,
    ) -> Result<Instance, BuildFailure> {
        let registration = producer.registration().clone();
        match registration.lifestyle().caching() {
            Caching::PerResolve => self.create(producer, strategy),
            Caching::PerContainer => registration
                .cache()
                .get_or_try_init(|| self.create(producer, strategy))
                .cloned(),
            Caching::PerScope => {
                let scope = match &self.scope {
                    Some(scope) => scope.clone(),
                    None => {
                        return Err(self.fail(
                            producer,
                            BuildError::ScopeRequired {
                                implementation: producer.implementation().name().to_string(),
                                lifestyle: registration.lifestyle().name().to_string(),
                            },
                        ))
                    }
                };
                let slot = scope.slot(registration.id());
                slot.get_or_try_init(|| self.create(producer, strategy))
                    .cloned()
            }
        }
    }

    fn create(
        &mut self,
        producer: &Arc<InstanceProducer>,
        strategy: &ConstructionStrategy,
    ) -> Result<Instance, BuildFailure> {
        if producer.is_collection() {
            let mut items = Vec::with_capacity(strategy.dependencies.len());
            for dependency in &strategy.dependencies {
                items.push(self.build(&dependency.producer)?);
            }
            return Ok(Arc::new(items) as Instance);
        }

        let mut values = Vec::with_capacity(strategy.dependencies.len());
        for dependency in &strategy.dependencies {
            let value = match dependency.kind {
                DependencyKind::Lazy | DependencyKind::LazyDecoratee => Arc::new(Lazy::new(
                    self.container.downgrade(),
                    dependency.producer.clone(),
                    self.scope.clone(),
                )) as Instance,
                _ => self.build(&dependency.producer)?,
            };
            values.push(value);
        }

        let args = Arguments::new(producer.implementation().clone(), values);
        tracing::trace!(implementation = %producer.implementation(), "activating");
        match producer.registration().activator().activate(&args) {
            Ok(Some(instance)) => Ok(instance),
            Ok(None) => {
                let error = match producer.role() {
                    ProducerRole::CollectionItem { collection } => BuildError::NullCollectionItem {
                        element: collection.name().to_string(),
                    },
                    _ => BuildError::NullInstance {
                        service: producer.service().name().to_string(),
                    },
                };
                Err(self.fail(producer, error))
            }
            Err(source) => Err(self.fail(
                producer,
                BuildError::Activation {
                    implementation: producer.implementation().name().to_string(),
                    source,
                },
            )),
        }
    }

    fn service_path(&self) -> Vec<String> {
        self.stack.iter().map(|f| f.service.clone()).collect()
    }

    fn fail(&self, producer: &InstanceProducer, error: BuildError) -> BuildFailure {
        let mut path = self.service_path();
        if self.stack.last().map(|f| f.key != producer.key()).unwrap_or(true) {
            path.push(producer.service().name().to_string());
        }
        tracing::debug!(implementation = %producer.implementation(), error = %error, "build failed");
        BuildFailure::new(error, producer.implementation().name()).with_path(path)
    }
}
