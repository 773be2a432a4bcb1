//! Core composition model for rivet.
//!
//! This crate provides the data structures the verification pass reasons about:
//! - [`types`] - Type identities, producer keys, diagnostic kinds and verification modes
//! - [`lifestyle`] - Lifestyles and their scope-width ordering
//! - [`activation`] - Activators, dependencies and the arguments handed to factories
//! - [`registration`] - Immutable registrations with their instance caches
//! - [`producer`] - Instance producers and their construction strategies
//! - [`registry`] - The producer registry, indexed by stable identity
//! - [`container`] - The [`Container`](container::Container) and its Open/Frozen lifecycle
//! - [`graph`] - Dependency-graph snapshot over prepared strategies
//! - [`config`] - Configuration loading from `rivet.json`
//! - [`hash`] - Deterministic fingerprints (base62 of xxhash64)

pub mod activation;
pub mod config;
pub mod container;
pub mod error;
pub mod graph;
pub mod hash;
pub mod lifecycle;
pub mod lifestyle;
pub mod producer;
pub mod registration;
pub mod registry;
mod resolver;
pub mod types;

pub use activation::{Activator, Arguments, Dependency, DependencyKind, Instance, Lazy};
pub use config::RivetConfig;
pub use container::{Container, Scope};
pub use error::{BoxError, BuildError, BuildFailure, ConfigError, ContainerError};
pub use graph::DependencyGraph;
pub use lifecycle::CompositionState;
pub use lifestyle::{Caching, Lifestyle};
pub use producer::{ConstructionStrategy, InstanceProducer, ProducerRole, ResolvedDependency};
pub use registration::{Registration, RegistrationKind};
pub use registry::{CollectionItem, OpenCollectionItem};
pub use types::{DiagnosticKind, ProducerKey, RegistrationId, Severity, TypeInfo, VerificationMode};
