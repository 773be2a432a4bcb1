use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How instances produced under a lifestyle are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Caching {
    /// A new instance for every request.
    PerResolve,
    /// One instance per [`Scope`](crate::container::Scope).
    PerScope,
    /// One instance for the lifetime of the container.
    PerContainer,
}

/// Instance reuse policy.
///
/// Lifestyles are totally ordered by `length` (their scope width): a consumer
/// must never outlive the producers it depends on directly. Custom lifestyles
/// pick any width, so `transient < custom(250) < scoped` is expressible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lifestyle {
    name: String,
    length: u32,
    caching: Caching,
}

impl Lifestyle {
    pub const TRANSIENT_LENGTH: u32 = 1;
    pub const SCOPED_LENGTH: u32 = 500;
    pub const SINGLETON_LENGTH: u32 = 1000;

    pub fn transient() -> Self {
        Self::custom("Transient", Self::TRANSIENT_LENGTH, Caching::PerResolve)
    }

    pub fn scoped() -> Self {
        Self::custom("Scoped", Self::SCOPED_LENGTH, Caching::PerScope)
    }

    pub fn singleton() -> Self {
        Self::custom("Singleton", Self::SINGLETON_LENGTH, Caching::PerContainer)
    }

    pub fn custom(name: impl Into<String>, length: u32, caching: Caching) -> Self {
        Self {
            name: name.into(),
            length,
            caching,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn caching(&self) -> Caching {
        self.caching
    }

    /// Identity used to group producers that share a lifestyle.
    pub fn identification_key(&self) -> &str {
        &self.name
    }

    pub fn is_transient(&self) -> bool {
        self.caching == Caching::PerResolve
    }

    pub fn is_singleton(&self) -> bool {
        self.caching == Caching::PerContainer
    }

    /// Whether a consumer with this lifestyle outlives `dependency`.
    pub fn outlives(&self, dependency: &Lifestyle) -> bool {
        self.length > dependency.length
    }
}

impl PartialEq for Lifestyle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.length == other.length
    }
}

impl Eq for Lifestyle {}

impl PartialOrd for Lifestyle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lifestyle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.length
            .cmp(&other.length)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for Lifestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
