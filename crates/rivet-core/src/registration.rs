use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::activation::{Activator, Instance};
use crate::lifestyle::Lifestyle;
use crate::types::{DiagnosticKind, RegistrationId, TypeInfo};

/// How a registration produces its instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationKind {
    /// Constructor injection through an activator.
    Constructor,
    /// A user-supplied factory delegate.
    Delegate,
    /// One fixed, externally created instance.
    Instance,
    /// A container-controlled collection.
    Collection,
}

/// Immutable description of how one implementation is constructed.
///
/// The per-container instance cache lives here, so every producer sharing a
/// registration observes the same cached instance.
pub struct Registration {
    id: RegistrationId,
    activator: Activator,
    lifestyle: Lifestyle,
    kind: RegistrationKind,
    auto_resolved: bool,
    suppressions: Vec<(DiagnosticKind, String)>,
    cache: OnceCell<Instance>,
}

impl Registration {
    pub fn new(activator: Activator, lifestyle: Lifestyle) -> Self {
        Self::with_kind(activator, lifestyle, RegistrationKind::Constructor)
    }

    pub fn delegate(activator: Activator, lifestyle: Lifestyle) -> Self {
        Self::with_kind(activator, lifestyle, RegistrationKind::Delegate)
    }

    /// Registration for an existing value. Always singleton, always cached.
    pub fn instance<T: Any + Send + Sync>(implementation: TypeInfo, value: T) -> Self {
        let instance: Instance = Arc::new(value);
        let produced = instance.clone();
        let activator =
            Activator::nullable(implementation, move |_| Ok(Some(produced.clone())));
        let registration =
            Self::with_kind(activator, Lifestyle::singleton(), RegistrationKind::Instance);
        let _ = registration.cache.set(instance);
        registration
    }

    pub(crate) fn auto(activator: Activator, lifestyle: Lifestyle) -> Self {
        let mut registration = Self::new(activator, lifestyle);
        registration.auto_resolved = true;
        registration
    }

    pub(crate) fn collection(element: &TypeInfo) -> Self {
        let activator = Activator::nullable(
            TypeInfo::named(format!("alloc::vec::Vec<{}>", element.id())),
            |_| Ok(None),
        );
        Self::with_kind(activator, Lifestyle::transient(), RegistrationKind::Collection)
    }

    fn with_kind(activator: Activator, lifestyle: Lifestyle, kind: RegistrationKind) -> Self {
        Self {
            id: RegistrationId::next(),
            activator,
            lifestyle,
            kind,
            auto_resolved: false,
            suppressions: Vec::new(),
            cache: OnceCell::new(),
        }
    }

    /// Opt this registration out of one diagnostic kind. The justification is
    /// required and kept for reporting.
    pub fn suppress_diagnostic(mut self, kind: DiagnosticKind, justification: impl Into<String>) -> Self {
        self.suppressions.push((kind, justification.into()));
        self
    }

    pub fn should_suppress(&self, kind: DiagnosticKind) -> bool {
        self.suppressions.iter().any(|(k, _)| *k == kind)
    }

    pub fn suppressions(&self) -> &[(DiagnosticKind, String)] {
        &self.suppressions
    }

    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn activator(&self) -> &Activator {
        &self.activator
    }

    pub fn implementation(&self) -> &TypeInfo {
        self.activator.implementation()
    }

    pub fn lifestyle(&self) -> &Lifestyle {
        &self.lifestyle
    }

    pub fn kind(&self) -> RegistrationKind {
        self.kind
    }

    /// Created by fallback resolution of an unregistered concrete type.
    pub fn is_auto_resolved(&self) -> bool {
        self.auto_resolved
    }

    pub fn wraps_delegate(&self) -> bool {
        self.kind == RegistrationKind::Delegate
    }

    pub fn is_instance(&self) -> bool {
        self.kind == RegistrationKind::Instance
    }

    /// The per-container cached instance, if one has been produced.
    pub fn cached_instance(&self) -> Option<&Instance> {
        self.cache.get()
    }

    pub(crate) fn cache(&self) -> &OnceCell<Instance> {
        &self.cache
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("implementation", self.implementation())
            .field("lifestyle", &self.lifestyle.name())
            .field("kind", &self.kind)
            .field("auto_resolved", &self.auto_resolved)
            .finish()
    }
}
