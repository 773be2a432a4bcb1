use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// Identity of a service or implementation type.
///
/// Identity is the full type name; the friendly name strips module paths and
/// the `dyn` keyword for messages (`dyn app::EventHandler<app::Audit>` renders as
/// `EventHandler<Audit>`). Trait objects are abstract.
#[derive(Clone)]
pub struct TypeInfo {
    inner: Arc<TypeData>,
}

struct TypeData {
    id: String,
    name: String,
    is_abstract: bool,
    disposable: bool,
    open: bool,
    definition: Option<String>,
    arguments: Vec<TypeInfo>,
    services: Vec<TypeInfo>,
}

impl TypeInfo {
    /// Type info for a Rust type, `dyn Trait` included.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    /// Type info for a type described only by its full name.
    pub fn named(id: impl Into<String>) -> Self {
        let id = id.into();
        let (definition, arguments) = match split_generic(&id) {
            Some((definition, args)) => (
                Some(definition.to_string()),
                args.into_iter().map(TypeInfo::named).collect(),
            ),
            None => (None, Vec::new()),
        };
        Self::from_data(TypeData {
            name: friendly_name(&id),
            is_abstract: id.starts_with("dyn "),
            disposable: false,
            open: false,
            definition,
            arguments,
            services: Vec::new(),
            id,
        })
    }

    /// The open generic definition of `T`, with `T`'s arguments replaced by the
    /// named type parameters: `open_generic::<dyn Handler<Audit>>(&["E"])` is `Handler<E>`.
    pub fn open_generic<T: ?Sized + 'static>(parameters: &[&str]) -> Self {
        let full = std::any::type_name::<T>();
        let definition = full.split('<').next().unwrap_or(full).to_string();
        let id = format!("{}<{}>", definition, parameters.join(", "));
        Self::from_data(TypeData {
            name: friendly_name(&id),
            is_abstract: definition.starts_with("dyn "),
            disposable: false,
            open: true,
            definition: Some(definition),
            arguments: parameters.iter().map(|p| TypeInfo::named(*p)).collect(),
            services: Vec::new(),
            id,
        })
    }

    /// Close an open generic definition over concrete arguments. The result has
    /// the same identity as [`TypeInfo::of`] for the equivalent Rust type.
    pub fn close(&self, arguments: &[TypeInfo]) -> TypeInfo {
        let definition = self
            .inner
            .definition
            .clone()
            .unwrap_or_else(|| self.inner.id.clone());
        let args: Vec<&str> = arguments.iter().map(|a| a.id()).collect();
        let id = format!("{}<{}>", definition, args.join(", "));
        Self::from_data(TypeData {
            name: friendly_name(&id),
            is_abstract: self.inner.is_abstract,
            disposable: self.inner.disposable,
            open: false,
            definition: Some(definition),
            arguments: arguments.to_vec(),
            services: Vec::new(),
            id,
        })
    }

    /// Mark the type as owning a disposable resource.
    pub fn disposable(&self) -> Self {
        let mut data = self.clone_data();
        data.disposable = true;
        Self::from_data(data)
    }

    /// Declare a service this (concrete) type implements.
    pub fn implementing(&self, service: TypeInfo) -> Self {
        let mut data = self.clone_data();
        data.services.push(service);
        Self::from_data(data)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Friendly display name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_abstract(&self) -> bool {
        self.inner.is_abstract
    }

    pub fn is_disposable(&self) -> bool {
        self.inner.disposable
    }

    pub fn is_open(&self) -> bool {
        self.inner.open
    }

    /// Identity of the generic definition (`dyn app::Handler`), if generic.
    pub fn generic_definition(&self) -> Option<&str> {
        self.inner.definition.as_deref()
    }

    pub fn arguments(&self) -> &[TypeInfo] {
        &self.inner.arguments
    }

    pub fn services(&self) -> &[TypeInfo] {
        &self.inner.services
    }

    pub fn implements(&self, service: &TypeInfo) -> bool {
        self == service || self.inner.services.iter().any(|s| s == service)
    }

    /// Whether `self` is a closed version of the open definition `open`.
    pub fn closes(&self, open: &TypeInfo) -> bool {
        !self.is_open()
            && open.is_open()
            && self.generic_definition().is_some()
            && self.generic_definition() == open.generic_definition()
    }

    /// Display name of a collection of this type.
    pub fn collection_name(&self) -> String {
        format!("Vec<{}>", self.name())
    }

    fn clone_data(&self) -> TypeData {
        TypeData {
            id: self.inner.id.clone(),
            name: self.inner.name.clone(),
            is_abstract: self.inner.is_abstract,
            disposable: self.inner.disposable,
            open: self.inner.open,
            definition: self.inner.definition.clone(),
            arguments: self.inner.arguments.clone(),
            services: self.inner.services.clone(),
        }
    }

    fn from_data(data: TypeData) -> Self {
        Self {
            inner: Arc::new(data),
        }
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for TypeInfo {}

impl std::hash::Hash for TypeInfo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeInfo({})", self.inner.id)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TypeInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Strip module paths and `dyn` from a full Rust type name.
pub fn friendly_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            flush_segment(&mut out, &mut segment);
            out.push(ch);
        }
    }
    flush_segment(&mut out, &mut segment);
    out.replace("dyn ", "")
}

fn flush_segment(out: &mut String, segment: &mut String) {
    if segment.is_empty() {
        return;
    }
    out.push_str(segment.rsplit("::").next().unwrap_or(segment));
    segment.clear();
}

/// Split `Def<A, B<C>>` into `("Def", ["A", "B<C>"])`, respecting nesting.
fn split_generic(id: &str) -> Option<(&str, Vec<String>)> {
    let open = id.find('<')?;
    if !id.ends_with('>') {
        return None;
    }
    let inner = &id[open + 1..id.len() - 1];
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in inner.char_indices() {
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        args.push(last.to_string());
    }
    Some((&id[..open], args))
}

/// Unique identity of a registration, stable for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationId(pub u64);

static NEXT_REGISTRATION_ID: AtomicU64 = AtomicU64::new(1);

impl RegistrationId {
    pub(crate) fn next() -> Self {
        RegistrationId(NEXT_REGISTRATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Stable identity of an instance producer: service type plus registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProducerKey {
    pub service: String,
    pub registration: RegistrationId,
}

impl fmt::Display for ProducerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.service, self.registration)
    }
}

/// Severity of a diagnostic finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Information,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Information => "information",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of anti-patterns the analyzers report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    LifestyleMismatch,
    TornLifestyle,
    ShortCircuitedDependency,
    DisposableTransientComponent,
    AmbiguousLifestyles,
    ContainerRegisteredCollection,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 6] = [
        DiagnosticKind::LifestyleMismatch,
        DiagnosticKind::TornLifestyle,
        DiagnosticKind::ShortCircuitedDependency,
        DiagnosticKind::DisposableTransientComponent,
        DiagnosticKind::AmbiguousLifestyles,
        DiagnosticKind::ContainerRegisteredCollection,
    ];

    /// Short code used in reports (`W` for warnings, `I` for information).
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::LifestyleMismatch => "W001",
            DiagnosticKind::TornLifestyle => "W002",
            DiagnosticKind::ShortCircuitedDependency => "W003",
            DiagnosticKind::DisposableTransientComponent => "W004",
            DiagnosticKind::AmbiguousLifestyles => "W005",
            DiagnosticKind::ContainerRegisteredCollection => "I001",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::LifestyleMismatch => "Lifestyle Mismatch",
            DiagnosticKind::TornLifestyle => "Torn Lifestyle",
            DiagnosticKind::ShortCircuitedDependency => "Short Circuited Dependency",
            DiagnosticKind::DisposableTransientComponent => "Disposable Transient Component",
            DiagnosticKind::AmbiguousLifestyles => "Ambiguous Lifestyles",
            DiagnosticKind::ContainerRegisteredCollection => "Container-registered Collection",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::ContainerRegisteredCollection => Severity::Information,
            _ => Severity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::LifestyleMismatch => "lifestyle_mismatch",
            DiagnosticKind::TornLifestyle => "torn_lifestyle",
            DiagnosticKind::ShortCircuitedDependency => "short_circuited_dependency",
            DiagnosticKind::DisposableTransientComponent => "disposable_transient_component",
            DiagnosticKind::AmbiguousLifestyles => "ambiguous_lifestyles",
            DiagnosticKind::ContainerRegisteredCollection => "container_registered_collection",
        }
    }
}

impl FromStr for DiagnosticKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DiagnosticKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted || k.code() == wanted)
            .ok_or_else(|| ConfigError::UnknownDiagnosticKind(wanted.to_string()))
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a verification pass treats diagnostic findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerificationMode {
    /// Build every producer; run no analyzers.
    VerifyOnly,
    /// Build, analyze, and fail if any warning remains.
    #[default]
    VerifyAndDiagnose,
    /// Build and analyze; findings are returned for inspection only.
    VerifyAndCollect,
}

impl VerificationMode {
    pub const VALID: &'static str =
        "verify_only (0), verify_and_diagnose (1), verify_and_collect (2)";

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMode::VerifyOnly => "verify_only",
            VerificationMode::VerifyAndDiagnose => "verify_and_diagnose",
            VerificationMode::VerifyAndCollect => "verify_and_collect",
        }
    }

    pub fn runs_analyzers(&self) -> bool {
        !matches!(self, VerificationMode::VerifyOnly)
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "verify_only" | "0" => Ok(VerificationMode::VerifyOnly),
            "verify_and_diagnose" | "1" => Ok(VerificationMode::VerifyAndDiagnose),
            "verify_and_collect" | "2" => Ok(VerificationMode::VerifyAndCollect),
            other => Err(ConfigError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<u64> for VerificationMode {
    type Error = ConfigError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VerificationMode::VerifyOnly),
            1 => Ok(VerificationMode::VerifyAndDiagnose),
            2 => Ok(VerificationMode::VerifyAndCollect),
            other => Err(ConfigError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

impl Serialize for VerificationMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VerificationMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => VerificationMode::try_from(n).map_err(serde::de::Error::custom),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
