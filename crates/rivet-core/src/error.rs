//! Error types for the container, the resolver and configuration loading.

/// Error returned by user factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by container operations (registration and resolution).
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error(
        "The container can't be changed after the first call to verify or to resolve an instance. \
         Attempted operation: {operation}."
    )]
    Locked { operation: &'static str },

    #[error(
        "Type {service} has already been registered. Set \
         container.allow_overriding_registrations to replace existing registrations."
    )]
    DuplicateRegistration { service: String },

    #[error("The instance produced for {service} can't be used as {requested}.")]
    TypeMismatch { service: String, requested: String },

    #[error(transparent)]
    Build(#[from] BuildFailure),
}

/// Errors raised while preparing or running a construction strategy.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No registration for type {service} could be found.{}", consumer_hint(.consumer, .parameter, .service))]
    Unregistered {
        service: String,
        consumer: Option<String>,
        parameter: Option<String>,
    },

    #[error(
        "The registration for the collection of {element} (i.e. Vec<{element}>) is supplied with \
         the abstract type {item}, which hasn't been registered explicitly, and wasn't resolved \
         using unregistered type resolution. For this collection to be resolvable, an explicit \
         one-to-one registration is required, e.g. container.register({definition}, ...). \
         Otherwise, in case {definition} was supplied by accident, make sure it is removed."
    )]
    UnregisteredCollectionItem {
        element: String,
        item: String,
        definition: String,
    },

    #[error("{source}")]
    Activation {
        implementation: String,
        #[source]
        source: crate::error::BoxError,
    },

    #[error("The registered delegate for type {service} returned no instance.")]
    NullInstance { service: String },

    #[error("One of the items in the collection for type {element} is a null reference.")]
    NullCollectionItem { element: String },

    #[error(
        "The configuration is invalid. The type {} is directly or indirectly depending on itself. \
         The cyclic graph contains the following types: {}.",
        .path.first().map(String::as_str).unwrap_or_default(),
        .path.join(" -> ")
    )]
    Cycle { path: Vec<String> },

    #[error(
        "{implementation} is registered using the '{lifestyle}' lifestyle, but the instance is \
         requested outside the context of an active scope."
    )]
    ScopeRequired {
        implementation: String,
        lifestyle: String,
    },

    #[error(
        "A lifestyle mismatch has been detected. {consumer} ({consumer_lifestyle}) depends on \
         {dependency} implemented by {implementation} ({dependency_lifestyle})."
    )]
    LifestyleMismatch {
        consumer: String,
        consumer_lifestyle: String,
        dependency: String,
        implementation: String,
        dependency_lifestyle: String,
    },

    #[error("The container that created this lazy handle has been dropped.")]
    ContainerDropped,
}

fn consumer_hint(consumer: &Option<String>, parameter: &Option<String>, service: &str) -> String {
    match (consumer, parameter) {
        (Some(consumer), Some(parameter)) => format!(
            " The constructor of type {consumer} contains the parameter with name '{parameter}' \
             and type {service}, which is not registered. Please ensure {service} is registered."
        ),
        (Some(consumer), None) => format!(
            " Type {consumer} depends on {service}, which is not registered. Please ensure \
             {service} is registered."
        ),
        _ => String::new(),
    }
}

/// A build error annotated with where in the graph it happened.
#[derive(Debug)]
pub struct BuildFailure {
    pub error: BuildError,
    /// Implementation type whose construction failed.
    pub implementation: String,
    /// Service path from the outermost producer to the failing one.
    pub path: Vec<String>,
}

impl BuildFailure {
    pub fn new(error: BuildError, implementation: impl Into<String>) -> Self {
        Self {
            error,
            implementation: implementation.into(),
            path: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }
}

impl std::fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Creating the instance for type {} failed. {}",
            self.implementation, self.error
        )
    }
}

impl std::error::Error for BuildFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Errors raised while loading or interpreting configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "The value of argument 'mode' ({value}) is invalid for VerificationMode. Valid values are: {}.",
        crate::types::VerificationMode::VALID
    )]
    InvalidMode { value: String },

    #[error("Unknown diagnostic kind '{0}'")]
    UnknownDiagnosticKind(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
