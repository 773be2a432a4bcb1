use thiserror::Error;

use rivet_core::{BuildError, ConfigError};

use crate::report::DiagnosticReport;

#[derive(Debug, Error)]
pub enum VerificationError {
    /// Building a producer failed. `service` is the root whose graph was being
    /// verified, `implementation` the type whose construction failed; `path`
    /// runs from the outermost requested service down to the one that failed.
    #[error("The configuration is invalid. Creating the instance for type {implementation} failed. {source}")]
    Build {
        service: String,
        implementation: String,
        path: Vec<String>,
        #[source]
        source: BuildError,
    },

    #[error(
        "The configuration is invalid. Building {root} registered new producers during verification: {}. \
         Register every service before verifying; factories must not resolve types the graph does not declare.",
        discovered.join(", ")
    )]
    ProducerDiscovered { root: String, discovered: Vec<String> },

    #[error(transparent)]
    Diagnostics(#[from] DiagnosticVerificationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl VerificationError {
    /// The diagnostic report, for failures caused by diagnostic warnings.
    pub fn report(&self) -> Option<&DiagnosticReport> {
        match self {
            VerificationError::Diagnostics(e) => Some(&e.report),
            _ => None,
        }
    }
}

/// Diagnostic warnings found while verifying with `VerifyAndDiagnose`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DiagnosticVerificationError {
    pub report: DiagnosticReport,
    message: String,
}

impl DiagnosticVerificationError {
    pub fn new(report: DiagnosticReport, docs_url: &str) -> Self {
        let lines: Vec<String> = report
            .warnings()
            .map(|r| format!("-[{}] {}", r.kind.name(), r.description))
            .collect();
        let message = format!(
            "The configuration is invalid. The following diagnostic warnings were reported:\n{}\n\
             See the `report` of this error for detailed information about the warnings. \
             Please see {} how to fix problems and how to suppress individual warnings.",
            lines.join("\n"),
            docs_url
        );
        Self { report, message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
