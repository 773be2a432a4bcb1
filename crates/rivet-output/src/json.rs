use serde_json::json;

use crate::OutputFormatter;
use rivet_verify::{DiagnosticReport, VerificationError, VerificationOutcome};

pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_outcome(&self, outcome: &VerificationOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_default()
    }

    fn format_report(&self, report: &DiagnosticReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_default()
    }

    fn format_error(&self, error: &VerificationError) -> String {
        let value = match error {
            VerificationError::Build {
                service,
                implementation,
                path,
                source,
            } => json!({
                "status": "build_failed",
                "service": service,
                "implementation": implementation,
                "path": path,
                "cause": source.to_string(),
                "message": error.to_string(),
            }),
            VerificationError::ProducerDiscovered { root, discovered } => json!({
                "status": "producer_discovered",
                "service": root,
                "discovered": discovered,
                "message": error.to_string(),
            }),
            VerificationError::Diagnostics(e) => json!({
                "status": "diagnostics_failed",
                "report": &e.report,
                "message": e.message(),
            }),
            VerificationError::Config(e) => json!({
                "status": "invalid_configuration",
                "message": e.to_string(),
            }),
        };
        serde_json::to_string_pretty(&value).unwrap_or_default()
    }
}
