//! Output formatters for verification results.
//!
//! Provides two output modes:
//! - **JSON**: Machine-readable structured output
//! - **Human**: Compiler-style listing of diagnostics for terminals and logs

pub mod human;
pub(crate) mod human_helpers;
pub mod json;

use rivet_verify::{DiagnosticReport, VerificationError, VerificationOutcome};

pub trait OutputFormatter {
    fn format_outcome(&self, outcome: &VerificationOutcome) -> String;
    fn format_report(&self, report: &DiagnosticReport) -> String;
    fn format_error(&self, error: &VerificationError) -> String;
}
