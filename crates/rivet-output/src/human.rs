use crate::human_helpers::format_result_human;
use crate::OutputFormatter;
use rivet_verify::{DiagnosticReport, VerificationError, VerificationOutcome};

pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_outcome(&self, outcome: &VerificationOutcome) -> String {
        let mut out = format!(
            "verified {} producer(s) ({}): {} built, {} already built\n",
            outcome.producers, outcome.mode, outcome.instantiated, outcome.skipped,
        );
        if let Some(report) = &outcome.report {
            let listing = self.format_report(report);
            if !listing.is_empty() {
                out.push('\n');
                out.push_str(&listing);
            }
        }
        out
    }

    fn format_report(&self, report: &DiagnosticReport) -> String {
        if report.is_empty() && report.suppressed == 0 {
            return String::new(); // Clean report = empty output
        }

        let mut out = String::new();
        for section in &report.sections {
            out.push_str(&format!("-[{}] {}\n", section.name, section.description));
            for result in section.results() {
                out.push_str(&format_result_human(result));
            }
        }

        let warnings = report.warnings().count();
        out.push_str(&format!(
            "\n{} warning(s), {} info(s), {} suppressed\n",
            warnings,
            report.len() - warnings,
            report.suppressed,
        ));
        out
    }

    fn format_error(&self, error: &VerificationError) -> String {
        match error {
            VerificationError::Build { path, .. } => {
                let mut out = format!("error: {}\n", error);
                if !path.is_empty() {
                    out.push_str(&format!("  --> {}\n", path.join(" -> ")));
                }
                out
            }
            VerificationError::Diagnostics(e) => {
                let mut out = String::from("error: The configuration is invalid.\n");
                out.push_str(&self.format_report(&e.report));
                out
            }
            VerificationError::ProducerDiscovered { .. } | VerificationError::Config(_) => {
                format!("error: {}\n", error)
            }
        }
    }
}
