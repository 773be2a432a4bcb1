// Tests for the JSON formatter on real containers
use rivet_core::{Lifestyle, VerificationMode};
use rivet_output::json::JsonFormatter;
use rivet_output::OutputFormatter;
use rivet_verify::VerifyExt;

use crate::common::{layered, torn};

fn parse(out: &str) -> serde_json::Value {
    serde_json::from_str(out).unwrap_or_else(|e| panic!("invalid JSON ({e}): {out}"))
}

#[test]
fn test_outcome_json() {
    let outcome = layered()
        .verify_with(VerificationMode::VerifyAndCollect)
        .unwrap();
    let value = parse(&JsonFormatter.format_outcome(&outcome));
    assert_eq!(value["mode"], "verify_and_collect");
    assert_eq!(value["producers"], 3);
    assert_eq!(value["instantiated"], 3);
    assert_eq!(value["report"]["sections"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_verify_only_outcome_has_null_report() {
    let outcome = layered().verify_with(VerificationMode::VerifyOnly).unwrap();
    let value = parse(&JsonFormatter.format_outcome(&outcome));
    assert!(value["report"].is_null());
}

#[test]
fn test_diagnostics_error_json() {
    let err = torn(Lifestyle::scoped()).verify().unwrap_err();
    let value = parse(&JsonFormatter.format_error(&err));
    assert_eq!(value["status"], "diagnostics_failed");
    assert_eq!(value["report"]["sections"][0]["code"], "W002");
    let message = value["message"].as_str().unwrap();
    assert!(message.starts_with("The configuration is invalid. The following diagnostic warnings were reported:"));
}

#[test]
fn test_report_json_carries_affected_producers() {
    let report = torn(Lifestyle::scoped()).analyze().unwrap();
    let value = parse(&JsonFormatter.format_report(&report));
    let result = &value["sections"][0]["groups"][0]["results"][0];
    assert_eq!(result["service"], "Reader");
    assert_eq!(result["affected"].as_array().map(Vec::len), Some(2));
    assert_eq!(result["affected"][1]["service"], "Writer");
}
