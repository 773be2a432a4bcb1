// Tests for verification modes and mode configuration
use rivet_core::{Container, DiagnosticKind, Lifestyle, RivetConfig, TypeInfo, VerificationMode};
use rivet_verify::{VerificationError, Verifier, VerifyExt};

use crate::common::{concrete, Clock, Service};

/// Singleton Service depending on a transient Clock.
fn mismatched(config: RivetConfig) -> Container {
    let container = Container::with_config(config);
    container
        .register(
            TypeInfo::of::<Service>(),
            concrete(|| Service, &[TypeInfo::of::<Clock>()], Lifestyle::singleton()),
        )
        .unwrap();
    container
        .register(TypeInfo::of::<Clock>(), concrete(|| Clock, &[], Lifestyle::transient()))
        .unwrap();
    container
}

#[test]
fn test_verify_only_skips_analyzers() {
    let container = mismatched(RivetConfig::default());
    let outcome = container.verify_with(VerificationMode::VerifyOnly).unwrap();
    assert!(outcome.report.is_none());
    assert_eq!(outcome.instantiated, 2);
}

#[test]
fn test_verify_and_diagnose_fails_with_composite_message() {
    let container = mismatched(RivetConfig::default());
    let err = container.verify().unwrap_err();
    let VerificationError::Diagnostics(diagnostics) = &err else {
        panic!("expected diagnostics failure, got {err}");
    };
    let msg = err.to_string();
    assert!(msg.starts_with(
        "The configuration is invalid. The following diagnostic warnings were reported:\n"
    ));
    assert!(msg.contains("-[Lifestyle Mismatch] Service (Singleton) depends on Clock (Transient)."));
    assert!(msg.contains("See the `report` of this error for detailed information about the warnings."));
    assert!(msg.contains(rivet_core::config::DEFAULT_DOCS_URL));
    assert_eq!(diagnostics.report.of_kind(DiagnosticKind::LifestyleMismatch).len(), 1);
}

#[test]
fn test_verify_and_collect_returns_findings() {
    let container = mismatched(RivetConfig::default());
    let outcome = container.verify_with(VerificationMode::VerifyAndCollect).unwrap();
    assert!(outcome.has_warnings());
    let report = outcome.report.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.warnings().next().unwrap().code, "W001");
}

#[test]
fn test_mode_from_config() {
    let mut config = RivetConfig::default();
    config.verification.mode = VerificationMode::VerifyAndCollect;
    let container = mismatched(config);
    let outcome = container.verify().unwrap();
    assert_eq!(outcome.mode, VerificationMode::VerifyAndCollect);
}

#[test]
fn test_mode_by_name_and_number() {
    let container = mismatched(RivetConfig::default());
    assert!(container.verify_with_mode("verify_and_collect").is_ok());
    assert!(container.verify_with_mode("0").unwrap().report.is_none());
    assert!(container.verify_with_mode("1").is_err());
}

#[test]
fn test_invalid_mode_string() {
    let container = mismatched(RivetConfig::default());
    let err = container.verify_with_mode("strict").unwrap_err();
    assert!(matches!(err, VerificationError::Config(_)));
    assert!(err.to_string().contains("(strict) is invalid for VerificationMode"));
}

#[test]
fn test_config_suppression_passes_diagnosis() {
    let mut config = RivetConfig::default();
    config.diagnostics.suppress = vec![DiagnosticKind::LifestyleMismatch];
    let container = mismatched(config);
    let outcome = container.verify().unwrap();
    let report = outcome.report.unwrap();
    assert!(report.is_empty());
    assert_eq!(report.suppressed, 1);
}

#[test]
fn test_verifier_suppression_passes_diagnosis() {
    let container = mismatched(RivetConfig::default());
    let mut verifier = Verifier::new();
    verifier.suppress(DiagnosticKind::LifestyleMismatch);
    let outcome = verifier
        .verify(&container, VerificationMode::VerifyAndDiagnose)
        .unwrap();
    assert!(!outcome.has_warnings());
}
