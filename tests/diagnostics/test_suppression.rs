// Tests for suppressing diagnostics per registration, per container and per config file
use std::fs;

use rivet_core::config::CONFIG_FILE;
use rivet_core::{Container, DiagnosticKind, Lifestyle, RivetConfig, TypeInfo, VerificationMode};
use rivet_verify::{VerificationError, VerifyExt};

use crate::common::{concrete, torn, FileStore, Reader, Writer};

fn torn_with(config: RivetConfig) -> Container {
    let container = Container::with_config(config);
    for service in [TypeInfo::of::<dyn Reader>(), TypeInfo::of::<dyn Writer>()] {
        container
            .register(service, concrete(|| FileStore, &[], Lifestyle::scoped()))
            .unwrap();
    }
    container
}

#[test]
fn test_registration_suppression_hides_only_its_own_result() {
    let container = Container::new();
    container
        .register(
            TypeInfo::of::<dyn Reader>(),
            concrete(|| FileStore, &[], Lifestyle::scoped())
                .suppress_diagnostic(DiagnosticKind::TornLifestyle, "reads go through a dedicated cache"),
        )
        .unwrap();
    container
        .register(TypeInfo::of::<dyn Writer>(), concrete(|| FileStore, &[], Lifestyle::scoped()))
        .unwrap();

    let report = container.analyze().unwrap();
    let found = report.of_kind(DiagnosticKind::TornLifestyle);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].service, "Writer");
    assert_eq!(report.suppressed, 1);
}

#[test]
fn test_container_wide_suppression() {
    let mut config = RivetConfig::default();
    config.diagnostics.suppress.push(DiagnosticKind::TornLifestyle);
    let container = torn_with(config);
    let outcome = container.verify().unwrap();
    let report = outcome.report.unwrap();
    assert!(report.is_empty());
    assert_eq!(report.suppressed, 2);
}

#[test]
fn test_unsuppressed_kinds_still_fail() {
    let mut config = RivetConfig::default();
    config.diagnostics.suppress.push(DiagnosticKind::LifestyleMismatch);
    let err = torn_with(config).verify().unwrap_err();
    assert!(matches!(err, VerificationError::Diagnostics(_)));
    assert!(err.to_string().contains("-[Torn Lifestyle] 2 possible registrations found with a torn lifestyle."));
}

#[test]
fn test_config_file_suppression_and_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = serde_json::json!({
        "diagnostics": { "suppress": ["torn_lifestyle"] },
        "verification": { "mode": "verify_and_collect" }
    });
    fs::write(dir.path().join(CONFIG_FILE), config.to_string()).unwrap();
    let config = RivetConfig::load(dir.path()).unwrap();
    assert_eq!(config.verification.mode, VerificationMode::VerifyAndCollect);

    let outcome = torn_with(config).verify().unwrap();
    assert_eq!(outcome.mode, VerificationMode::VerifyAndCollect);
    assert!(outcome.report.unwrap().is_empty());
}

#[test]
fn test_config_file_with_invalid_mode() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE),
        r#"{"verification": {"mode": "loudly"}}"#,
    )
    .unwrap();
    let err = RivetConfig::load(dir.path()).unwrap_err();
    assert!(err.to_string().contains("(loudly) is invalid for VerificationMode"));
}

#[test]
fn test_verify_only_ignores_torn_registrations() {
    let container = torn(Lifestyle::scoped());
    let outcome = container.verify_with(VerificationMode::VerifyOnly).unwrap();
    assert_eq!(outcome.instantiated, 2);
}
