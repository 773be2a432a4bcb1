// Tests for the human-readable formatter on real containers
use rivet_core::{Container, Lifestyle, TypeInfo, VerificationMode};
use rivet_output::human::HumanFormatter;
use rivet_output::OutputFormatter;
use rivet_verify::VerifyExt;

use crate::common::{concrete, layered, torn, Repo, Service};

#[test]
fn test_clean_outcome_is_one_line() {
    let outcome = layered().verify().unwrap();
    let out = HumanFormatter.format_outcome(&outcome);
    assert_eq!(
        out,
        "verified 3 producer(s) (verify_and_diagnose): 3 built, 0 already built\n"
    );
}

#[test]
fn test_torn_outcome_lists_both_registrations() {
    let outcome = torn(Lifestyle::scoped())
        .verify_with(VerificationMode::VerifyAndCollect)
        .unwrap();
    let out = HumanFormatter.format_outcome(&outcome);
    assert!(out.contains("-[Torn Lifestyle] 2 possible registrations found with a torn lifestyle.\n"));
    assert!(out.contains("warning[W002]: The registration for Reader maps to"));
    assert!(out.contains("  --> Reader (Scoped)\n"));
    assert!(out.contains("   = fix: register FileStore once for all of its services\n"));
    assert!(out.contains("   = affected: Writer (Scoped)\n"));
    assert!(out.ends_with("\n2 warning(s), 0 info(s), 0 suppressed\n"));
}

#[test]
fn test_build_error_shows_path() {
    let container = Container::new();
    container
        .register(
            TypeInfo::of::<Service>(),
            concrete(|| Service, &[TypeInfo::of::<Repo>()], Lifestyle::transient()),
        )
        .unwrap();
    let err = container.verify().unwrap_err();
    let out = HumanFormatter.format_error(&err);
    assert!(out.starts_with("error: The configuration is invalid. Creating the instance for type Service failed."));
    assert!(out.contains("No registration for type Repo could be found."));
}

#[test]
fn test_diagnostics_error_renders_report() {
    let err = torn(Lifestyle::scoped()).verify().unwrap_err();
    let out = HumanFormatter.format_error(&err);
    assert!(out.starts_with("error: The configuration is invalid.\n-[Torn Lifestyle]"));
    assert!(out.contains("warning[W002]"));
}

#[test]
fn test_invalid_mode_error() {
    let err = layered().verify_with_mode("9").unwrap_err();
    let out = HumanFormatter.format_error(&err);
    assert!(out.starts_with("error: The value of argument 'mode' (9) is invalid for VerificationMode."));
}
