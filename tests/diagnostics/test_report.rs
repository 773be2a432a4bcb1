// Tests for report sections, grouping and rendering
use rivet_core::{Activator, Container, DiagnosticKind, Lifestyle, Registration, TypeInfo};
use rivet_verify::VerifyExt;

use crate::common::{concrete, torn, Clock, FileStore, Reader, Writer};

struct Dashboard;
struct Ticker;

/// Two consumers with a mismatch each, plus a torn pair.
fn noisy() -> Container {
    let container = Container::new();
    for service in [TypeInfo::of::<dyn Reader>(), TypeInfo::of::<dyn Writer>()] {
        container
            .register(service, concrete(|| FileStore, &[], Lifestyle::scoped()))
            .unwrap();
    }
    container
        .register(
            TypeInfo::of::<Dashboard>(),
            Registration::new(
                Activator::of::<Dashboard, _>(|_| Ok(Dashboard)).depends_on(TypeInfo::of::<Clock>()),
                Lifestyle::singleton(),
            ),
        )
        .unwrap();
    container
        .register(
            TypeInfo::of::<Ticker>(),
            Registration::new(
                Activator::of::<Ticker, _>(|_| Ok(Ticker)).depends_on(TypeInfo::of::<Clock>()),
                Lifestyle::singleton(),
            ),
        )
        .unwrap();
    container
        .register(TypeInfo::of::<Clock>(), concrete(|| Clock, &[], Lifestyle::transient()))
        .unwrap();
    container
}

#[test]
fn test_sections_follow_analyzer_order() {
    let report = noisy().analyze().unwrap();
    let kinds: Vec<DiagnosticKind> = report.sections.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::LifestyleMismatch, DiagnosticKind::TornLifestyle]);
    assert_eq!(report.len(), 4);
}

#[test]
fn test_results_sharing_a_producer_are_grouped() {
    let report = noisy().analyze().unwrap();
    let mismatches = report.section(DiagnosticKind::LifestyleMismatch).unwrap();
    // Both consumers depend on the same Clock producer.
    assert_eq!(mismatches.groups.len(), 1);
    assert_eq!(mismatches.groups[0].description, "2 lifestyle mismatches.");

    let torn = report.section(DiagnosticKind::TornLifestyle).unwrap();
    assert_eq!(torn.groups.len(), 1);
    assert_eq!(torn.groups[0].results.len(), 2);
}

#[test]
fn test_summary_lists_one_line_per_section() {
    let report = noisy().analyze().unwrap();
    assert_eq!(
        report.summary(),
        "-[Lifestyle Mismatch] 2 possible lifestyle mismatches found.\n\
         -[Torn Lifestyle] 2 possible registrations found with a torn lifestyle."
    );
}

#[test]
fn test_listing_nests_grouped_results() {
    let report = noisy().analyze().unwrap();
    let listing = report.listing();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines[0], "-[Lifestyle Mismatch] 2 possible lifestyle mismatches found.");
    assert_eq!(lines[1], "  -2 lifestyle mismatches.");
    assert_eq!(lines[2], "    -Dashboard (Singleton) depends on Clock (Transient).");
    assert_eq!(lines[3], "    -Ticker (Singleton) depends on Clock (Transient).");
}

#[test]
fn test_report_serializes_to_json() {
    let report = torn(Lifestyle::scoped()).analyze().unwrap();
    let value = serde_json::to_value(&report).unwrap();
    let section = &value["sections"][0];
    assert_eq!(section["kind"], "torn_lifestyle");
    assert_eq!(section["code"], "W002");
    let result = &section["groups"][0]["results"][0];
    assert_eq!(result["detail"]["type"], "torn_lifestyle");
    assert_eq!(result["detail"]["lifestyle"], "Scoped");
    assert_eq!(result["fingerprint"].as_str().map(str::len), Some(11));
}

#[test]
fn test_fingerprints_are_stable_across_containers() {
    let first = torn(Lifestyle::scoped()).analyze().unwrap();
    let second = torn(Lifestyle::scoped()).analyze().unwrap();
    let a: Vec<&str> = first.results().map(|r| r.fingerprint.as_str()).collect();
    let b: Vec<&str> = second.results().map(|r| r.fingerprint.as_str()).collect();
    assert_eq!(a, b);
}
