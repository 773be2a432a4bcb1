// Tests for lifestyle mismatch and ambiguous lifestyle detection
use rivet_core::{
    Activator, CollectionItem, Container, Dependency, DiagnosticKind, Lifestyle, Registration, TypeInfo,
};
use rivet_verify::{DiagnosticDetail, VerifyExt};

use crate::common::{
    concrete, layered, plugin, plugin_activator, AuditPlugin, CachePlugin, Clock, FileStore, Reader, Writer,
};

struct Dashboard;

fn dashboard(dependency: Dependency, lifestyle: Lifestyle) -> Registration {
    Registration::new(Activator::of::<Dashboard, _>(|_| Ok(Dashboard)).with(dependency), lifestyle)
}

#[test]
fn test_layered_lifestyles_are_clean() {
    let report = layered().analyze().unwrap();
    assert!(report.of_kind(DiagnosticKind::LifestyleMismatch).is_empty());
}

#[test]
fn test_singleton_depending_on_transient() {
    let container = Container::new();
    container
        .register(TypeInfo::of::<Dashboard>(), dashboard(Dependency::on(TypeInfo::of::<Clock>()), Lifestyle::singleton()))
        .unwrap();
    container
        .register(TypeInfo::of::<Clock>(), concrete(|| Clock, &[], Lifestyle::transient()))
        .unwrap();

    let report = container.analyze().unwrap();
    let found = report.of_kind(DiagnosticKind::LifestyleMismatch);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].description, "Dashboard (Singleton) depends on Clock (Transient).");
    assert_eq!(found[0].service, "Dashboard");
    match &found[0].detail {
        DiagnosticDetail::LifestyleMismatch { dependency } => assert_eq!(dependency.lifestyle, "Transient"),
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn test_mismatch_through_collection_items() {
    let container = Container::new();
    container
        .register(TypeInfo::of::<Dashboard>(), dashboard(Dependency::collection(plugin()), Lifestyle::singleton()))
        .unwrap();
    container
        .register_collection(
            plugin(),
            vec![
                CollectionItem::Registration(Registration::new(plugin_activator(|| AuditPlugin), Lifestyle::singleton())),
                CollectionItem::Registration(Registration::new(plugin_activator(|| CachePlugin), Lifestyle::transient())),
            ],
        )
        .unwrap();

    let report = container.analyze().unwrap();
    let found = report.of_kind(DiagnosticKind::LifestyleMismatch);
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].description,
        "Dashboard (Singleton) depends on Plugin implemented by CachePlugin (Transient)."
    );
}

#[test]
fn test_lazy_dependency_is_not_a_mismatch() {
    let container = Container::new();
    container
        .register(TypeInfo::of::<Dashboard>(), dashboard(Dependency::lazy(TypeInfo::of::<Clock>()), Lifestyle::singleton()))
        .unwrap();
    container
        .register(TypeInfo::of::<Clock>(), concrete(|| Clock, &[], Lifestyle::transient()))
        .unwrap();
    let report = container.analyze().unwrap();
    assert!(report.of_kind(DiagnosticKind::LifestyleMismatch).is_empty());
}

#[test]
fn test_same_implementation_with_different_lifestyles_is_ambiguous() {
    let container = Container::new();
    container
        .register(TypeInfo::of::<dyn Reader>(), concrete(|| FileStore, &[], Lifestyle::singleton()))
        .unwrap();
    container
        .register(TypeInfo::of::<dyn Writer>(), concrete(|| FileStore, &[], Lifestyle::scoped()))
        .unwrap();

    let report = container.analyze().unwrap();
    let found = report.of_kind(DiagnosticKind::AmbiguousLifestyles);
    assert_eq!(found.len(), 2);
    assert_eq!(
        found[0].description,
        "The registration for Reader (Singleton) maps to the same implementation (FileStore) as the \
         registration for Writer (Scoped) does, but the registration maps to a different lifestyle. \
         This will cause each registration to resolve to a different instance."
    );
    assert!(report.of_kind(DiagnosticKind::TornLifestyle).is_empty());
}
