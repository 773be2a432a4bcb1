// Tests for short-circuited, disposable and container-registered components
use rivet_core::{Activator, CollectionItem, Container, DiagnosticKind, Lifestyle, Registration, Severity, TypeInfo};
use rivet_verify::{DiagnosticDetail, VerifyExt};

use crate::common::{auto_resolving, concrete, plugin, plugin_activator, AuditPlugin, Controller, FileStore, Reader};

struct Connection;

fn connection(lifestyle: Lifestyle) -> Container {
    let container = Container::new();
    container
        .register(
            TypeInfo::of::<Connection>(),
            Registration::new(
                Activator::new(TypeInfo::of::<Connection>().disposable(), |_| Ok(Connection)),
                lifestyle,
            ),
        )
        .unwrap();
    container
}

#[test]
fn test_disposable_transient_is_reported() {
    let report = connection(Lifestyle::transient()).analyze().unwrap();
    let found = report.of_kind(DiagnosticKind::DisposableTransientComponent);
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].description,
        "Connection is registered as transient, but owns a disposable resource."
    );
}

#[test]
fn test_disposable_scoped_is_fine() {
    let report = connection(Lifestyle::scoped()).analyze().unwrap();
    assert!(report.is_empty());
}

#[test]
fn test_short_circuited_concrete_dependency() {
    let container = auto_resolving();
    container
        .add_known_type(Activator::of::<FileStore, _>(|_| Ok(FileStore)))
        .unwrap();
    container
        .register(TypeInfo::of::<dyn Reader>(), concrete(|| FileStore, &[], Lifestyle::scoped()))
        .unwrap();
    container
        .register(
            TypeInfo::of::<Controller>(),
            concrete(|| Controller, &[TypeInfo::of::<FileStore>()], Lifestyle::transient()),
        )
        .unwrap();

    let report = container.analyze().unwrap();
    let found = report.of_kind(DiagnosticKind::ShortCircuitedDependency);
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].description,
        "Controller might incorrectly depend on unregistered type FileStore (Transient) instead of Reader (Scoped)."
    );
    match &found[0].detail {
        DiagnosticDetail::ShortCircuitedDependency {
            dependency,
            expected_services,
            ..
        } => {
            assert_eq!(dependency.implementation, "FileStore");
            assert_eq!(expected_services, &vec!["Reader".to_string()]);
        }
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn test_explicitly_registered_dependency_is_not_short_circuited() {
    let container = auto_resolving();
    container
        .register(TypeInfo::of::<FileStore>(), concrete(|| FileStore, &[], Lifestyle::scoped()))
        .unwrap();
    container
        .register(
            TypeInfo::of::<Controller>(),
            concrete(|| Controller, &[TypeInfo::of::<FileStore>()], Lifestyle::transient()),
        )
        .unwrap();
    let report = container.analyze().unwrap();
    assert!(report.of_kind(DiagnosticKind::ShortCircuitedDependency).is_empty());
}

#[test]
fn test_container_registered_item_is_information() {
    let container = Container::new();
    container.add_known_type(plugin_activator(|| AuditPlugin)).unwrap();
    container
        .register_collection(
            plugin(),
            vec![CollectionItem::Type(TypeInfo::of::<AuditPlugin>().implementing(plugin()))],
        )
        .unwrap();

    let report = container.analyze().unwrap();
    let found = report.of_kind(DiagnosticKind::ContainerRegisteredCollection);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].severity, Severity::Information);
    assert_eq!(
        found[0].description,
        "AuditPlugin is part of the Vec<Plugin> collection, but has no registration of its own; \
         the container registered it as Transient."
    );
    assert!(!report.has_warnings());
}
