// Tests for verifying registered collections
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rivet_core::{
    Activator, BuildError, CollectionItem, Container, Dependency, DiagnosticKind, Lifestyle, OpenCollectionItem,
    Registration, TypeInfo, VerificationMode,
};
use rivet_verify::{VerificationError, VerifyExt};

use crate::common::{
    counting_plugin, plugin, plugin_activator, AuditPlugin, CachePlugin, Handler, Order, OrderHandler, Plugin,
};

struct Dashboard {
    plugins: usize,
}

#[test]
fn test_collection_is_iterated_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    let items: Vec<CollectionItem> = (0..3)
        .map(|_| CollectionItem::Registration(Registration::new(counting_plugin(counter.clone()), Lifestyle::transient())))
        .collect();
    container.register_collection(plugin(), items).unwrap();

    container.verify().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn test_registered_component_listed_in_collection_is_built_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    container
        .register(plugin(), Registration::new(counting_plugin(counter.clone()), Lifestyle::transient()))
        .unwrap();
    container
        .register_collection(plugin(), vec![CollectionItem::Type(plugin())])
        .unwrap();

    let outcome = container.verify().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.instantiated, 1);
}

#[test]
fn test_collection_consumer_builds_each_item_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    let items: Vec<CollectionItem> = (0..2)
        .map(|_| CollectionItem::Registration(Registration::new(counting_plugin(counter.clone()), Lifestyle::singleton())))
        .collect();
    container.register_collection(plugin(), items).unwrap();
    let observed = seen.clone();
    container
        .register(
            TypeInfo::of::<Dashboard>(),
            Registration::new(
                Activator::of::<Dashboard, _>(move |args| {
                    let plugins = args.services::<dyn Plugin>(0)?.len();
                    observed.store(plugins, Ordering::SeqCst);
                    Ok(Dashboard { plugins })
                })
                .with(Dependency::collection(plugin())),
                Lifestyle::transient(),
            ),
        )
        .unwrap();

    // Both items share one implementation, which the torn-lifestyle check would flag.
    container.verify_with(VerificationMode::VerifyOnly).unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(container.get::<Dashboard>().unwrap().plugins, 2);
}

#[test]
fn test_collection_resolves_all_items_in_order() {
    let container = Container::new();
    container
        .register_collection(
            plugin(),
            vec![
                CollectionItem::Registration(Registration::new(plugin_activator(|| AuditPlugin), Lifestyle::singleton())),
                CollectionItem::Registration(Registration::new(plugin_activator(|| CachePlugin), Lifestyle::transient())),
            ],
        )
        .unwrap();
    container.verify().unwrap();
    let names: Vec<&str> = container
        .get_all_services::<dyn crate::common::Plugin>()
        .unwrap()
        .iter()
        .map(|p| p.name())
        .collect();
    assert_eq!(names, vec!["audit", "cache"]);
}

#[test]
fn test_unregistered_abstract_item_fails_with_collection_message() {
    let container = Container::new();
    container
        .register_collection(plugin(), vec![CollectionItem::Type(plugin())])
        .unwrap();
    let err = container.verify().unwrap_err();
    assert!(matches!(
        err,
        VerificationError::Build {
            source: BuildError::UnregisteredCollectionItem { .. },
            ..
        }
    ));
    let msg = err.to_string();
    assert!(msg.starts_with("The configuration is invalid. Creating the instance for type Vec<Plugin> failed."));
    assert!(msg.contains(
        "The registration for the collection of Plugin (i.e. Vec<Plugin>) is supplied with the abstract type Plugin, \
         which hasn't been registered explicitly"
    ));
}

#[test]
fn test_unregistered_open_abstract_item_names_closed_type() {
    let container = Container::new();
    let handler = TypeInfo::of::<dyn Handler<Order>>();
    let definition = TypeInfo::open_generic::<dyn Handler<Order>>(&["E"]);
    container
        .add_known_type(Activator::new(
            TypeInfo::of::<OrderHandler>().implementing(handler.clone()),
            |_| Ok(Arc::new(OrderHandler) as Arc<dyn Handler<Order>>),
        ))
        .unwrap();
    container
        .register_open_collection(
            definition.clone(),
            vec![
                OpenCollectionItem::Type(definition.clone()),
                OpenCollectionItem::Type(TypeInfo::of::<OrderHandler>().implementing(handler)),
            ],
        )
        .unwrap();

    let msg = container.verify().unwrap_err().to_string();
    assert!(msg.contains("The registration for the collection of Handler<Order> (i.e. Vec<Handler<Order>>)"));
    assert!(msg.contains("supplied with the abstract type Handler<E> (closed as Handler<Order>)"));
    assert!(msg.contains("container.register(Handler<Order>, ...)"));
}

#[test]
fn test_concrete_item_is_container_registered() {
    let container = Container::new();
    container
        .add_known_type(plugin_activator(|| CachePlugin))
        .unwrap();
    container
        .register_collection(
            plugin(),
            vec![CollectionItem::Type(TypeInfo::of::<CachePlugin>().implementing(plugin()))],
        )
        .unwrap();
    let outcome = container
        .verify_with(VerificationMode::VerifyAndDiagnose)
        .unwrap();
    let report = outcome.report.unwrap();
    assert!(!report.has_warnings());
    assert_eq!(report.of_kind(DiagnosticKind::ContainerRegisteredCollection).len(), 1);
}

#[test]
fn test_null_item_fails_verification() {
    let container = Container::new();
    container
        .register_collection(
            plugin(),
            vec![CollectionItem::Registration(Registration::new(
                Activator::nullable(TypeInfo::of::<AuditPlugin>(), |_| Ok(None)),
                Lifestyle::transient(),
            ))],
        )
        .unwrap();
    let msg = container.verify().unwrap_err().to_string();
    assert!(msg.contains("One of the items in the collection for type Plugin is a null reference."));
}
