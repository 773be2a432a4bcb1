// Tests for verifying decorated services
use std::sync::Arc;

use rivet_core::{Activator, Container, Dependency, Lifestyle, Registration, TypeInfo};
use rivet_verify::{VerificationError, VerifyExt};

use crate::common::{plugin, plugin_activator, AuditPlugin, LoggingPlugin, Plugin};

fn logging_decorator(lazy: bool) -> Activator {
    let dependency = if lazy {
        Dependency::lazy_decoratee(plugin())
    } else {
        Dependency::decoratee(plugin())
    };
    Activator::new(TypeInfo::of::<LoggingPlugin>(), move |args| {
        let inner = if lazy {
            args.lazy(0)?.service::<dyn Plugin>()?
        } else {
            args.service::<dyn Plugin>(0)?
        };
        Ok(Arc::new(LoggingPlugin { inner }) as Arc<dyn Plugin>)
    })
    .with(dependency)
}

fn failing_decorator() -> Activator {
    Activator::new(TypeInfo::of::<LoggingPlugin>(), |_| -> Result<Arc<dyn Plugin>, _> {
        Err("decorator misconfigured".into())
    })
    .with(Dependency::decoratee(plugin()))
}

#[test]
fn test_decorated_service_verifies() {
    let container = Container::new();
    container
        .register(plugin(), Registration::new(plugin_activator(|| AuditPlugin), Lifestyle::singleton()))
        .unwrap();
    container
        .register_decorator(plugin(), logging_decorator(false), Lifestyle::transient())
        .unwrap();
    container.verify().unwrap_or_else(|e| panic!("{e}"));
    let resolved = container.get_service::<dyn Plugin>().unwrap();
    assert_eq!(resolved.name(), "audit");
}

#[test]
fn test_failing_decorator_fails_even_after_strategy_was_prepared() {
    let container = Container::new();
    container
        .register(plugin(), Registration::new(plugin_activator(|| AuditPlugin), Lifestyle::transient()))
        .unwrap();
    container
        .register_decorator(plugin(), failing_decorator(), Lifestyle::transient())
        .unwrap();

    let producer = container.producer_for(&plugin()).unwrap();
    container.prepare_strategy(&producer).unwrap();
    assert!(producer.strategy().is_some());
    assert!(!producer.is_instantiated());

    let err = container.verify().unwrap_err();
    assert!(matches!(err, VerificationError::Build { .. }));
    assert!(err.to_string().contains("decorator misconfigured"));
}

#[test]
fn test_lazy_decoratee_is_still_verified() {
    let container = Container::new();
    container
        .register(
            plugin(),
            Registration::new(
                Activator::new(TypeInfo::of::<AuditPlugin>(), |_| -> Result<Arc<dyn Plugin>, _> {
                    Err("audit sink unreachable".into())
                }),
                Lifestyle::transient(),
            ),
        )
        .unwrap();
    container
        .register_decorator(plugin(), logging_decorator(true), Lifestyle::transient())
        .unwrap();

    let err = container.verify().unwrap_err();
    assert!(err.to_string().contains("audit sink unreachable"));
}
