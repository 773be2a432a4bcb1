// Tests for verification and resolution from several threads
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rivet_core::{Activator, Container, Lifestyle, Registration, TypeInfo, VerificationMode};
use rivet_verify::VerifyExt;

use crate::common::{layered, Repo};

#[test]
fn test_concurrent_singleton_resolution_builds_once() {
    let built = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    let counter = built.clone();
    container
        .register(
            TypeInfo::of::<Repo>(),
            Registration::new(
                Activator::of::<Repo, _>(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Repo)
                }),
                Lifestyle::singleton(),
            ),
        )
        .unwrap();

    let instances: Vec<Arc<Repo>> = (0..64)
        .into_par_iter()
        .map(|_| container.get::<Repo>().unwrap())
        .collect();
    assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(built.load(Ordering::SeqCst), 1);

    container.verify().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_verification_passes() {
    let container = layered();
    let outcomes: Vec<_> = (0..8)
        .into_par_iter()
        .map(|_| container.verify_with(VerificationMode::VerifyAndCollect))
        .collect();
    for outcome in &outcomes {
        let outcome = outcome.as_ref().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(outcome.producers, 3);
        assert!(!outcome.has_warnings());
    }
    let repo = container.get::<Repo>().unwrap();
    assert!(Arc::ptr_eq(&repo, &container.get::<Repo>().unwrap()));
}
