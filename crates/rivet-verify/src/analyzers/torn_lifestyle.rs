//! W002: several registrations map the same implementation under the same
//! non-transient lifestyle, so each one caches its own instance.
//!
//! Singleton registrations that already resolved to the very same instance
//! (an activator handing out one shared [`Instance`](rivet_core::Instance))
//! are not torn.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rivet_core::{DependencyGraph, DiagnosticKind, InstanceProducer, RegistrationId};

use super::{comma_separated, plural, ContainerAnalyzer};
use crate::types::{DiagnosticDetail, DiagnosticResult};

pub struct TornLifestyleAnalyzer;

impl ContainerAnalyzer for TornLifestyleAnalyzer {
    fn kind(&self) -> DiagnosticKind {
        DiagnosticKind::TornLifestyle
    }

    fn root_description(&self, count: usize) -> String {
        format!(
            "{} possible {} found with a torn lifestyle.",
            count,
            plural(count, "registration", "registrations")
        )
    }

    fn group_description(&self, count: usize) -> String {
        format!("{} torn {}.", count, plural(count, "registration", "registrations"))
    }

    fn analyze(&self, graph: &DependencyGraph) -> Vec<DiagnosticResult> {
        let mut order: Vec<(String, String)> = Vec::new();
        let mut groups: HashMap<(String, String), Vec<&Arc<InstanceProducer>>> = HashMap::new();
        for producer in graph.producers().filter(|p| is_candidate(p)) {
            let key = (
                producer.implementation().id().to_string(),
                producer.lifestyle().identification_key().to_string(),
            );
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(producer);
        }

        let mut results = Vec::new();
        for key in order {
            let Some(producers) = groups.get(&key) else {
                continue;
            };
            let registrations: HashSet<RegistrationId> =
                producers.iter().map(|p| p.registration().id()).collect();
            if registrations.len() < 2 || !has_conflict(producers) {
                continue;
            }
            let affected: Vec<&InstanceProducer> = producers.iter().map(|p| p.as_ref()).collect();
            for producer in producers {
                results.push(torn(producer, producers, &affected));
            }
        }
        results
    }
}

fn is_candidate(producer: &InstanceProducer) -> bool {
    let registration = producer.registration();
    !producer.is_collection()
        && !producer.is_decorator()
        && !producer.is_decorated()
        && !producer.lifestyle().is_transient()
        && !registration.is_instance()
        && !registration.wraps_delegate()
}

/// Different caches only matter when they can hold different instances.
/// Singletons that already cache one shared instance are exempt.
fn has_conflict(producers: &[&Arc<InstanceProducer>]) -> bool {
    if producers.iter().any(|p| !p.lifestyle().is_singleton()) {
        return true;
    }
    let mut first = None;
    for producer in producers {
        let Some(instance) = producer.cached_instance() else {
            return true;
        };
        match first {
            None => first = Some(instance),
            Some(seen) if Arc::ptr_eq(seen, instance) => {}
            Some(_) => return true,
        }
    }
    false
}

fn torn(
    producer: &InstanceProducer,
    group: &[&Arc<InstanceProducer>],
    affected: &[&InstanceProducer],
) -> DiagnosticResult {
    let others: Vec<String> = group
        .iter()
        .filter(|p| p.registration().id() != producer.registration().id())
        .map(|p| p.service().name().to_string())
        .collect();
    let lifestyle = producer.lifestyle();
    let each = if lifestyle.is_singleton() {
        "each registration will have its own instance".to_string()
    } else {
        format!(
            "each registration will have its own instance during a single {}",
            lifestyle
        )
    };
    let description = format!(
        "The registration for {} maps to the same implementation and lifestyle as the {} for {} {}. \
         They {} map to {} ({}). This will cause each registration to resolve to a different instance: {}.",
        producer.service(),
        plural(others.len(), "registration", "registrations"),
        comma_separated(&others),
        plural(others.len(), "does", "do"),
        plural(others.len(), "both", "all"),
        producer.implementation(),
        lifestyle,
        each
    );
    DiagnosticResult::new(
        DiagnosticKind::TornLifestyle,
        producer,
        affected,
        description,
        DiagnosticDetail::TornLifestyle {
            implementation: producer.implementation().name().to_string(),
            lifestyle: lifestyle.name().to_string(),
        },
    )
}
