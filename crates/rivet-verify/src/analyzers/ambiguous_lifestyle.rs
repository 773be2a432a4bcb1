//! W005: one implementation registered under different lifestyles.

use std::collections::HashMap;
use std::sync::Arc;

use rivet_core::{DependencyGraph, DiagnosticKind, InstanceProducer};

use super::{comma_separated, plural, ContainerAnalyzer};
use crate::types::{DiagnosticDetail, DiagnosticResult};

pub struct AmbiguousLifestyleAnalyzer;

impl ContainerAnalyzer for AmbiguousLifestyleAnalyzer {
    fn kind(&self) -> DiagnosticKind {
        DiagnosticKind::AmbiguousLifestyles
    }

    fn root_description(&self, count: usize) -> String {
        format!(
            "{} possible {} found with lifestyle ambiguity.",
            count,
            plural(count, "registration", "registrations")
        )
    }

    fn group_description(&self, count: usize) -> String {
        format!(
            "{} possible {} with lifestyle ambiguity.",
            count,
            plural(count, "registration", "registrations")
        )
    }

    fn analyze(&self, graph: &DependencyGraph) -> Vec<DiagnosticResult> {
        let mut order: Vec<String> = Vec::new();
        let mut by_implementation: HashMap<String, Vec<&Arc<InstanceProducer>>> = HashMap::new();
        for producer in graph.producers() {
            if producer.is_collection() || producer.is_decorator() || producer.registration().is_instance() {
                continue;
            }
            let id = producer.implementation().id().to_string();
            if !by_implementation.contains_key(&id) {
                order.push(id.clone());
            }
            by_implementation.entry(id).or_default().push(producer);
        }

        let mut results = Vec::new();
        for id in order {
            let Some(group) = by_implementation.get(&id) else {
                continue;
            };
            let mut lifestyles: Vec<String> = Vec::new();
            for producer in group {
                let key = producer.lifestyle().identification_key().to_string();
                if !lifestyles.contains(&key) {
                    lifestyles.push(key);
                }
            }
            if lifestyles.len() < 2 {
                continue;
            }
            let affected: Vec<&InstanceProducer> = group.iter().map(|p| p.as_ref()).collect();
            for producer in group {
                results.push(ambiguous(producer, group, &affected, &lifestyles));
            }
        }
        results
    }
}

fn ambiguous(
    producer: &InstanceProducer,
    group: &[&Arc<InstanceProducer>],
    affected: &[&InstanceProducer],
    lifestyles: &[String],
) -> DiagnosticResult {
    let own = producer.lifestyle().identification_key();
    let conflicting: Vec<String> = group
        .iter()
        .filter(|p| p.lifestyle().identification_key() != own)
        .map(|p| format!("{} ({})", p.service(), p.lifestyle()))
        .collect();
    let description = format!(
        "The registration for {} ({}) maps to the same implementation ({}) as the {} for {} {}, \
         but the registration maps to a different lifestyle. This will cause each registration \
         to resolve to a different instance.",
        producer.service(),
        producer.lifestyle(),
        producer.implementation(),
        plural(conflicting.len(), "registration", "registrations"),
        comma_separated(&conflicting),
        plural(conflicting.len(), "does", "do"),
    );
    DiagnosticResult::new(
        DiagnosticKind::AmbiguousLifestyles,
        producer,
        affected,
        description,
        DiagnosticDetail::AmbiguousLifestyles {
            implementation: producer.implementation().name().to_string(),
            lifestyles: lifestyles.to_vec(),
        },
    )
}
