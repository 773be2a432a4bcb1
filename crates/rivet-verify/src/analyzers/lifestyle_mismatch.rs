//! W001: a component depends on something with a shorter lifestyle.
//!
//! Collections are looked through: a singleton consuming `Vec<dyn Plugin>`
//! is checked against every item. Lazy edges are skipped because the
//! dependency is resolved each time the handle is used.

use std::sync::Arc;

use rivet_core::{DependencyGraph, DependencyKind, DiagnosticKind, InstanceProducer};

use super::{plural, ContainerAnalyzer};
use crate::types::{DiagnosticDetail, DiagnosticResult, ProducerInfo};

pub struct LifestyleMismatchAnalyzer;

impl ContainerAnalyzer for LifestyleMismatchAnalyzer {
    fn kind(&self) -> DiagnosticKind {
        DiagnosticKind::LifestyleMismatch
    }

    fn root_description(&self, count: usize) -> String {
        format!(
            "{} possible lifestyle {} found.",
            count,
            plural(count, "mismatch", "mismatches")
        )
    }

    fn group_description(&self, count: usize) -> String {
        format!("{} lifestyle {}.", count, plural(count, "mismatch", "mismatches"))
    }

    fn analyze(&self, graph: &DependencyGraph) -> Vec<DiagnosticResult> {
        let mut results = Vec::new();
        for consumer in graph.producers() {
            if consumer.is_collection() {
                continue;
            }
            for (kind, dependency) in graph.dependencies(consumer) {
                if kind.is_lazy() {
                    continue;
                }
                for target in targets(graph, kind, dependency) {
                    if consumer.lifestyle().outlives(target.lifestyle()) {
                        results.push(mismatch(consumer, target));
                    }
                }
            }
        }
        results
    }
}

fn targets<'a>(
    graph: &'a DependencyGraph,
    kind: DependencyKind,
    dependency: &'a Arc<InstanceProducer>,
) -> Vec<&'a Arc<InstanceProducer>> {
    if kind == DependencyKind::Collection || dependency.is_collection() {
        graph
            .dependencies(dependency)
            .into_iter()
            .map(|(_, item)| item)
            .collect()
    } else {
        vec![dependency]
    }
}

fn mismatch(consumer: &InstanceProducer, dependency: &InstanceProducer) -> DiagnosticResult {
    let target = if dependency.service() == dependency.implementation() {
        format!("{} ({})", dependency.implementation(), dependency.lifestyle())
    } else {
        format!(
            "{} implemented by {} ({})",
            dependency.service(),
            dependency.implementation(),
            dependency.lifestyle()
        )
    };
    let description = format!(
        "{} ({}) depends on {}.",
        consumer.implementation(),
        consumer.lifestyle(),
        target
    );
    DiagnosticResult::new(
        DiagnosticKind::LifestyleMismatch,
        consumer,
        &[consumer, dependency],
        description,
        DiagnosticDetail::LifestyleMismatch {
            dependency: ProducerInfo::from_producer(dependency),
        },
    )
}
