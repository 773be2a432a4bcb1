//! W003: a component depends on a concrete type the container created on the
//! fly, bypassing the registrations that were meant to serve it.
//!
//! Two shapes are reported. The auto-resolved dependency's implementation is
//! also explicitly registered under some other service, so the consumer gets
//! a fresh transient copy instead of the registered one. Or the auto-resolved
//! dependency itself consumes further auto-resolved concrete types, which
//! usually means a whole object graph was never registered.

use std::sync::Arc;

use rivet_core::{DependencyGraph, DiagnosticKind, InstanceProducer};

use super::{comma_separated, plural, ContainerAnalyzer};
use crate::types::{DiagnosticDetail, DiagnosticResult, ProducerInfo};

pub struct ShortCircuitedAnalyzer;

impl ContainerAnalyzer for ShortCircuitedAnalyzer {
    fn kind(&self) -> DiagnosticKind {
        DiagnosticKind::ShortCircuitedDependency
    }

    fn root_description(&self, count: usize) -> String {
        format!(
            "{} possible short circuited {} found.",
            count,
            plural(count, "dependency", "dependencies")
        )
    }

    fn group_description(&self, count: usize) -> String {
        format!(
            "{} short circuited {}.",
            count,
            plural(count, "component", "components")
        )
    }

    fn analyze(&self, graph: &DependencyGraph) -> Vec<DiagnosticResult> {
        let mut results = Vec::new();
        for consumer in graph.producers() {
            if consumer.is_collection() {
                continue;
            }
            for (_, dependency) in graph.dependencies(consumer) {
                if !is_auto_resolved(dependency) {
                    continue;
                }
                let expected = registered_elsewhere(graph, dependency);
                let unregistered: Vec<&Arc<InstanceProducer>> = graph
                    .dependencies(dependency)
                    .into_iter()
                    .map(|(_, p)| p)
                    .filter(|p| is_auto_resolved(p))
                    .collect();
                if expected.is_empty() && unregistered.is_empty() {
                    continue;
                }
                results.push(short_circuited(consumer, dependency, &expected, &unregistered));
            }
        }
        results
    }
}

fn is_auto_resolved(producer: &InstanceProducer) -> bool {
    !producer.is_collection() && !producer.is_decorator() && producer.registration().is_auto_resolved()
}

/// Explicit producers of the same implementation under other registrations.
fn registered_elsewhere<'a>(
    graph: &'a DependencyGraph,
    dependency: &InstanceProducer,
) -> Vec<&'a Arc<InstanceProducer>> {
    graph
        .producers()
        .filter(|p| {
            !p.is_collection()
                && !p.is_decorator()
                && !p.registration().is_auto_resolved()
                && p.registration().id() != dependency.registration().id()
                && p.implementation() == dependency.implementation()
        })
        .collect()
}

fn short_circuited(
    consumer: &InstanceProducer,
    dependency: &InstanceProducer,
    expected: &[&Arc<InstanceProducer>],
    unregistered: &[&Arc<InstanceProducer>],
) -> DiagnosticResult {
    let description = if expected.is_empty() {
        let names: Vec<String> = unregistered
            .iter()
            .map(|p| p.implementation().name().to_string())
            .collect();
        format!(
            "{} depends on unregistered type {} ({}), which itself depends on unregistered {} {}.",
            consumer.implementation(),
            dependency.implementation(),
            dependency.lifestyle(),
            plural(names.len(), "type", "types"),
            comma_separated(&names)
        )
    } else {
        let services: Vec<String> = expected
            .iter()
            .map(|p| format!("{} ({})", p.service(), p.lifestyle()))
            .collect();
        format!(
            "{} might incorrectly depend on unregistered type {} ({}) instead of {}.",
            consumer.implementation(),
            dependency.implementation(),
            dependency.lifestyle(),
            comma_separated(&services)
        )
    };

    let mut affected: Vec<&InstanceProducer> = vec![consumer, dependency];
    affected.extend(expected.iter().map(|p| p.as_ref()));
    affected.extend(unregistered.iter().map(|p| p.as_ref()));
    DiagnosticResult::new(
        DiagnosticKind::ShortCircuitedDependency,
        consumer,
        &affected,
        description,
        DiagnosticDetail::ShortCircuitedDependency {
            dependency: ProducerInfo::from_producer(dependency),
            expected_services: expected.iter().map(|p| p.service().name().to_string()).collect(),
            unregistered_dependencies: unregistered
                .iter()
                .map(|p| p.implementation().name().to_string())
                .collect(),
        },
    )
}
