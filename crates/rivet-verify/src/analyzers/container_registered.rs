//! I001: collection items the container had to register itself because they
//! were supplied as bare concrete types.

use rivet_core::{DependencyGraph, DiagnosticKind, ProducerRole};

use super::{plural, undecorated, ContainerAnalyzer};
use crate::types::{DiagnosticDetail, DiagnosticResult};

pub struct ContainerRegisteredAnalyzer;

impl ContainerAnalyzer for ContainerRegisteredAnalyzer {
    fn kind(&self) -> DiagnosticKind {
        DiagnosticKind::ContainerRegisteredCollection
    }

    fn root_description(&self, count: usize) -> String {
        format!(
            "{} container-registered collection {} found.",
            count,
            plural(count, "item", "items")
        )
    }

    fn group_description(&self, count: usize) -> String {
        format!(
            "{} container-registered {}.",
            count,
            plural(count, "item", "items")
        )
    }

    fn analyze(&self, graph: &DependencyGraph) -> Vec<DiagnosticResult> {
        let mut results = Vec::new();
        for collection in graph.producers() {
            let ProducerRole::Collection { element } = collection.role() else {
                continue;
            };
            for (_, item) in graph.dependencies(collection) {
                let component = undecorated(item);
                if !component.registration().is_auto_resolved() {
                    continue;
                }
                let description = format!(
                    "{} is part of the {} collection, but has no registration of its own; \
                     the container registered it as {}.",
                    component.implementation(),
                    element.collection_name(),
                    component.lifestyle()
                );
                results.push(DiagnosticResult::new(
                    DiagnosticKind::ContainerRegisteredCollection,
                    component,
                    &[component.as_ref(), collection.as_ref()],
                    description,
                    DiagnosticDetail::ContainerRegisteredCollection {
                        element: element.name().to_string(),
                    },
                ));
            }
        }
        results
    }
}
