//! W004: transient components that own disposable resources. Nothing tracks
//! transient instances, so nothing releases what they hold.

use rivet_core::{DependencyGraph, DiagnosticKind};

use super::{plural, ContainerAnalyzer};
use crate::types::{DiagnosticDetail, DiagnosticResult};

pub struct DisposableTransientAnalyzer;

impl ContainerAnalyzer for DisposableTransientAnalyzer {
    fn kind(&self) -> DiagnosticKind {
        DiagnosticKind::DisposableTransientComponent
    }

    fn root_description(&self, count: usize) -> String {
        format!(
            "{} possible disposable transient {} found.",
            count,
            plural(count, "component", "components")
        )
    }

    fn group_description(&self, count: usize) -> String {
        format!(
            "{} disposable transient {}.",
            count,
            plural(count, "component", "components")
        )
    }

    fn analyze(&self, graph: &DependencyGraph) -> Vec<DiagnosticResult> {
        graph
            .producers()
            .filter(|p| !p.is_collection())
            .filter(|p| p.lifestyle().is_transient() && p.implementation().is_disposable())
            .map(|p| {
                DiagnosticResult::new(
                    DiagnosticKind::DisposableTransientComponent,
                    p,
                    &[p.as_ref()],
                    format!(
                        "{} is registered as transient, but owns a disposable resource.",
                        p.implementation()
                    ),
                    DiagnosticDetail::DisposableTransientComponent,
                )
            })
            .collect()
    }
}
