//! Container analyzers.
//!
//! Each analyzer inspects the dependency graph after verification built it and
//! returns its findings. Analyzers never instantiate anything and never look at
//! suppression; the [`Verifier`](crate::engine::Verifier) filters afterwards.

pub mod ambiguous_lifestyle;
pub mod container_registered;
pub mod disposable_transient;
pub mod lifestyle_mismatch;
pub mod short_circuited;
pub mod torn_lifestyle;

use std::sync::Arc;

use rivet_core::{DependencyGraph, DiagnosticKind, InstanceProducer};

use crate::types::DiagnosticResult;

pub use ambiguous_lifestyle::AmbiguousLifestyleAnalyzer;
pub use container_registered::ContainerRegisteredAnalyzer;
pub use disposable_transient::DisposableTransientAnalyzer;
pub use lifestyle_mismatch::LifestyleMismatchAnalyzer;
pub use short_circuited::ShortCircuitedAnalyzer;
pub use torn_lifestyle::TornLifestyleAnalyzer;

pub trait ContainerAnalyzer: Send + Sync {
    fn kind(&self) -> DiagnosticKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Headline for a report section holding `count` results.
    fn root_description(&self, count: usize) -> String;

    /// Headline for a group of `count` overlapping results.
    fn group_description(&self, count: usize) -> String;

    fn analyze(&self, graph: &DependencyGraph) -> Vec<DiagnosticResult>;
}

/// The built-in analyzers, in report order.
pub fn default_analyzers() -> Vec<Box<dyn ContainerAnalyzer>> {
    vec![
        Box::new(LifestyleMismatchAnalyzer),
        Box::new(TornLifestyleAnalyzer),
        Box::new(ShortCircuitedAnalyzer),
        Box::new(DisposableTransientAnalyzer),
        Box::new(AmbiguousLifestyleAnalyzer),
        Box::new(ContainerRegisteredAnalyzer),
    ]
}

pub(crate) fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

/// "A", "A and B", "A, B and C".
pub(crate) fn comma_separated(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Follow decorator layers down to the undecorated producer.
pub(crate) fn undecorated(producer: &Arc<InstanceProducer>) -> &Arc<InstanceProducer> {
    let mut current = producer;
    while let Some(inner) = current.decoratee() {
        current = inner;
    }
    current
}
