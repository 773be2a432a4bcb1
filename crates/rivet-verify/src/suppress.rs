use std::collections::HashSet;

use rivet_core::{DependencyGraph, DiagnosticKind};

use crate::types::DiagnosticResult;

/// Drops results by kind (container-wide) or by the diagnosed registration's
/// own suppression list.
#[derive(Debug, Clone, Default)]
pub struct SuppressionManager {
    suppressed_kinds: HashSet<DiagnosticKind>,
}

impl SuppressionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppress(&mut self, kind: DiagnosticKind) {
        self.suppressed_kinds.insert(kind);
    }

    pub fn is_suppressed(&self, kind: DiagnosticKind) -> bool {
        self.suppressed_kinds.contains(&kind)
    }

    /// Number of kinds suppressed container-wide.
    pub fn count(&self) -> usize {
        self.suppressed_kinds.len()
    }

    /// Keep the results that survive suppression; also return how many were dropped.
    pub fn apply(&self, results: Vec<DiagnosticResult>, graph: &DependencyGraph) -> (Vec<DiagnosticResult>, usize) {
        let total = results.len();
        let kept: Vec<DiagnosticResult> = results
            .into_iter()
            .filter(|r| {
                if self.is_suppressed(r.kind) {
                    return false;
                }
                let by_registration = graph
                    .get(&r.diagnosed.key)
                    .is_some_and(|p| p.registration().should_suppress(r.kind));
                if by_registration {
                    tracing::debug!(code = r.kind.code(), service = %r.service, "suppressed by registration");
                }
                !by_registration
            })
            .collect();
        let dropped = total - kept.len();
        (kept, dropped)
    }
}
