use std::collections::HashSet;
use std::sync::Arc;

use rivet_core::config::DEFAULT_DOCS_URL;
use rivet_core::types::friendly_name;
use rivet_core::{
    BuildFailure, Container, DependencyGraph, DiagnosticKind, InstanceProducer, RivetConfig, VerificationMode,
};

use crate::analyzers::{default_analyzers, ContainerAnalyzer};
use crate::error::{DiagnosticVerificationError, VerificationError};
use crate::report::DiagnosticReport;
use crate::suppress::SuppressionManager;
use crate::types::VerificationOutcome;

/// Runs verification passes and the analyzers over a container.
pub struct Verifier {
    analyzers: Vec<Box<dyn ContainerAnalyzer>>,
    suppressions: SuppressionManager,
    docs_url: String,
}

impl Verifier {
    pub fn new() -> Self {
        Self {
            analyzers: default_analyzers(),
            suppressions: SuppressionManager::new(),
            docs_url: DEFAULT_DOCS_URL.to_string(),
        }
    }

    /// Verifier honouring the container-wide suppressions and docs link of `config`.
    pub fn with_config(config: &RivetConfig) -> Self {
        let mut verifier = Self::new();
        for kind in &config.diagnostics.suppress {
            verifier.suppress(*kind);
        }
        verifier.docs_url = config.diagnostics.docs_url.clone();
        verifier
    }

    /// Append an analyzer after the built-in ones.
    pub fn with_analyzer(mut self, analyzer: Box<dyn ContainerAnalyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn suppress(&mut self, kind: DiagnosticKind) {
        self.suppressions.suppress(kind);
    }

    pub fn analyzers(&self) -> &[Box<dyn ContainerAnalyzer>] {
        &self.analyzers
    }

    /// Freeze `container`, build every producer once, then analyze according
    /// to `mode`.
    ///
    /// Producers already instantiated (by earlier resolves or an earlier pass)
    /// are not built again, so verifying twice is harmless. The first build
    /// failure aborts the pass.
    pub fn verify(&self, container: &Container, mode: VerificationMode) -> Result<VerificationOutcome, VerificationError> {
        tracing::info!(mode = %mode, "verifying container");
        container.freeze();

        let graph = DependencyGraph::build(container).map_err(|failure| {
            let root = failure.path.first().cloned().unwrap_or_else(|| failure.implementation.clone());
            build_error(root, failure.implementation.clone(), failure)
        })?;

        let generation = container.registry_generation();
        let thread = std::thread::current().id();
        let scope = container.begin_scope();
        let buildable = graph.producers().filter(|p| !p.is_collection()).count();
        let skipped = graph
            .producers()
            .filter(|p| !p.is_collection() && p.is_instantiated())
            .count();
        let mut visited = HashSet::new();

        for root in graph.roots() {
            for producer in graph.walk(root, &mut visited) {
                // Collections hold no state; their items are nodes of their own.
                if producer.is_collection() || producer.is_instantiated() {
                    continue;
                }
                container
                    .instantiate(&producer, &scope)
                    .map_err(|failure| root_failure(root, failure))?;

                if container.registry_generation() != generation {
                    let discovered = container.discovered_since(generation, thread);
                    if !discovered.is_empty() {
                        return Err(VerificationError::ProducerDiscovered {
                            root: root.service().name().to_string(),
                            discovered: discovered.iter().map(|k| friendly_name(&k.service)).collect(),
                        });
                    }
                }
            }
        }
        let instantiated = buildable - skipped;
        tracing::info!(producers = graph.len(), instantiated, skipped, "object graph verified");

        let report = if mode.runs_analyzers() {
            Some(self.diagnose(&graph))
        } else {
            None
        };

        if mode == VerificationMode::VerifyAndDiagnose {
            if let Some(report) = report.as_ref().filter(|r| r.has_warnings()) {
                tracing::warn!(warnings = report.warnings().count(), "diagnostic warnings reported");
                return Err(DiagnosticVerificationError::new(report.clone(), &self.docs_url).into());
            }
        }

        Ok(VerificationOutcome {
            mode,
            producers: graph.len(),
            instantiated,
            skipped,
            report,
        })
    }

    /// Run every analyzer over `graph` and apply suppressions.
    pub fn diagnose(&self, graph: &DependencyGraph) -> DiagnosticReport {
        let mut entries = Vec::with_capacity(self.analyzers.len());
        let mut suppressed = 0;
        for analyzer in &self.analyzers {
            let results = analyzer.analyze(graph);
            let (kept, dropped) = self.suppressions.apply(results, graph);
            suppressed += dropped;
            tracing::debug!(
                code = analyzer.kind().code(),
                found = kept.len(),
                suppressed = dropped,
                "analyzer finished"
            );
            entries.push((analyzer.as_ref(), kept));
        }
        DiagnosticReport::from_results(entries, suppressed)
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Verification entry points on the container itself.
pub trait VerifyExt {
    /// Verify in the mode named by the container's configuration.
    fn verify(&self) -> Result<VerificationOutcome, VerificationError>;

    fn verify_with(&self, mode: VerificationMode) -> Result<VerificationOutcome, VerificationError>;

    /// Verify in the mode named by `mode` (`verify_only`, `1`, ...). An invalid
    /// value still freezes the container but fails before any graph work.
    fn verify_with_mode(&self, mode: &str) -> Result<VerificationOutcome, VerificationError>;

    /// Verify and return every finding without failing on warnings.
    fn analyze(&self) -> Result<DiagnosticReport, VerificationError>;
}

impl VerifyExt for Container {
    fn verify(&self) -> Result<VerificationOutcome, VerificationError> {
        self.verify_with(self.config().verification.mode)
    }

    fn verify_with(&self, mode: VerificationMode) -> Result<VerificationOutcome, VerificationError> {
        Verifier::with_config(self.config()).verify(self, mode)
    }

    fn verify_with_mode(&self, mode: &str) -> Result<VerificationOutcome, VerificationError> {
        self.freeze();
        let mode: VerificationMode = mode.parse()?;
        self.verify_with(mode)
    }

    fn analyze(&self) -> Result<DiagnosticReport, VerificationError> {
        let outcome = self.verify_with(VerificationMode::VerifyAndCollect)?;
        Ok(outcome.report.unwrap_or_default())
    }
}

fn root_failure(root: &Arc<InstanceProducer>, failure: BuildFailure) -> VerificationError {
    let implementation = failure.implementation.clone();
    build_error(root.service().name().to_string(), implementation, failure)
}

fn build_error(service: String, implementation: String, failure: BuildFailure) -> VerificationError {
    tracing::warn!(service = %service, error = %failure.error, "verification failed");
    VerificationError::Build {
        service,
        implementation,
        path: failure.path,
        source: failure.error,
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
