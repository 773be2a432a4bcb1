use serde::Serialize;

use rivet_core::hash::compute_fingerprint;
use rivet_core::{DiagnosticKind, InstanceProducer, ProducerKey, Severity, VerificationMode};

use crate::report::DiagnosticReport;

/// Serializable view of an instance producer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProducerInfo {
    pub key: ProducerKey,
    pub service: String,
    pub implementation: String,
    pub lifestyle: String,
}

impl ProducerInfo {
    pub fn from_producer(producer: &InstanceProducer) -> Self {
        Self {
            key: producer.key(),
            service: producer.service().name().to_string(),
            implementation: producer.implementation().name().to_string(),
            lifestyle: producer.lifestyle().name().to_string(),
        }
    }
}

/// Kind-specific data attached to a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiagnosticDetail {
    LifestyleMismatch {
        dependency: ProducerInfo,
    },
    TornLifestyle {
        implementation: String,
        lifestyle: String,
    },
    ShortCircuitedDependency {
        dependency: ProducerInfo,
        expected_services: Vec<String>,
        unregistered_dependencies: Vec<String>,
    },
    DisposableTransientComponent,
    AmbiguousLifestyles {
        implementation: String,
        lifestyles: Vec<String>,
    },
    ContainerRegisteredCollection {
        element: String,
    },
}

/// One finding of one analyzer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticResult {
    pub kind: DiagnosticKind,
    pub code: String,
    pub severity: Severity,
    pub service: String,
    pub description: String,
    /// The producer blamed for the finding.
    pub diagnosed: ProducerInfo,
    /// Every producer the finding was detected within.
    pub affected: Vec<ProducerInfo>,
    pub fingerprint: String,
    pub detail: DiagnosticDetail,
}

impl DiagnosticResult {
    pub fn new(
        kind: DiagnosticKind,
        diagnosed: &InstanceProducer,
        affected: &[&InstanceProducer],
        description: String,
        detail: DiagnosticDetail,
    ) -> Self {
        let fingerprint = compute_fingerprint(&[
            kind.code(),
            diagnosed.service().id(),
            diagnosed.implementation().id(),
            &description,
        ]);
        let mut affected_info: Vec<ProducerInfo> = Vec::with_capacity(affected.len());
        for producer in affected {
            let info = ProducerInfo::from_producer(producer);
            if !affected_info.contains(&info) {
                affected_info.push(info);
            }
        }
        Self {
            kind,
            code: kind.code().to_string(),
            severity: kind.severity(),
            service: diagnosed.service().name().to_string(),
            description,
            diagnosed: ProducerInfo::from_producer(diagnosed),
            affected: affected_info,
            fingerprint,
            detail,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// Result of a successful verification pass.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub mode: VerificationMode,
    /// Producers in the verified graph.
    pub producers: usize,
    /// Producers this pass instantiated.
    pub instantiated: usize,
    /// Producers skipped because they were already instantiated.
    pub skipped: usize,
    /// Present unless the mode is `VerifyOnly`.
    pub report: Option<DiagnosticReport>,
}

impl VerificationOutcome {
    pub fn has_warnings(&self) -> bool {
        self.report.as_ref().is_some_and(|r| r.has_warnings())
    }
}
