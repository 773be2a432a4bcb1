//! Aggregation of analyzer results into a report.
//!
//! Results are sectioned by analyzer, in analyzer order. Inside a section,
//! results whose affected producers overlap land in the same group, so a torn
//! registration pair is listed once as a unit rather than as two unrelated lines.

use std::collections::{HashMap, HashSet};

use petgraph::unionfind::UnionFind;
use serde::Serialize;

use rivet_core::{DiagnosticKind, ProducerKey, Severity};

use crate::analyzers::ContainerAnalyzer;
use crate::types::DiagnosticResult;

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticGroup {
    pub description: String,
    pub results: Vec<DiagnosticResult>,
}

/// All results of one analyzer.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticSection {
    pub kind: DiagnosticKind,
    pub code: String,
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub groups: Vec<DiagnosticGroup>,
}

impl DiagnosticSection {
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.results.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn results(&self) -> impl Iterator<Item = &DiagnosticResult> + '_ {
        self.groups.iter().flat_map(|g| g.results.iter())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticReport {
    pub sections: Vec<DiagnosticSection>,
    /// Results dropped by container-wide or per-registration suppression.
    pub suppressed: usize,
}

impl DiagnosticReport {
    /// Build a report from each analyzer's surviving results. Analyzers that
    /// found nothing get no section; a fingerprint repeated for the same
    /// producer is kept once.
    pub fn from_results(
        entries: Vec<(&dyn ContainerAnalyzer, Vec<DiagnosticResult>)>,
        suppressed: usize,
    ) -> Self {
        let mut sections = Vec::new();
        for (analyzer, results) in entries {
            let mut seen = HashSet::new();
            let results: Vec<DiagnosticResult> = results
                .into_iter()
                .filter(|r| seen.insert((r.fingerprint.clone(), r.diagnosed.key.clone())))
                .collect();
            if results.is_empty() {
                continue;
            }
            let count = results.len();
            let groups = group_overlapping(results)
                .into_iter()
                .map(|results| DiagnosticGroup {
                    description: analyzer.group_description(results.len()),
                    results,
                })
                .collect();
            let kind = analyzer.kind();
            sections.push(DiagnosticSection {
                kind,
                code: kind.code().to_string(),
                name: analyzer.name().to_string(),
                severity: kind.severity(),
                description: analyzer.root_description(count),
                groups,
            });
        }
        Self {
            sections,
            suppressed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.len()).sum()
    }

    /// Every result, section by section.
    pub fn results(&self) -> impl Iterator<Item = &DiagnosticResult> + '_ {
        self.sections.iter().flat_map(|s| s.results())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticResult> + '_ {
        self.results().filter(|r| r.is_warning())
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&DiagnosticResult> {
        self.results().filter(|r| r.kind == kind).collect()
    }

    pub fn section(&self, kind: DiagnosticKind) -> Option<&DiagnosticSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// One line per section: `-[Torn Lifestyle] 2 possible registrations found ...`.
    pub fn summary(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("-[{}] {}", s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Every section with its groups and result descriptions, indented.
    pub fn listing(&self) -> String {
        let mut lines = Vec::new();
        for section in &self.sections {
            lines.push(format!("-[{}] {}", section.name, section.description));
            for group in &section.groups {
                if section.groups.len() > 1 || group.results.len() > 1 {
                    lines.push(format!("  -{}", group.description));
                    for result in &group.results {
                        lines.push(format!("    -{}", result.description));
                    }
                } else {
                    for result in &group.results {
                        lines.push(format!("  -{}", result.description));
                    }
                }
            }
        }
        lines.join("\n")
    }
}

/// Partition results into groups of transitively overlapping affected sets,
/// ordered by first appearance.
fn group_overlapping(results: Vec<DiagnosticResult>) -> Vec<Vec<DiagnosticResult>> {
    let mut sets = UnionFind::<usize>::new(results.len());
    let mut owner: HashMap<&ProducerKey, usize> = HashMap::new();
    for (i, result) in results.iter().enumerate() {
        for info in &result.affected {
            match owner.get(&info.key) {
                Some(&j) => {
                    sets.union(i, j);
                }
                None => {
                    owner.insert(&info.key, i);
                }
            }
        }
    }

    let labels: Vec<usize> = (0..results.len()).map(|i| sets.find(i)).collect();
    let mut order: Vec<usize> = Vec::new();
    let mut groups: HashMap<usize, Vec<DiagnosticResult>> = HashMap::new();
    for (result, label) in results.into_iter().zip(labels) {
        if !groups.contains_key(&label) {
            order.push(label);
        }
        groups.entry(label).or_default().push(result);
    }
    order
        .into_iter()
        .filter_map(|label| groups.remove(&label))
        .collect()
}
