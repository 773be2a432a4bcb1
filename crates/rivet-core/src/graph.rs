//! Dependency-graph snapshot over prepared construction strategies.
//!
//! Nodes are instance producers keyed by [`ProducerKey`]; edges point from a
//! consumer to each producer its strategy depends on, weighted by the
//! [`DependencyKind`]. Building the snapshot prepares every strategy reachable
//! from the container's producers (which may add implicit producers) until the
//! producer set stops growing. It never instantiates anything.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::activation::DependencyKind;
use crate::container::Container;
use crate::error::BuildFailure;
use crate::producer::InstanceProducer;
use crate::types::ProducerKey;

pub struct DependencyGraph {
    graph: DiGraph<Arc<InstanceProducer>, DependencyKind>,
    index: HashMap<ProducerKey, NodeIndex>,
    seeds: Vec<NodeIndex>,
}

impl DependencyGraph {
    /// Prepare every strategy and snapshot the result. The first preparation
    /// failure is returned as-is.
    pub fn build(container: &Container) -> Result<Self, BuildFailure> {
        let mut graph = DiGraph::new();
        let mut index: HashMap<ProducerKey, NodeIndex> = HashMap::new();
        let mut seeds = Vec::new();
        let mut edges: Vec<(ProducerKey, ProducerKey, DependencyKind)> = Vec::new();

        loop {
            let mut worklist: Vec<Arc<InstanceProducer>> = Vec::new();
            for producer in container.producers() {
                if !index.contains_key(&producer.key()) {
                    let node = graph.add_node(producer.clone());
                    index.insert(producer.key(), node);
                    seeds.push(node);
                    worklist.push(producer);
                }
            }
            if worklist.is_empty() {
                break;
            }
            // Depth-first so strategy order carries into node order.
            worklist.reverse();
            while let Some(producer) = worklist.pop() {
                let strategy = container.prepare_strategy(&producer)?;
                let mut fresh = Vec::new();
                for dependency in &strategy.dependencies {
                    let key = dependency.producer.key();
                    if !index.contains_key(&key) {
                        let node = graph.add_node(dependency.producer.clone());
                        index.insert(key.clone(), node);
                        fresh.push(dependency.producer.clone());
                    }
                    edges.push((producer.key(), key, dependency.kind));
                }
                worklist.extend(fresh.into_iter().rev());
            }
        }

        for (from, to, kind) in edges {
            if let (Some(&a), Some(&b)) = (index.get(&from), index.get(&to)) {
                graph.add_edge(a, b, kind);
            }
        }

        tracing::debug!(
            producers = graph.node_count(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        Ok(Self {
            graph,
            index,
            seeds,
        })
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every producer, in discovery order.
    pub fn producers(&self) -> impl Iterator<Item = &Arc<InstanceProducer>> + '_ {
        self.graph.node_indices().map(move |n| &self.graph[n])
    }

    pub fn get(&self, key: &ProducerKey) -> Option<&Arc<InstanceProducer>> {
        self.index.get(key).map(|&n| &self.graph[n])
    }

    /// Dependencies of `producer`, in strategy order.
    pub fn dependencies<'a>(
        &'a self,
        producer: &'a InstanceProducer,
    ) -> Vec<(DependencyKind, &'a Arc<InstanceProducer>)> {
        producer
            .strategy()
            .map(|s| {
                s.dependencies
                    .iter()
                    .map(|d| (d.kind, &d.producer))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Producers whose strategy depends on `producer`, in discovery order.
    pub fn consumers(&self, producer: &InstanceProducer) -> Vec<(DependencyKind, &Arc<InstanceProducer>)> {
        let Some(&node) = self.index.get(&producer.key()) else {
            return Vec::new();
        };
        let mut found: Vec<(NodeIndex, DependencyKind)> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.source(), *e.weight()))
            .collect();
        found.sort_by_key(|(n, _)| n.index());
        found.dedup();
        found.into_iter().map(|(n, k)| (k, &self.graph[n])).collect()
    }

    /// Nodes nobody depends on, in discovery order, followed by every producer
    /// the container defines that is not already listed.
    pub fn roots(&self) -> Vec<&Arc<InstanceProducer>> {
        let mut listed = HashSet::new();
        let mut roots = Vec::new();
        for node in self.graph.node_indices() {
            if self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .next()
                .is_none()
            {
                listed.insert(node);
                roots.push(&self.graph[node]);
            }
        }
        for &node in &self.seeds {
            if listed.insert(node) {
                roots.push(&self.graph[node]);
            }
        }
        roots
    }

    /// Pre-order depth-first walk from `root`, dependencies in strategy order.
    /// Producers already in `visited` are not revisited (nor their subtrees).
    pub fn walk(
        &self,
        root: &Arc<InstanceProducer>,
        visited: &mut HashSet<ProducerKey>,
    ) -> Vec<Arc<InstanceProducer>> {
        let mut order = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(producer) = stack.pop() {
            if !visited.insert(producer.key()) {
                continue;
            }
            for (_, dependency) in self.dependencies(&producer).into_iter().rev() {
                if !visited.contains(&dependency.key()) {
                    stack.push(dependency.clone());
                }
            }
            order.push(producer);
        }
        order
    }
}
