use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::utils::id::{NodeId, PortNo};

/// Weight used when discovery does not report one.
pub const DEFAULT_LINK_WEIGHT: f64 = 1.0;

/// One directed link as reported by topology discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDescriptor {
    pub src: NodeId,
    pub dst: NodeId,
    #[serde(default = "default_link_weight")]
    pub weight: f64,
    /// Port on `src` that leads to `dst`.
    pub port: PortNo,
}

fn default_link_weight() -> f64 {
    DEFAULT_LINK_WEIGHT
}

impl LinkDescriptor {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, weight: f64, port: PortNo) -> Self {
        Self { src: NodeId::new(src), dst: NodeId::new(dst), weight, port }
    }
}

/// Snapshot of the network handed over by the topology source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySnapshot {
    #[serde(default)]
    pub nodes: Vec<NodeId>,
    #[serde(default)]
    pub links: Vec<LinkDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub neighbor: NodeId,
    pub weight: f64,
    pub port: PortNo,
}

/// Directed weighted graph of switches.
///
/// Outgoing edges keep the order in which discovery reported them. Path
/// enumeration walks them in that order, so it decides which of several
/// equal-cost paths is found first.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    nodes: BTreeSet<NodeId>,
    adjacency: BTreeMap<NodeId, Vec<Edge>>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from scratch. Links with a negative or non-finite weight
    /// are dropped; a missing edge means unreachable.
    pub fn from_snapshot(snapshot: &TopologySnapshot) -> Self {
        let mut graph = TopologyGraph::new();

        for node in &snapshot.nodes {
            graph.nodes.insert(node.clone());
        }

        for link in &snapshot.links {
            if !link.weight.is_finite() || link.weight < 0.0 {
                log::error!("InvalidLink: {} -> {} has weight {}, link ignored.", link.src, link.dst, link.weight);
                continue;
            }

            graph.nodes.insert(link.src.clone());
            graph.nodes.insert(link.dst.clone());
            graph.adjacency.entry(link.src.clone()).or_default().push(Edge {
                neighbor: link.dst.clone(),
                weight: link.weight,
                port: link.port,
            });
        }

        graph
    }

    pub fn contains_node(&self, node: &NodeId) -> bool {
        self.nodes.contains(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn neighbors(&self, node: &NodeId) -> &[Edge] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First edge `src -> dst`, if any.
    pub fn edge(&self, src: &NodeId, dst: &NodeId) -> Option<&Edge> {
        self.neighbors(src).iter().find(|edge| &edge.neighbor == dst)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.adjacency.clear();
    }
}
