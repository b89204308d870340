use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::topology::path::Path;
use crate::domain::utils::id::NodeId;

/// Forwarding structure rooted at a broker: for every switch, the next hops
/// the traffic is replicated to.
///
/// Built as the union of independent shortest paths, so it is not a minimal
/// Steiner tree. Repeated `(node, next hop)` pairs are stored once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MulticastTree {
    pub root: NodeId,
    pub next_hops: BTreeMap<NodeId, Vec<NodeId>>,
    /// Destinations no path was found for. They get no forwarding state.
    pub unreachable: Vec<NodeId>,
}

impl MulticastTree {
    pub fn new(root: NodeId) -> Self {
        Self { root, next_hops: BTreeMap::new(), unreachable: Vec::new() }
    }

    pub fn add_path(&mut self, path: &Path) {
        for (from, to) in path.hops() {
            let hops = self.next_hops.entry(from.clone()).or_default();
            if !hops.contains(to) {
                hops.push(to.clone());
            }
        }
    }

    pub fn mark_unreachable(&mut self, destination: NodeId) {
        if !self.unreachable.contains(&destination) {
            self.unreachable.push(destination);
        }
    }

    pub fn next_hops_of(&self, node: &NodeId) -> &[NodeId] {
        self.next_hops.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.next_hops.is_empty()
    }
}
