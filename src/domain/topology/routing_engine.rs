use serde::Serialize;
use std::collections::HashSet;

use crate::domain::topology::multicast_tree::MulticastTree;
use crate::domain::topology::path::Path;
use crate::domain::topology::topology_graph::{TopologyGraph, TopologySnapshot};
use crate::domain::utils::id::{NodeId, PortNo};

/// Scale of the bucket weights handed out for multipath spreading.
const BUCKET_WEIGHT_SCALE: f64 = 10.0;

/// A candidate path together with its cost and its share for multipath spreading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketWeight {
    pub path: Path,
    pub cost: f64,
    pub weight: f64,
}

/// Path selection over the current topology.
///
/// Paths are found by enumerating **all** simple paths with a depth-first
/// search and picking the cheapest one. This is exponential for dense graphs
/// and relies on the core/edge topologies being sparse.
#[derive(Debug, Clone, Default)]
pub struct RoutingEngine {
    graph: TopologyGraph,
}

impl RoutingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the graph wholesale. Nothing of the previous topology survives.
    pub fn update_topology(&mut self, snapshot: &TopologySnapshot) {
        self.graph.clear();
        self.graph = TopologyGraph::from_snapshot(snapshot);

        log::debug!("Topology updated: {} nodes, {} links.", self.graph.node_count(), self.graph.link_count());
    }

    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    /// Sum of the link weights along `path`.
    ///
    /// Returns infinity if a hop has no edge in the current graph.
    pub fn path_weight(&self, path: &Path) -> f64 {
        let mut cost = 0.0;
        for (from, to) in path.hops() {
            match self.graph.edge(from, to) {
                Some(edge) => cost += edge.weight,
                None => return f64::INFINITY,
            }
        }
        cost
    }

    /// Enumerates every loop-free path from `src` to `dst`.
    ///
    /// Uses an explicit stack instead of recursion. A node is excluded only
    /// while it is on the current branch, so it can show up again on another
    /// branch after backtracking. Paths come out in the order a recursive
    /// depth-first search following the adjacency order would find them.
    pub fn find_all_paths(&self, src: &NodeId, dst: &NodeId) -> Vec<Path> {
        if !self.graph.contains_node(src) || !self.graph.contains_node(dst) {
            return Vec::new();
        }

        if src == dst {
            return vec![Path::new(vec![src.clone()])];
        }

        let mut found_paths = Vec::new();
        let mut branch: Vec<NodeId> = vec![src.clone()];
        let mut cursors: Vec<usize> = vec![0];
        let mut on_branch: HashSet<NodeId> = HashSet::from([src.clone()]);

        while let Some(depth) = cursors.len().checked_sub(1) {
            let neighbors = self.graph.neighbors(&branch[depth]);
            let cursor = cursors[depth];

            if cursor >= neighbors.len() {
                if let Some(node) = branch.pop() {
                    on_branch.remove(&node);
                }
                cursors.pop();
                continue;
            }

            cursors[depth] += 1;
            let next = &neighbors[cursor].neighbor;

            if on_branch.contains(next) {
                continue;
            }

            if next == dst {
                let mut nodes = branch.clone();
                nodes.push(next.clone());
                found_paths.push(Path::new(nodes));
                continue;
            }

            on_branch.insert(next.clone());
            branch.push(next.clone());
            cursors.push(0);
        }

        found_paths
    }

    /// Lowest-cost path from `src` to `dst`.
    ///
    /// Among paths of equal cost the first one enumerated wins.
    pub fn find_shortest_path(&self, src: &NodeId, dst: &NodeId) -> Option<Path> {
        let mut best: Option<(Path, f64)> = None;

        for path in self.find_all_paths(src, dst) {
            let cost = self.path_weight(&path);
            match &best {
                Some((_, best_cost)) if cost >= *best_cost => {}
                _ => best = Some((path, cost)),
            }
        }

        match best {
            Some((path, cost)) => {
                log::debug!("Shortest path {} => {}: {:?} (cost {}).", src, dst, path.nodes(), cost);
                Some(path)
            }
            None => {
                log::debug!("NoPathFound: {} => {}", src, dst);
                None
            }
        }
    }

    /// Egress port on `src` towards its neighbor `dst`.
    pub fn get_port(&self, src: &NodeId, dst: &NodeId) -> Option<PortNo> {
        self.graph.edge(src, dst).map(|edge| edge.port)
    }

    /// Preference weight per path: `(1 - cost / total_cost) * 10`.
    ///
    /// If the costs add up to zero every path gets weight zero.
    pub fn calculate_bucket_weight(&self, paths: &[Path]) -> Vec<BucketWeight> {
        let costs: Vec<f64> = paths.iter().map(|path| self.path_weight(path)).collect();
        let total: f64 = costs.iter().sum();

        paths
            .iter()
            .zip(costs)
            .map(|(path, cost)| {
                let weight = if total == 0.0 || !total.is_finite() { 0.0 } else { (1.0 - cost / total) * BUCKET_WEIGHT_SCALE };
                BucketWeight { path: path.clone(), cost, weight }
            })
            .collect()
    }

    /// Union of the shortest paths from `root` to each destination.
    ///
    /// A destination without a path is recorded as unreachable; the others are
    /// still folded into the tree.
    pub fn find_multicast_tree(&self, root: &NodeId, destinations: &[NodeId]) -> MulticastTree {
        let mut tree = MulticastTree::new(root.clone());

        for destination in destinations {
            match self.find_shortest_path(root, destination) {
                Some(path) => tree.add_path(&path),
                None => {
                    log::warn!("Multicast destination {} is unreachable from {}.", destination, root);
                    tree.mark_unreachable(destination.clone());
                }
            }
        }

        tree
    }
}
