// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Pointer flow graph (§4.C): a directed graph over interned `PointerId` nodes; an edge means
//! "points-to information flows from source to target". Edges are unlabeled and deduplicated.
//! Grounded on `graph::pag.rs`'s node/edge bookkeeping, simplified: this crate's edges carry no
//! statement-kind payload since every kind of statement (copy, load, store, parameter passing,
//! return) reduces to the same PFG edge shape once the statement processor installs it.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{Graph, NodeIndex};
use petgraph::Direction;

use crate::manager::PointerId;
use crate::util::bit_vec::Idx;

pub struct PointerFlowGraph {
    graph: Graph<PointerId, ()>,
    nodes: HashMap<PointerId, NodeIndex>,
    edges: HashSet<(PointerId, PointerId)>,
}

impl Default for PointerFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerFlowGraph {
    pub fn new() -> Self {
        PointerFlowGraph {
            graph: Graph::new(),
            nodes: HashMap::new(),
            edges: HashSet::new(),
        }
    }

    fn get_or_insert_node(&mut self, pointer: PointerId) -> NodeIndex {
        if let Some(idx) = self.nodes.get(&pointer) {
            return *idx;
        }
        let idx = self.graph.add_node(pointer);
        self.nodes.insert(pointer, idx);
        idx
    }

    /// Installs an edge `src -> dst` if one is not already present (§4.C: edges deduplicated).
    /// Returns `true` if a new edge was added.
    pub fn add_edge(&mut self, src: PointerId, dst: PointerId) -> bool {
        if src == dst || !self.edges.insert((src, dst)) {
            return false;
        }
        let src_node = self.get_or_insert_node(src);
        let dst_node = self.get_or_insert_node(dst);
        self.graph.add_edge(src_node, dst_node, ());
        true
    }

    pub fn has_edge(&self, src: PointerId, dst: PointerId) -> bool {
        self.edges.contains(&(src, dst))
    }

    /// Every pointer node `dst` has an installed edge `src -> dst`, i.e. every successor of
    /// `src` in the flow graph (§4.D: propagation fans out along these).
    pub fn successors(&self, src: PointerId) -> Vec<PointerId> {
        match self.nodes.get(&src) {
            None => Vec::new(),
            Some(&node) => self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .map(|n| *self.graph.node_weight(n).expect("node weight always present"))
                .collect(),
        }
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_pointers(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_edges_and_ignores_self_loops() {
        let mut pfg = PointerFlowGraph::new();
        let a = PointerId::new(0);
        let b = PointerId::new(1);
        assert!(pfg.add_edge(a, b));
        assert!(!pfg.add_edge(a, b));
        assert!(!pfg.add_edge(a, a));
        assert_eq!(pfg.successors(a), vec![b]);
        assert_eq!(pfg.num_edges(), 1);
    }
}
