// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Call graph (§4.E): reachable `CSMethod`s plus `(kind, CSCallSite) -> CSMethod` edges.
//! Grounded on `graph::call_graph.rs`'s `CallGraph<F, S>`, specialized to `CSMethodId` nodes and
//! `CSCallSiteId`-keyed edges and simplified from a generic dot-formatting trait pair down to a
//! plain `petgraph::dot::Dot` dump, since there is no `AnalysisContext` to format against here.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::dot::Dot;
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};

use crate::manager::{CSCallSiteId, CSMethodId};
use crate::util::chunked_queue::{self, ChunkedQueue};

/// How a call edge was resolved — carried for statistics and for dot-graph labeling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallKind {
    Static,
    Instance,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Static => write!(f, "static"),
            CallKind::Instance => write!(f, "instance"),
        }
    }
}

#[derive(Debug)]
struct CallGraphEdge {
    callsite: CSCallSiteId,
    kind: CallKind,
}

pub struct CallGraph {
    graph: Graph<CSMethodId, CallGraphEdge>,
    nodes: HashMap<CSMethodId, NodeIndex>,
    callsite_edges: HashMap<CSCallSiteId, HashSet<EdgeIndex>>,
    reachable: ChunkedQueue<CSMethodId>,
    reachable_set: HashSet<CSMethodId>,
}

impl Default for CallGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CallGraph {
    pub fn new() -> Self {
        CallGraph {
            graph: Graph::new(),
            nodes: HashMap::new(),
            callsite_edges: HashMap::new(),
            reachable: ChunkedQueue::new(),
            reachable_set: HashSet::new(),
        }
    }

    fn get_or_insert_node(&mut self, method: CSMethodId) -> NodeIndex {
        if let Some(idx) = self.nodes.get(&method) {
            return *idx;
        }
        let idx = self.graph.add_node(method);
        self.nodes.insert(method, idx);
        if self.reachable_set.insert(method) {
            self.reachable.push(method);
        }
        idx
    }

    /// Marks `method` reachable with no incoming call edge (§4.E `addReachableMethod`), used for
    /// analysis entry points. Returns `true` if it was not already reachable.
    pub fn add_entry(&mut self, method: CSMethodId) -> bool {
        let is_new = !self.reachable_set.contains(&method);
        self.get_or_insert_node(method);
        is_new
    }

    pub fn is_reachable(&self, method: CSMethodId) -> bool {
        self.reachable_set.contains(&method)
    }

    pub fn num_reachable(&self) -> usize {
        self.reachable_set.len()
    }

    pub fn reachable_methods(&self) -> chunked_queue::IterCopied<CSMethodId> {
        self.reachable.iter_copied()
    }

    pub fn callees(&self, callsite: CSCallSiteId) -> HashSet<CSMethodId> {
        self.callsite_edges
            .get(&callsite)
            .into_iter()
            .flatten()
            .filter_map(|e| self.graph.edge_endpoints(*e))
            .map(|(_, target)| *self.graph.node_weight(target).expect("node exists"))
            .collect()
    }

    /// Installs a call-graph edge `caller --callsite(kind)--> callee`. Returns `true` if this is
    /// a new edge (§4.G step 4: only new edges trigger reachability propagation).
    pub fn add_edge(
        &mut self,
        callsite: CSCallSiteId,
        kind: CallKind,
        caller: CSMethodId,
        callee: CSMethodId,
    ) -> bool {
        if self.callees(callsite).contains(&callee) {
            return false;
        }
        let caller_node = self.get_or_insert_node(caller);
        let callee_node = self.get_or_insert_node(callee);
        let edge_id = self.graph.add_edge(caller_node, callee_node, CallGraphEdge { callsite, kind });
        self.callsite_edges.entry(callsite).or_default().insert(edge_id);
        true
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn to_dot(&self) -> String {
        format!("{:?}", Dot::with_config(&self.graph, &[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::bit_vec::Idx;

    #[test]
    fn new_edge_marks_callee_reachable_once() {
        let mut cg = CallGraph::new();
        let caller = CSMethodId::new(0);
        let callee = CSMethodId::new(1);
        let cs = CSCallSiteId::new(0);
        assert!(cg.add_edge(cs, CallKind::Static, caller, callee));
        assert!(!cg.add_edge(cs, CallKind::Static, caller, callee));
        assert!(cg.is_reachable(callee));
        assert_eq!(cg.num_reachable(), 2);
    }
}
