// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Taint flow graph (§3, §4.I): auxiliary graph expressing taint-only, type-rewriting transfers
//! between pointer nodes. A TFG edge `s -> t` tagged with a rewrite type fires only for taint
//! CSObjs flowing through `s`; this module is pure bookkeeping (edge storage and lookup), the
//! solver's propagation hook (§4.D, §4.I) does the actual firing since only it has the points-to
//! data and the work list to enqueue onto.

use std::collections::{HashMap, HashSet};

use crate::ir::TypeId;
use crate::manager::PointerId;

pub struct TaintFlowGraph {
    successors: HashMap<PointerId, Vec<(PointerId, TypeId)>>,
    installed: HashSet<(PointerId, PointerId, TypeId)>,
}

impl Default for TaintFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TaintFlowGraph {
    pub fn new() -> Self {
        TaintFlowGraph { successors: HashMap::new(), installed: HashSet::new() }
    }

    /// Installs a transfer edge `src -> dst` rewriting to `rewrite_type`. Returns `true` the
    /// first time this exact `(src, dst, rewrite_type)` triple is installed; the caller (the
    /// taint manager) only re-emits already-present taint objects on that first installation.
    pub fn add_edge(&mut self, src: PointerId, dst: PointerId, rewrite_type: TypeId) -> bool {
        if !self.installed.insert((src, dst, rewrite_type)) {
            return false;
        }
        self.successors.entry(src).or_default().push((dst, rewrite_type));
        true
    }

    /// `TFG[p]` (§4.I propagation hook): every `(target, rewrite-type)` pair registered for `p`.
    pub fn edges_from(&self, src: PointerId) -> &[(PointerId, TypeId)] {
        self.successors.get(&src).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::bit_vec::Idx;

    #[test]
    fn duplicate_edge_installs_once() {
        let mut tfg = TaintFlowGraph::new();
        let s = PointerId::new(0);
        let t = PointerId::new(1);
        let ty = TypeId::new(0);
        assert!(tfg.add_edge(s, t, ty));
        assert!(!tfg.add_edge(s, t, ty));
        assert_eq!(tfg.edges_from(s), &[(t, ty)]);
    }
}
