// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The crate's public outbound result (§6): the final context-sensitive call graph and
//! points-to map, plus the taint subsystem's sorted, deduplicated flow set.

use crate::context::ContextId;
use crate::graph::call_graph::CallGraph;
use crate::manager::{CSManager, CSMethodId, CSObjId, PointerId};
use crate::pts_set::points_to::{HybridPointsToSet, PointsToSet};
use crate::solver::SolveResult;
use crate::taint::TaintFlow;

/// Wraps a completed `SolveResult` behind the query surface callers actually need, without
/// exposing the solver's internal work list or per-method flow cache.
pub struct PointerAnalysisResult {
    manager: CSManager,
    call_graph: CallGraph,
    pt: crate::worklist::PtData,
    taint_flows: Vec<TaintFlow>,
}

impl PointerAnalysisResult {
    pub fn from_solve(result: SolveResult) -> Self {
        let mut taint_flows = result.taint_flows;
        taint_flows.sort();
        taint_flows.dedup();
        PointerAnalysisResult {
            manager: result.manager,
            call_graph: result.call_graph,
            pt: result.pt,
            taint_flows,
        }
    }

    pub fn manager(&self) -> &CSManager {
        &self.manager
    }

    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    pub fn taint_flows(&self) -> &[TaintFlow] {
        &self.taint_flows
    }

    /// `pt(CSVar(ctx, var))`, the points-to set the test suite and §8's invariants are stated
    /// against. Empty for any pointer never reached.
    pub fn points_to_var(&self, ctx: ContextId, var: crate::ir::VarId) -> HybridPointsToSet<CSObjId> {
        match self.manager.find_cs_var(ctx, var) {
            Some(p) => self.points_to(p),
            None => HybridPointsToSet::new(),
        }
    }

    pub fn points_to(&self, p: PointerId) -> HybridPointsToSet<CSObjId> {
        self.pt.pts_of(p).cloned().unwrap_or_else(HybridPointsToSet::new)
    }

    pub fn is_reachable(&self, method: CSMethodId) -> bool {
        self.call_graph.is_reachable(method)
    }
}
