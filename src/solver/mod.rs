// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The solver (§4.H): owns every mutable piece of analysis state and drains the work list to a
//! fixed point. `andersen` wires up the context-insensitive convenience entry point; everything
//! else here is shared by both the context-insensitive and context-sensitive configurations,
//! which differ only in which `ContextSelector` is plugged in.

pub mod andersen;
pub mod context_sensitive;

use crate::builder::MethodFlowCache;
use crate::context::selector::ContextSelector;
use crate::graph::call_graph::CallGraph;
use crate::graph::pfg::PointerFlowGraph;
use crate::ir::model::Program;
use crate::manager::{CSManager, ContextInterner};
use crate::taint::{TaintManager, TaintRules};
use crate::util::chunked_queue;
use crate::util::pta_statistics::PtaStatistics;
use crate::worklist::{PtData, WorkList};

/// Everything the fixed point needs, bundled so `context_sensitive`'s free functions don't have
/// to thread a dozen separate `&mut` parameters through the module boundary.
pub struct Solver<'p> {
    pub program: &'p Program,
    pub manager: CSManager,
    pub ctx_cache: ContextInterner,
    pub selector: Box<dyn ContextSelector>,
    pub pfg: PointerFlowGraph,
    pub call_graph: CallGraph,
    pub flows: MethodFlowCache,
    pub taint: TaintManager,
    pub pt: PtData,
    pub work_list: WorkList,
    reachable_cursor: chunked_queue::IterCopied<crate::manager::CSMethodId>,
}

/// Outcome of a completed solve: everything `result::PointerAnalysisResult` is built from.
pub struct SolveResult {
    pub manager: CSManager,
    pub pfg: PointerFlowGraph,
    pub call_graph: CallGraph,
    pub pt: PtData,
    pub taint_flows: Vec<crate::taint::TaintFlow>,
    pub stats: PtaStatistics,
}

impl<'p> Solver<'p> {
    pub fn new(program: &'p Program, selector: Box<dyn ContextSelector>, rules: TaintRules) -> Self {
        let mut ctx_cache = ContextInterner::default();
        let empty = ctx_cache.intern(&selector.empty_context());
        let call_graph = CallGraph::new();
        let reachable_cursor = call_graph.reachable_methods();
        Solver {
            program,
            manager: CSManager::new(),
            ctx_cache,
            selector,
            pfg: PointerFlowGraph::new(),
            call_graph,
            flows: MethodFlowCache::new(),
            taint: TaintManager::new(rules, empty),
            pt: PtData::new(),
            work_list: WorkList::new(),
            reachable_cursor,
        }
    }

    /// Runs the analysis to completion: seeds every entry point, then drains the reachable-method
    /// queue and the work list until both are empty (§4.H).
    pub fn solve(mut self) -> SolveResult {
        context_sensitive::seed_entry_points(&mut self);
        context_sensitive::drain(&mut self);
        let taint_flows = self.taint.collect_flows(&self.manager, &self.call_graph, &self.pt);
        let stats = PtaStatistics::collect(&self.manager, &self.pfg, &self.call_graph, &self.pt);
        SolveResult {
            manager: self.manager,
            pfg: self.pfg,
            call_graph: self.call_graph,
            pt: self.pt,
            taint_flows,
            stats,
        }
    }
}
