// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Taint overlay (§4.I): taint is modeled as synthetic heap objects that co-propagate through
//! the ordinary PFG, plus an auxiliary taint flow graph expressing type-rewriting transfers.
//! Grounded on the solver's own delta/work-list discipline (§4.D) — the taint manager never
//! runs its own fixed point, it only produces seed facts the caller enqueues through the same
//! `propagate` path as everything else, which is what gives termination on cyclic TFG paths.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::context::ContextId;
use crate::graph::call_graph::CallGraph;
use crate::ir::{MethodId, TypeId, BASE, RESULT};
use crate::manager::{CSCallSiteId, CSManager, Obj};
use crate::pts_set::points_to::{HybridPointsToSet, PointsToSet};
use crate::worklist::PtData;

pub mod config;

pub use config::TaintConfig;

/// A resolved, per-method set of transfer rules, name-resolved against a `Program` at load time.
#[derive(Default, Clone, Debug)]
struct MethodRules {
    /// Produces a fresh taint object of this type as the call's result, with no input.
    sources: Vec<TypeId>,
    /// `(param_index, rewrite_type)` for args flowing to the result.
    arg_to_result: Vec<(usize, TypeId)>,
    /// `(param_index, rewrite_type)` for args flowing back to the receiver.
    arg_to_base: Vec<(usize, TypeId)>,
    /// Rewrite type for the receiver flowing to the result.
    base_to_result: Vec<TypeId>,
}

/// Name-resolved taint rules plus the sink table, produced once from a `TaintConfig` and a
/// `Program` (§6: external configuration, internal ids).
#[derive(Default)]
pub struct TaintRules {
    methods: HashMap<MethodId, MethodRules>,
    sinks: HashMap<MethodId, HashSet<usize>>,
}

impl TaintRules {
    /// Resolves a logical `TaintConfig` (method/type names) against the program's method and
    /// type tables. Unresolvable names are dropped; this is intentionally lenient (§7: an
    /// absent/partial taint configuration degrades to a smaller no-op overlay, not an error).
    pub fn resolve(config: &TaintConfig, program: &crate::ir::model::Program) -> Self {
        let method_by_name: HashMap<&str, MethodId> =
            program.methods.iter().map(|m| (m.name.as_str(), m.id)).collect();
        let type_by_name: HashMap<&str, TypeId> =
            program.types.iter().map(|t| (t.name.as_str(), t.id)).collect();

        let mut rules = TaintRules::default();
        for s in &config.sources {
            if let (Some(&m), Some(&ty)) = (method_by_name.get(s.method.as_str()), type_by_name.get(s.ty.as_str())) {
                rules.methods.entry(m).or_default().sources.push(ty);
            }
        }
        for s in &config.sinks {
            if let Some(&m) = method_by_name.get(s.method.as_str()) {
                rules.sinks.entry(m).or_default().insert(s.param_index);
            }
        }
        for t in &config.transfers {
            let (Some(&m), Some(&ty)) = (method_by_name.get(t.method.as_str()), type_by_name.get(t.ty.as_str())) else {
                continue;
            };
            let entry = rules.methods.entry(m).or_default();
            match (t.from, t.to) {
                (from, RESULT) if from >= 0 => entry.arg_to_result.push((from as usize, ty)),
                (from, to) if from >= 0 && to == BASE => entry.arg_to_base.push((from as usize, ty)),
                (from, RESULT) if from == BASE => entry.base_to_result.push(ty),
                _ => {}
            }
        }
        rules
    }

    fn of(&self, method: MethodId) -> Option<&MethodRules> {
        self.methods.get(&method)
    }

    pub fn is_sink_param(&self, method: MethodId, param_index: usize) -> bool {
        self.sinks.get(&method).map_or(false, |ps| ps.contains(&param_index))
    }
}

/// `TaintFlow(sourceCallSite, sinkCallSite, sinkParamIndex)` (§4.I), the outbound finding type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct TaintFlow {
    pub source_call: CSCallSiteId,
    pub sink_call: CSCallSiteId,
    pub sink_param: usize,
}

/// Owns the taint flow graph and the call-site argument bindings needed to later collect sinks.
/// The call-edge installer (§4.G, §4.H) drives this through `on_call`; the solver enqueues the
/// seed facts `on_call` returns through the ordinary work list.
pub struct TaintManager {
    rules: TaintRules,
    tfg: crate::graph::tfg::TaintFlowGraph,
    empty_ctx: ContextId,
    call_args: HashMap<CSCallSiteId, Vec<crate::manager::PointerId>>,
}

impl TaintManager {
    pub fn new(rules: TaintRules, empty_ctx: ContextId) -> Self {
        TaintManager {
            rules,
            tfg: crate::graph::tfg::TaintFlowGraph::new(),
            empty_ctx,
            call_args: HashMap::new(),
        }
    }

    /// `taintManager.makeTaint(sourceCall, type) -> Obj`, wrapped as `CSObj(emptyContext, obj)`.
    fn make_taint(&self, manager: &mut CSManager, source_call: CSCallSiteId, ty: TypeId) -> crate::manager::CSObjId {
        manager.get_cs_obj(self.empty_ctx, Obj::Taint { source_call, ty })
    }

    fn singleton(&self, manager: &mut CSManager, source_call: CSCallSiteId, ty: TypeId) -> HybridPointsToSet<crate::manager::CSObjId> {
        let mut set = HybridPointsToSet::new();
        set.insert(self.make_taint(manager, source_call, ty));
        set
    }

    /// Re-emits already-present taint objects in `pt(src)` for a freshly installed TFG edge
    /// `src -> dst` (§4.I: "on first installation").
    fn reemit(
        &self,
        manager: &mut CSManager,
        pt: &PtData,
        src: crate::manager::PointerId,
        dst: crate::manager::PointerId,
        ty: TypeId,
    ) -> Vec<(crate::manager::PointerId, HybridPointsToSet<crate::manager::CSObjId>)> {
        let Some(existing) = pt.pts_of(src) else {
            return Vec::new();
        };
        existing
            .iter()
            .filter_map(|obj| manager.source_call_of(obj))
            .map(|source_call| (dst, self.singleton(manager, source_call, ty)))
            .collect()
    }

    /// Applies the taint hooks at call-edge installation (§4.I). `args`/`result`/`recv` are the
    /// `CSVar` pointer ids for the call's actual arguments, result and receiver (`recv` is
    /// `None` for static calls). Returns the seed `(pointer, delta)` facts the caller must push
    /// through the ordinary work list.
    #[allow(clippy::too_many_arguments)]
    pub fn on_call(
        &mut self,
        manager: &mut CSManager,
        pt: &PtData,
        cs_call_site: CSCallSiteId,
        callee: MethodId,
        args: &[crate::manager::PointerId],
        result: Option<crate::manager::PointerId>,
        recv: Option<crate::manager::PointerId>,
    ) -> Vec<(crate::manager::PointerId, HybridPointsToSet<crate::manager::CSObjId>)> {
        self.call_args.insert(cs_call_site, args.to_vec());
        let Some(rules) = self.rules.of(callee).cloned() else {
            return Vec::new();
        };
        let mut seeds = Vec::new();

        if let Some(result_ptr) = result {
            for ty in &rules.sources {
                seeds.push((result_ptr, self.singleton(manager, cs_call_site, *ty)));
            }
        }

        if let Some(result_ptr) = result {
            for &(i, ty) in &rules.arg_to_result {
                if let Some(&arg_ptr) = args.get(i) {
                    if self.tfg.add_edge(arg_ptr, result_ptr, ty) {
                        seeds.extend(self.reemit(manager, pt, arg_ptr, result_ptr, ty));
                    }
                }
            }
        }

        if let Some(recv_ptr) = recv {
            for &(i, ty) in &rules.arg_to_base {
                if let Some(&arg_ptr) = args.get(i) {
                    if self.tfg.add_edge(arg_ptr, recv_ptr, ty) {
                        seeds.extend(self.reemit(manager, pt, arg_ptr, recv_ptr, ty));
                    }
                }
            }
            if let Some(result_ptr) = result {
                for &ty in &rules.base_to_result {
                    if self.tfg.add_edge(recv_ptr, result_ptr, ty) {
                        seeds.extend(self.reemit(manager, pt, recv_ptr, result_ptr, ty));
                    }
                }
            }
        }

        seeds
    }

    /// Propagation hook (§4.I): called once per newly inserted taint CSObj `o` at pointer `p`
    /// (the solver's `propagate` calls this for every taint object in a non-empty delta).
    pub fn on_taint_propagated(
        &self,
        manager: &mut CSManager,
        p: crate::manager::PointerId,
        o: crate::manager::CSObjId,
    ) -> Vec<(crate::manager::PointerId, HybridPointsToSet<crate::manager::CSObjId>)> {
        let Some(source_call) = manager.source_call_of(o) else {
            return Vec::new();
        };
        self.tfg
            .edges_from(p)
            .iter()
            .map(|&(t, ty)| (t, self.singleton(manager, source_call, ty)))
            .collect()
    }

    /// On solver completion: collect taint flows into every configured sink parameter (§4.I).
    pub fn collect_flows(&self, manager: &CSManager, call_graph: &CallGraph, pt: &PtData) -> Vec<TaintFlow> {
        let mut flows = Vec::new();
        for (&call_site, args) in &self.call_args {
            let callees: Vec<MethodId> = call_graph
                .callees(call_site)
                .into_iter()
                .map(|cs_method| manager.cs_method(cs_method).method)
                .collect();
            for (i, &arg_ptr) in args.iter().enumerate() {
                if !callees.iter().any(|&m| self.rules.is_sink_param(m, i)) {
                    continue;
                }
                let Some(pts) = pt.pts_of(arg_ptr) else { continue };
                for obj in pts.iter() {
                    if let Some(source_call) = manager.source_call_of(obj) {
                        flows.push(TaintFlow { source_call, sink_call: call_site, sink_param: i });
                    }
                }
            }
        }
        flows.sort();
        flows.dedup();
        flows
    }
}
