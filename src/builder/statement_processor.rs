// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Installs the context-sensitive constraints a newly reachable method or a newly resolved call
//! edge contributes (§4.G). Free functions rather than a struct with its own fields: every piece
//! of state here (the manager, the PFG, the call graph, the taint overlay...) is owned by the
//! solver, which is the only thing that ever needs all of them live at once.

use crate::context::selector::ContextSelector;
use crate::context::ContextId;
use crate::graph::call_graph::{CallGraph, CallKind};
use crate::graph::pfg::PointerFlowGraph;
use crate::ir::model::Program;
use crate::ir::{ClassHierarchy, HeapModel, MethodId};
use crate::manager::{CSManager, CSMethodId, ContextInterner, Obj, PointerId};
use crate::pts_set::points_to::{HybridPointsToSet, PointsToSet};
use crate::taint::TaintManager;
use crate::worklist::PtData;

use super::MethodFlowCache;

/// Seed facts produced by installing constraints: pushed onto the work list as-is by the caller.
pub type Seeds = Vec<(PointerId, HybridPointsToSet<crate::manager::CSObjId>)>;

/// `this_of(m)`/param/return pointer ids for a `CSMethod`, used uniformly by reachability
/// processing and by call-edge installation.
pub fn cs_var(manager: &mut CSManager, ctx: ContextId, var: crate::ir::VarId) -> PointerId {
    manager.get_cs_var(ctx, var)
}

/// Installs PFG edge `src -> dst` and, per the edge-installation-coupling invariant (§3), seeds
/// `dst` with whatever is already in `pt(src)` when the edge is new and `pt(src)` non-empty.
pub fn install_pfg_edge(
    pfg: &mut PointerFlowGraph,
    pt: &PtData,
    src: PointerId,
    dst: PointerId,
) -> Option<(PointerId, HybridPointsToSet<crate::manager::CSObjId>)> {
    if !pfg.add_edge(src, dst) {
        return None;
    }
    pt.pts_of(src).filter(|s| !s.is_empty()).map(|s| (dst, s.clone()))
}

/// §4.G: invoked once per newly reachable `CSMethod`. Installs allocation seeds, copy/static
/// field PFG edges and recurses into static call edges. Instance field/array accesses and
/// virtual calls are intentionally not handled here — they depend on the receiver's points-to
/// set and only fire inside the delta loop (§4.H).
#[allow(clippy::too_many_arguments)]
pub fn process_reachable(
    program: &Program,
    manager: &mut CSManager,
    ctx_cache: &mut ContextInterner,
    selector: &dyn ContextSelector,
    pfg: &mut PointerFlowGraph,
    call_graph: &mut CallGraph,
    flows: &mut MethodFlowCache,
    taint: &mut TaintManager,
    pt: &PtData,
    cs_method: CSMethodId,
) -> Seeds {
    let key = manager.cs_method(cs_method);
    let method_flow = flows.get_or_build(program, key.method);
    let mut seeds = Seeds::new();

    for &(lhs, obj_type, stmt_index) in &method_flow.allocs {
        let obj = program.obj(key.method, stmt_index);
        debug_assert_eq!(program.type_of(obj), obj_type);
        let method_ctx = ctx_cache.get(key.ctx);
        let heap_ctx = selector.select_heap_context(&method_ctx, obj);
        let heap_ctx_id = ctx_cache.intern(&heap_ctx);
        let cs_obj = manager.get_cs_obj(heap_ctx_id, Obj::Ordinary(obj));
        let lhs_ptr = cs_var(manager, key.ctx, lhs);
        let mut set = HybridPointsToSet::new();
        set.insert(cs_obj);
        seeds.push((lhs_ptr, set));
    }

    for &(lhs, rhs) in &method_flow.copies {
        let (rhs_ptr, lhs_ptr) = (cs_var(manager, key.ctx, rhs), cs_var(manager, key.ctx, lhs));
        seeds.extend(install_pfg_edge(pfg, pt, rhs_ptr, lhs_ptr));
    }

    for &(field, rhs) in &method_flow.static_stores {
        let field_ptr = manager.get_static_field(field);
        let rhs_ptr = cs_var(manager, key.ctx, rhs);
        seeds.extend(install_pfg_edge(pfg, pt, rhs_ptr, field_ptr));
    }

    for &(lhs, field) in &method_flow.static_loads {
        let field_ptr = manager.get_static_field(field);
        let lhs_ptr = cs_var(manager, key.ctx, lhs);
        seeds.extend(install_pfg_edge(pfg, pt, field_ptr, lhs_ptr));
    }

    for &stmt_index in &method_flow.static_calls {
        let stmt = &program.method(key.method).stmts[stmt_index];
        let crate::ir::Stmt::StaticCall { callee, args, result } = stmt else {
            unreachable!("static_calls only ever indexes Stmt::StaticCall");
        };
        let resolved = program.resolve_static(*callee);
        let method_ctx = ctx_cache.get(key.ctx);
        let callee_ctx = selector.select_context(&method_ctx, key.method, stmt_index, resolved);
        let callee_ctx_id = ctx_cache.intern(&callee_ctx);
        let cs_call_site = manager.get_cs_call_site(key.ctx, key.method, stmt_index);
        let arg_ptrs: Vec<PointerId> =
            args.iter().map(|&a| cs_var(manager, key.ctx, a)).collect();
        let result_ptr = result.map(|r| cs_var(manager, key.ctx, r));
        seeds.extend(install_call_edge(
            program, manager, pfg, call_graph, taint, pt, cs_call_site, CallKind::Static,
            key.ctx, resolved, callee_ctx_id, &arg_ptrs, result_ptr, None,
        ));
    }

    seeds
}

/// Installs (or idempotently re-confirms) a call-graph edge and, the first time it is new,
/// installs parameter/return PFG edges and applies the taint hooks (§4.G step, §4.H
/// `processCall` step 4). Shared by static-call processing above and virtual-call processing in
/// the solver's delta loop.
#[allow(clippy::too_many_arguments)]
pub fn install_call_edge(
    program: &Program,
    manager: &mut CSManager,
    pfg: &mut PointerFlowGraph,
    call_graph: &mut CallGraph,
    taint: &mut TaintManager,
    pt: &PtData,
    cs_call_site: crate::manager::CSCallSiteId,
    kind: CallKind,
    caller_ctx: ContextId,
    callee: MethodId,
    callee_ctx: ContextId,
    arg_ptrs: &[PointerId],
    result_ptr: Option<PointerId>,
    recv_ptr: Option<PointerId>,
) -> Seeds {
    let caller_method = manager.cs_call_site(cs_call_site).method;
    let cs_caller = manager.get_cs_method(caller_ctx, caller_method);
    let cs_callee = manager.get_cs_method(callee_ctx, callee);

    let mut seeds = Seeds::new();
    let is_new = call_graph.add_edge(cs_call_site, kind, cs_caller, cs_callee);
    if is_new {
        let callee_method = program.method(callee);
        for (i, &param) in callee_method.params.iter().enumerate() {
            if let Some(&arg_ptr) = arg_ptrs.get(i) {
                let param_ptr = cs_var(manager, callee_ctx, param);
                seeds.extend(install_pfg_edge(pfg, pt, arg_ptr, param_ptr));
            }
        }
        if let (Some(ret_var), Some(result_ptr)) = (callee_method.return_var, result_ptr) {
            let ret_ptr = cs_var(manager, callee_ctx, ret_var);
            seeds.extend(install_pfg_edge(pfg, pt, ret_ptr, result_ptr));
        }
        seeds.extend(taint.on_call(manager, pt, cs_call_site, callee, arg_ptrs, result_ptr, recv_ptr));
    }
    seeds
}
