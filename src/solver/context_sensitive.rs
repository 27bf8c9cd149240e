// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The fixed-point loop itself (§4.H). Free functions operating on `&mut Solver` rather than
//! inherent methods, so the module can be read top-to-bottom as the pseudocode it implements.

use crate::builder::statement_processor::{self, install_pfg_edge};
use crate::context::ContextId;
use crate::graph::call_graph::CallKind;
use crate::ir::{ClassHierarchy, HeapModel, Stmt, VarId};
use crate::manager::{CSObjId, Obj, Pointer, PointerId};
use crate::pts_set::points_to::{HybridPointsToSet, PointsToSet};

use super::Solver;

/// Marks every entry point reachable in the empty context (§7: the core has no notion of "main"
/// beyond whatever the program marks as an entry point).
pub fn seed_entry_points(solver: &mut Solver) {
    let empty = solver.ctx_cache.intern(&solver.selector.empty_context());
    for &entry in &solver.program.entry_points {
        let cs_entry = solver.manager.get_cs_method(empty, entry);
        solver.call_graph.add_entry(cs_entry);
    }
}

/// Drains the reachable-method queue and the work list to a fixed point (§4.H). The two
/// interleave: processing a newly reachable method can enqueue work-list entries, and draining a
/// work-list entry can install new call edges that make more methods reachable.
pub fn drain(solver: &mut Solver) {
    loop {
        let mut progressed = false;

        while let Some(cs_method) = solver.reachable_cursor.next() {
            progressed = true;
            let seeds = statement_processor::process_reachable(
                solver.program,
                &mut solver.manager,
                &mut solver.ctx_cache,
                solver.selector.as_ref(),
                &mut solver.pfg,
                &mut solver.call_graph,
                &mut solver.flows,
                &mut solver.taint,
                &solver.pt,
                cs_method,
            );
            for (p, delta) in seeds {
                let d = solver.pt.strict_delta(p, &delta);
                solver.work_list.push(p, d);
            }
        }

        if let Some((p, pts)) = solver.work_list.pop() {
            progressed = true;
            propagate(solver, p, &pts);
        }

        if !progressed {
            break;
        }
    }
}

/// `propagate(p, pts)` (§4.H): computes the strict delta, merges it into `pt(p)`, fans out along
/// PFG successors, and for `CSVar` pointers drives field/array/call installation and the taint
/// propagation hook per newly-inserted object.
fn propagate(solver: &mut Solver, p: PointerId, pts: &HybridPointsToSet<CSObjId>) {
    let delta = solver.pt.strict_delta(p, pts);
    if delta.is_empty() {
        return;
    }
    solver.pt.merge(p, &delta);

    for succ in solver.pfg.successors(p) {
        solver.work_list.push(succ, delta.clone());
    }

    if let Pointer::CSVar(ctx, var) = solver.manager.pointer(p) {
        let objs: Vec<CSObjId> = delta.iter().collect();
        for obj in objs {
            process_var_obj(solver, ctx, var, obj);
        }
    }
}

/// One newly-inserted `(ctx, var) -> obj` points-to fact: installs the instance field/array
/// edges and resolves the instance calls syntactically present on `var`, then fires the taint
/// propagation hook if `obj` is a taint object (§4.H, §4.I).
fn process_var_obj(solver: &mut Solver, ctx: ContextId, var: VarId, obj: CSObjId) {
    let method = solver.program.method_of_var(var);
    let flow = solver.flows.get_or_build(solver.program, method);

    if let Some(stores) = flow.instance_stores.get(&var).cloned() {
        for (field, rhs) in stores {
            let field_ptr = solver.manager.get_instance_field(obj, field);
            let rhs_ptr = solver.manager.get_cs_var(ctx, rhs);
            if let Some((p, d)) = install_pfg_edge(&mut solver.pfg, &solver.pt, rhs_ptr, field_ptr) {
                let delta = solver.pt.strict_delta(p, &d);
                solver.work_list.push(p, delta);
            }
        }
    }
    if let Some(loads) = flow.instance_loads.get(&var).cloned() {
        for (field, lhs) in loads {
            let field_ptr = solver.manager.get_instance_field(obj, field);
            let lhs_ptr = solver.manager.get_cs_var(ctx, lhs);
            if let Some((p, d)) = install_pfg_edge(&mut solver.pfg, &solver.pt, field_ptr, lhs_ptr) {
                let delta = solver.pt.strict_delta(p, &d);
                solver.work_list.push(p, delta);
            }
        }
    }
    if let Some(stores) = flow.array_stores.get(&var).cloned() {
        let index_ptr = solver.manager.get_array_index(obj);
        for rhs in stores {
            let rhs_ptr = solver.manager.get_cs_var(ctx, rhs);
            if let Some((p, d)) = install_pfg_edge(&mut solver.pfg, &solver.pt, rhs_ptr, index_ptr) {
                let delta = solver.pt.strict_delta(p, &d);
                solver.work_list.push(p, delta);
            }
        }
    }
    if let Some(loads) = flow.array_loads.get(&var).cloned() {
        let index_ptr = solver.manager.get_array_index(obj);
        for lhs in loads {
            let lhs_ptr = solver.manager.get_cs_var(ctx, lhs);
            if let Some((p, d)) = install_pfg_edge(&mut solver.pfg, &solver.pt, index_ptr, lhs_ptr) {
                let delta = solver.pt.strict_delta(p, &d);
                solver.work_list.push(p, delta);
            }
        }
    }

    if let Some(call_sites) = flow.instance_calls.get(&var).cloned() {
        for stmt_index in call_sites {
            process_call(solver, ctx, method, stmt_index, var, obj);
        }
    }

    if solver.manager.is_taint(obj) {
        let p = solver.manager.get_cs_var(ctx, var);
        let seeds = solver.taint.on_taint_propagated(&mut solver.manager, p, obj);
        for (pp, d) in seeds {
            let delta = solver.pt.strict_delta(pp, &d);
            solver.work_list.push(pp, delta);
        }
    }
}

/// `processCall(recv_node, recvCSObj)` (§4.H): resolves the virtual callee, selects its context,
/// binds `this`, and installs the call edge (possibly recursing into reachability via the
/// call-graph's reachable queue, drained by the caller of `drain`).
fn process_call(solver: &mut Solver, ctx: ContextId, caller_method: crate::ir::MethodId, stmt_index: usize, recv_var: VarId, recv_obj: CSObjId) {
    let stmt = &solver.program.method(caller_method).stmts[stmt_index];
    let Stmt::InstanceCall { args, result, .. } = stmt.clone() else {
        unreachable!("instance_calls only ever indexes Stmt::InstanceCall");
    };

    let recv_obj_key = solver.manager.cs_obj(recv_obj);
    let recv_type = solver.manager.obj_type(recv_obj, solver.program);
    let Some(callee) = solver.program.resolve_virtual(recv_type, stmt) else {
        return;
    };

    let caller_ctx = solver.ctx_cache.get(ctx);
    let callee_ctx = solver.selector.select_instance_context(
        &caller_ctx,
        caller_method,
        stmt_index,
        match recv_obj_key.obj {
            Obj::Ordinary(o) => o,
            Obj::Taint { .. } => {
                // A taint object can never legitimately flow into a receiver position; the
                // resolved call's dispatch type still came from `recv_type` above, so simply
                // fall back to the call's own context rather than fabricating an allocation site.
                return;
            }
        },
        callee,
    );
    let callee_ctx_id = solver.ctx_cache.intern(&callee_ctx);

    let cs_call_site = solver.manager.get_cs_call_site(ctx, caller_method, stmt_index);
    let recv_ptr = solver.manager.get_cs_var(ctx, recv_var);
    let arg_ptrs: Vec<PointerId> = args.iter().map(|&a| solver.manager.get_cs_var(ctx, a)).collect();
    let result_ptr = result.map(|r| solver.manager.get_cs_var(ctx, r));

    let this_var = solver.program.method(callee).this_var;
    if let Some(this_var) = this_var {
        let this_ptr = solver.manager.get_cs_var(callee_ctx_id, this_var);
        let mut singleton = HybridPointsToSet::new();
        singleton.insert(recv_obj);
        let d = solver.pt.strict_delta(this_ptr, &singleton);
        solver.work_list.push(this_ptr, d);
    }

    let seeds = statement_processor::install_call_edge(
        solver.program,
        &mut solver.manager,
        &mut solver.pfg,
        &mut solver.call_graph,
        &mut solver.taint,
        &solver.pt,
        cs_call_site,
        CallKind::Instance,
        ctx,
        callee,
        callee_ctx_id,
        &arg_ptrs,
        result_ptr,
        Some(recv_ptr),
    );
    for (p, d) in seeds {
        let delta = solver.pt.strict_delta(p, &d);
        solver.work_list.push(p, delta);
    }
}
