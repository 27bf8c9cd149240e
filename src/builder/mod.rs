// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Per-method statement shape cache (§4.G) and the reachable-method initializer that consumes
//! it. Grounded on `graph::func_pag.rs`'s `FuncPAG`: that struct pre-scans a function's body
//! once into buckets the propagator revisits on every later reachability; `MethodFlow` plays the
//! same role here, generalized from MIR-specific edge kinds to this crate's `Stmt` shapes and
//! keyed by plain variable rather than `Path`.

pub mod statement_processor;

use std::collections::HashMap;

use crate::ir::model::Program;
use crate::ir::{FieldId, MethodId, TypeId, VarId};

/// Statements pre-classified by shape, scanned once per method and reused across every context
/// the method is later analyzed under (§4.G: "invoked once per newly reachable CSMethod", but
/// the *shape* of a method's body never depends on context, only the scan result does).
#[derive(Default, Debug)]
pub struct MethodFlow {
    pub allocs: Vec<(VarId, TypeId, usize)>,
    pub copies: Vec<(VarId, VarId)>,
    pub static_loads: Vec<(VarId, FieldId)>,
    pub static_stores: Vec<(FieldId, VarId)>,
    /// base var -> `(field, dst)` for each `dst = base.field`.
    pub instance_loads: HashMap<VarId, Vec<(FieldId, VarId)>>,
    /// base var -> `(field, src)` for each `base.field = src`.
    pub instance_stores: HashMap<VarId, Vec<(FieldId, VarId)>>,
    /// base var -> dst for each `dst = base[_]`.
    pub array_loads: HashMap<VarId, Vec<VarId>>,
    /// base var -> src for each `base[_] = src`.
    pub array_stores: HashMap<VarId, Vec<VarId>>,
    /// Statement indices of `Stmt::StaticCall`.
    pub static_calls: Vec<usize>,
    /// recv var -> statement indices of `Stmt::InstanceCall` on that receiver.
    pub instance_calls: HashMap<VarId, Vec<usize>>,
}

impl MethodFlow {
    pub fn build(method: &crate::ir::Method) -> Self {
        let mut flow = MethodFlow::default();
        for (index, stmt) in method.stmts.iter().enumerate() {
            use crate::ir::Stmt::*;
            match stmt {
                Alloc { lhs, obj_type } => flow.allocs.push((*lhs, *obj_type, index)),
                Copy { lhs, rhs } => flow.copies.push((*lhs, *rhs)),
                StaticLoad { lhs, field } => flow.static_loads.push((*lhs, *field)),
                StaticStore { field, rhs } => flow.static_stores.push((*field, *rhs)),
                InstanceLoad { lhs, base, field } => {
                    flow.instance_loads.entry(*base).or_default().push((*field, *lhs));
                }
                InstanceStore { base, field, rhs } => {
                    flow.instance_stores.entry(*base).or_default().push((*field, *rhs));
                }
                ArrayLoad { lhs, base } => flow.array_loads.entry(*base).or_default().push(*lhs),
                ArrayStore { base, rhs } => flow.array_stores.entry(*base).or_default().push(*rhs),
                StaticCall { .. } => flow.static_calls.push(index),
                InstanceCall { recv, .. } => flow.instance_calls.entry(*recv).or_default().push(index),
                ConstAssign { .. } | BinOp { .. } | Nop | If { .. } | Switch { .. } | Goto { .. } | Return { .. } => {}
            }
        }
        flow
    }
}

/// Caches one `MethodFlow` per `MethodId`, built lazily the first time any context of that
/// method is processed.
#[derive(Default)]
pub struct MethodFlowCache {
    flows: HashMap<MethodId, std::rc::Rc<MethodFlow>>,
}

impl MethodFlowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, program: &Program, method: MethodId) -> std::rc::Rc<MethodFlow> {
        self.flows
            .entry(method)
            .or_insert_with(|| std::rc::Rc::new(MethodFlow::build(program.method(method))))
            .clone()
    }
}
