// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! External collaborator interfaces (§6): the intermediate representation, class hierarchy
//! resolution and heap abstraction that the solver consumes but never constructs itself.
//!
//! The core only ever asks "what shape is this statement" and "what can this call site reach";
//! it never builds, type-checks or lowers a program. `ir::model` is a minimal concrete program
//! representation that answers those questions, used by the CLI and by the test suite in place
//! of a real frontend.

pub mod loader;
pub mod model;

use crate::util::bit_vec::Idx;
use std::fmt;

macro_rules! dense_id {
    ($name:ident) => {
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl Idx for $name {
            #[inline]
            fn new(idx: usize) -> Self {
                $name(idx as u32)
            }
            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

dense_id!(MethodId);
dense_id!(VarId);
dense_id!(FieldId);
dense_id!(TypeId);
dense_id!(StmtId);
/// Identifies an allocation site one-for-one with the `Stmt::Alloc` that produced it; the heap
/// model pairs this with a heap context to obtain a `CSObj` (see `manager`).
dense_id!(ObjId);

/// The distinguished parameter/result positions used by taint transfer configuration (§6).
pub const BASE: i32 = -1;
pub const RESULT: i32 = -2;

/// Binary arithmetic operator carried by `Stmt::BinOp`. `Div`/`Rem` are singled out by
/// `Stmt::has_no_side_effect` (§4.J): both can trap on a zero divisor, so an assignment computing
/// one is never pruned as dead just because its result goes unused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    fn has_side_effect(self) -> bool {
        matches!(self, BinOp::Div | BinOp::Rem)
    }
}

/// A single statement, classified by shape per §4.G. Statements within a method are unordered
/// for PFG construction (no flow sensitivity) but retain a stable index for the dead-code
/// detector and for allocation-site/call-site identity.
#[derive(Clone, Debug)]
pub enum Stmt {
    /// `x = new T()`
    Alloc { lhs: VarId, obj_type: TypeId },
    /// `x = y`
    Copy { lhs: VarId, rhs: VarId },
    /// `x = <int literal>` — the only constant-valued assignment this IR carries; the sole
    /// source a constant-propagation pass ever has to propagate from.
    ConstAssign { lhs: VarId, value: i64 },
    /// `x = left <op> right` — arithmetic only; no pointer-analysis effect, visited for constant
    /// propagation and the dead-code detector.
    BinOp { lhs: VarId, op: BinOp, left: VarId, right: VarId },
    /// `T.f = y`
    StaticStore { field: FieldId, rhs: VarId },
    /// `x = T.f`
    StaticLoad { lhs: VarId, field: FieldId },
    /// `base.f = y`
    InstanceStore { base: VarId, field: FieldId, rhs: VarId },
    /// `x = base.f`
    InstanceLoad { lhs: VarId, base: VarId, field: FieldId },
    /// `base[_] = y`
    ArrayStore { base: VarId, rhs: VarId },
    /// `x = base[_]`
    ArrayLoad { lhs: VarId, base: VarId },
    /// `[r =] T.m(a1..an)` — no receiver.
    StaticCall {
        callee: MethodId,
        args: Vec<VarId>,
        result: Option<VarId>,
    },
    /// `[r =] recv.m(a1..an)` — virtual/instance dispatch on `recv`. `method_name` is resolved
    /// against the receiver's dynamic type by the class hierarchy collaborator.
    InstanceCall {
        recv: VarId,
        method_name: String,
        args: Vec<VarId>,
        result: Option<VarId>,
    },
    /// A statement with no pointer-analysis effect (e.g. `x = x + 1`); still visited for the
    /// dead-code detector and its liveness/constant-propagation companions.
    Nop,
    /// `if (cond) goto t else goto f` — control-flow only, consumed by the dead-code detector.
    If { cond: VarId, then_succ: usize, else_succ: usize },
    /// `goto target` — unconditional jump, the only way a branch arm rejoins a successor other
    /// than the next statement in sequence.
    Goto { target: usize },
    /// `switch (v) { case k => target, ..., default => d }`
    Switch { var: VarId, cases: Vec<(i64, usize)>, default: usize },
    /// `return [v]`
    Return { value: Option<VarId> },
}

impl Stmt {
    /// §4.J `hasNoSideEffect`: side-effect-free iff it is a plain local computation. The dead
    /// code detector only ever asks this about the right-hand side of a non-call assignment; for
    /// statement kinds that are never used as a dataflow rhs (`Alloc` included per §4.J,
    /// `If`/`Switch`/`Return`) the answer would be moot, so only the cases the detector can
    /// actually see are meaningful here.
    pub fn has_no_side_effect(&self) -> bool {
        match self {
            Stmt::Alloc { .. } => false,
            Stmt::InstanceLoad { .. } | Stmt::ArrayLoad { .. } => false,
            Stmt::StaticLoad { .. } => false,
            Stmt::BinOp { op, .. } => !op.has_side_effect(),
            Stmt::Copy { .. } => true,
            _ => true,
        }
    }

    /// The variable assigned by this statement, if any — used by liveness/dead-code analysis.
    pub fn lhs(&self) -> Option<VarId> {
        match self {
            Stmt::Alloc { lhs, .. }
            | Stmt::Copy { lhs, .. }
            | Stmt::ConstAssign { lhs, .. }
            | Stmt::BinOp { lhs, .. }
            | Stmt::StaticLoad { lhs, .. }
            | Stmt::InstanceLoad { lhs, .. }
            | Stmt::ArrayLoad { lhs, .. } => Some(*lhs),
            Stmt::StaticCall { result, .. } | Stmt::InstanceCall { result, .. } => *result,
            _ => None,
        }
    }

    /// The variables read by this statement — used by liveness and constant propagation.
    pub fn uses(&self) -> Vec<VarId> {
        match self {
            Stmt::Copy { rhs, .. } => vec![*rhs],
            Stmt::BinOp { left, right, .. } => vec![*left, *right],
            Stmt::StaticStore { rhs, .. } => vec![*rhs],
            Stmt::InstanceStore { base, rhs, .. } => vec![*base, *rhs],
            Stmt::InstanceLoad { base, .. } => vec![*base],
            Stmt::ArrayStore { base, rhs } => vec![*base, *rhs],
            Stmt::ArrayLoad { base, .. } => vec![*base],
            Stmt::StaticCall { args, .. } => args.clone(),
            Stmt::InstanceCall { recv, args, .. } => {
                let mut v = vec![*recv];
                v.extend(args.iter().copied());
                v
            }
            Stmt::If { cond, .. } => vec![*cond],
            Stmt::Switch { var, .. } => vec![*var],
            Stmt::Return { value } => value.iter().copied().collect(),
            Stmt::Alloc { .. } | Stmt::ConstAssign { .. } | Stmt::StaticLoad { .. } | Stmt::Nop => Vec::new(),
        }
    }

    /// CFG successors of this statement within its method, by statement index. Non-branching
    /// statements fall through to the next index; `Return` has none.
    pub fn successors(&self, here: usize, method_len: usize) -> Vec<usize> {
        match self {
            Stmt::If { then_succ, else_succ, .. } => vec![*then_succ, *else_succ],
            Stmt::Switch { cases, default, .. } => {
                let mut succs: Vec<usize> = cases.iter().map(|(_, t)| *t).collect();
                succs.push(*default);
                succs
            }
            Stmt::Return { .. } => Vec::new(),
            Stmt::Goto { target } => vec![*target],
            _ => {
                if here + 1 < method_len {
                    vec![here + 1]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

/// A method in the analyzed program (§6 IR accessors).
#[derive(Clone, Debug)]
pub struct Method {
    pub id: MethodId,
    pub name: String,
    /// Present for instance methods; absent for static methods.
    pub this_var: Option<VarId>,
    pub params: Vec<VarId>,
    pub return_var: Option<VarId>,
    pub stmts: Vec<Stmt>,
    pub declaring_type: TypeId,
}

/// A class/interface type. Carries its declared (virtual) methods for dispatch resolution; the
/// class hierarchy external collaborator (§6) walks `subtypes`/`implementors` relationships
/// built from these at program-construction time.
#[derive(Clone, Debug)]
pub struct Type {
    pub id: TypeId,
    pub name: String,
}

/// `classHierarchy.resolveCallee(receiverType | none, callSite) → Method` (§6).
pub trait ClassHierarchy {
    fn resolve_static(&self, callee: MethodId) -> MethodId {
        callee
    }
    /// Resolves a virtual call against the dynamic type of the receiver. Returns `None` for an
    /// unresolvable callee (§7): the core treats this as "no edge installed", never an error.
    fn resolve_virtual(&self, recv_type: TypeId, call: &Stmt) -> Option<MethodId>;
}

/// `heapModel.getObj(allocStmt) → Obj` (§6). Ordinary objects are one per allocation site; the
/// heap context (chosen by the context selector) is what then distinguishes multiple abstract
/// instances of the same site.
pub trait HeapModel {
    fn obj(&self, method: MethodId, stmt_index: usize) -> ObjId;
    fn type_of(&self, obj: ObjId) -> TypeId;
}
