// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Forward worklist constant propagation (§4.J.1): a standard three-point lattice over a
//! method's CFG, supplied as the default in-fact provider for the dead-code detector.

use std::collections::{HashMap, VecDeque};

use crate::ir::{Method, VarId};

/// `Top` (unconstrained/unreached), `Const(v)` (exactly one known value reaches here), `Bottom`
/// (two or more distinct values reach here, or the value is not statically known).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstLattice {
    Top,
    Const(i64),
    Bottom,
}

impl ConstLattice {
    fn meet(self, other: ConstLattice) -> ConstLattice {
        match (self, other) {
            (ConstLattice::Top, x) | (x, ConstLattice::Top) => x,
            (ConstLattice::Bottom, _) | (_, ConstLattice::Bottom) => ConstLattice::Bottom,
            (ConstLattice::Const(a), ConstLattice::Const(b)) if a == b => ConstLattice::Const(a),
            _ => ConstLattice::Bottom,
        }
    }
}

/// Per-variable lattice values live at a program point. `Top` for any variable not present.
pub type Facts = HashMap<VarId, ConstLattice>;

fn get(facts: &Facts, v: VarId) -> ConstLattice {
    facts.get(&v).copied().unwrap_or(ConstLattice::Top)
}

fn meet_facts(a: &Facts, b: &Facts) -> Facts {
    let mut out = a.clone();
    for (&v, &val) in b {
        let merged = get(&out, v).meet(val);
        out.insert(v, merged);
    }
    for (&v, &val) in a {
        if !b.contains_key(&v) {
            out.insert(v, val.meet(ConstLattice::Top));
        }
    }
    out
}

fn eval_binop(op: crate::ir::BinOp, left: ConstLattice, right: ConstLattice) -> ConstLattice {
    use crate::ir::BinOp;
    let (ConstLattice::Const(a), ConstLattice::Const(b)) = (left, right) else {
        return ConstLattice::Bottom;
    };
    match op {
        BinOp::Add => ConstLattice::Const(a.wrapping_add(b)),
        BinOp::Sub => ConstLattice::Const(a.wrapping_sub(b)),
        BinOp::Mul => ConstLattice::Const(a.wrapping_mul(b)),
        BinOp::Div if b != 0 => ConstLattice::Const(a.wrapping_div(b)),
        BinOp::Rem if b != 0 => ConstLattice::Const(a.wrapping_rem(b)),
        BinOp::Div | BinOp::Rem => ConstLattice::Bottom,
    }
}

fn transfer(stmt: &crate::ir::Stmt, in_facts: &Facts) -> Facts {
    let mut out = in_facts.clone();
    match stmt {
        crate::ir::Stmt::ConstAssign { lhs, value } => {
            out.insert(*lhs, ConstLattice::Const(*value));
        }
        crate::ir::Stmt::Copy { lhs, rhs } => {
            out.insert(*lhs, get(in_facts, *rhs));
        }
        crate::ir::Stmt::BinOp { lhs, op, left, right } => {
            out.insert(*lhs, eval_binop(*op, get(in_facts, *left), get(in_facts, *right)));
        }
        _ => {
            if let Some(lhs) = stmt.lhs() {
                out.insert(lhs, ConstLattice::Bottom);
            }
        }
    }
    out
}

/// In-fact (the lattice state on entry to each statement) for every statement in `method`,
/// computed by a forward worklist fixed point starting from statement 0.
pub fn analyze(method: &Method) -> Vec<Facts> {
    let len = method.stmts.len();
    let mut in_facts: Vec<Facts> = vec![Facts::new(); len];
    if len == 0 {
        return in_facts;
    }

    let mut queue: VecDeque<usize> = VecDeque::new();
    queue.push_back(0);
    let mut queued = vec![false; len];
    queued[0] = true;

    while let Some(s) = queue.pop_front() {
        queued[s] = false;
        let out = transfer(&method.stmts[s], &in_facts[s]);
        for succ in method.stmts[s].successors(s, len) {
            let merged = meet_facts(&in_facts[succ], &out);
            if merged != in_facts[succ] {
                in_facts[succ] = merged;
                if !queued[succ] {
                    queued[succ] = true;
                    queue.push_back(succ);
                }
            }
        }
    }

    in_facts
}

/// The constant value of `var` at the point just before `stmt_index` executes, if known.
pub fn const_of(facts: &[Facts], stmt_index: usize, var: VarId) -> Option<i64> {
    const_of_facts(&facts[stmt_index], var)
}

/// The constant value of `var` in a single already-computed fact set, if known.
pub fn const_of_facts(facts: &Facts, var: VarId) -> Option<i64> {
    match get(facts, var) {
        ConstLattice::Const(v) => Some(v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::model::ProgramBuilder;
    use crate::ir::Stmt;

    #[test]
    fn propagates_constant_through_copy() {
        let mut b = ProgramBuilder::new();
        let t = b.add_type("T");
        let m = b.declare_method("m", t);
        let x = b.fresh_var(m);
        let y = b.fresh_var(m);
        b.push_stmt(m, Stmt::ConstAssign { lhs: x, value: 42 });
        b.push_stmt(m, Stmt::Copy { lhs: y, rhs: x });
        b.push_stmt(m, Stmt::Return { value: Some(y) });
        let program = b.finish();

        let facts = analyze(program.method(m));
        assert_eq!(const_of(&facts, 1, x), Some(42));
        assert_eq!(const_of(&facts, 2, y), Some(42));
    }

    #[test]
    fn division_by_zero_is_bottom_not_a_panic() {
        let mut b = ProgramBuilder::new();
        let t = b.add_type("T");
        let m = b.declare_method("m", t);
        let a = b.fresh_var(m);
        let zero = b.fresh_var(m);
        let x = b.fresh_var(m);
        b.push_stmt(m, Stmt::ConstAssign { lhs: a, value: 7 });
        b.push_stmt(m, Stmt::ConstAssign { lhs: zero, value: 0 });
        b.push_stmt(m, Stmt::BinOp { lhs: x, op: crate::ir::BinOp::Div, left: a, right: zero });
        b.push_stmt(m, Stmt::Return { value: Some(x) });
        let program = b.finish();

        let facts = analyze(program.method(m));
        assert_eq!(const_of(&facts, 3, x), None);
    }

    #[test]
    fn arithmetic_on_known_constants_is_folded() {
        let mut b = ProgramBuilder::new();
        let t = b.add_type("T");
        let m = b.declare_method("m", t);
        let a = b.fresh_var(m);
        let c = b.fresh_var(m);
        let x = b.fresh_var(m);
        b.push_stmt(m, Stmt::ConstAssign { lhs: a, value: 9 });
        b.push_stmt(m, Stmt::ConstAssign { lhs: c, value: 4 });
        b.push_stmt(m, Stmt::BinOp { lhs: x, op: crate::ir::BinOp::Rem, left: a, right: c });
        b.push_stmt(m, Stmt::Return { value: Some(x) });
        let program = b.finish();

        let facts = analyze(program.method(m));
        assert_eq!(const_of(&facts, 3, x), Some(1));
    }

    #[test]
    fn join_of_two_distinct_constants_is_bottom() {
        let mut b = ProgramBuilder::new();
        let t = b.add_type("T");
        let m = b.declare_method("m", t);
        let cond = b.fresh_var(m);
        let x = b.fresh_var(m);
        // stmt0: if (cond) goto 1 else goto 2; both arms rejoin at stmt4.
        b.push_stmt(m, Stmt::If { cond, then_succ: 1, else_succ: 2 });
        b.push_stmt(m, Stmt::ConstAssign { lhs: x, value: 1 });
        b.push_stmt(m, Stmt::Goto { target: 4 });
        b.push_stmt(m, Stmt::ConstAssign { lhs: x, value: 2 });
        b.push_stmt(m, Stmt::Return { value: Some(x) });
        let program = b.finish();

        let facts = analyze(program.method(m));
        assert_eq!(const_of(&facts, 4, x), None);
    }
}
