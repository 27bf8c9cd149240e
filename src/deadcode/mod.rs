// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Dead-code detector (§4.J): BFS over a method's CFG guided by constant-propagation and
//! live-variable facts, reporting unreachable statements and side-effect-free dead assignments.
//! Runs independently of the pointer-analysis fixed point — it only needs a `Method`.

pub mod constprop;
pub mod liveness;

use std::collections::{HashSet, VecDeque};

use crate::ir::{Method, Stmt};

/// Supplies the in-fact (constant-propagation state) a method needs before BFS. Swappable so a
/// caller with a more precise external analysis can plug it in instead of `constprop::analyze`.
pub trait ConstFacts {
    fn analyze(&self, method: &Method) -> Vec<constprop::Facts>;
}

/// Supplies the out-fact (live-variable state) a method needs before BFS.
pub trait LiveFacts {
    fn analyze(&self, method: &Method) -> Vec<liveness::LiveSet>;
}

/// The default fact providers wired in §4.J.1: this crate's own forward constant-propagation and
/// backward live-variable dataflow passes.
#[derive(Default)]
pub struct DefaultConstFacts;

impl ConstFacts for DefaultConstFacts {
    fn analyze(&self, method: &Method) -> Vec<constprop::Facts> {
        constprop::analyze(method)
    }
}

#[derive(Default)]
pub struct DefaultLiveFacts;

impl LiveFacts for DefaultLiveFacts {
    fn analyze(&self, method: &Method) -> Vec<liveness::LiveSet> {
        liveness::analyze(method)
    }
}

/// Runs the BFS-based dead-code sweep (§4.J) over one method at a time.
pub struct DeadCodeDetector<C: ConstFacts = DefaultConstFacts, L: LiveFacts = DefaultLiveFacts> {
    const_facts: C,
    live_facts: L,
}

impl DeadCodeDetector<DefaultConstFacts, DefaultLiveFacts> {
    pub fn new() -> Self {
        DeadCodeDetector { const_facts: DefaultConstFacts, live_facts: DefaultLiveFacts }
    }
}

impl Default for DeadCodeDetector<DefaultConstFacts, DefaultLiveFacts> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ConstFacts, L: LiveFacts> DeadCodeDetector<C, L> {
    pub fn with_facts(const_facts: C, live_facts: L) -> Self {
        DeadCodeDetector { const_facts, live_facts }
    }

    /// Dead statement indices for `method`, ordered by statement index (§4.J): unreachable
    /// statements union side-effect-free assignments whose result is never live.
    pub fn detect(&self, method: &Method) -> Vec<usize> {
        let len = method.stmts.len();
        if len == 0 {
            return Vec::new();
        }

        let const_in = self.const_facts.analyze(method);
        let live_out = self.live_facts.analyze(method);

        let mut visited = vec![false; len];
        let mut dead_assignments = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(0usize);
        visited[0] = true;

        while let Some(here) = queue.pop_front() {
            let stmt = &method.stmts[here];
            let succs = branch_successors(stmt, here, len, &const_in[here]);

            if let Some(lhs) = stmt.lhs() {
                if !live_out[here].contains(&lhs) && stmt.has_no_side_effect() {
                    dead_assignments.insert(here);
                }
            }

            for succ in succs {
                if !visited[succ] {
                    visited[succ] = true;
                    queue.push_back(succ);
                }
            }
        }

        let mut dead: Vec<usize> = (0..len)
            .filter(|&i| !visited[i])
            .chain(dead_assignments)
            .collect();
        dead.sort_unstable();
        dead.dedup();
        dead
    }
}

/// Successors to traverse during the BFS, narrowed by known-constant branch conditions (§4.J):
/// an `if` with a constant condition only visits the taken arm; a `switch` with a constant value
/// only visits the matching case (or the default if none matches).
fn branch_successors(
    stmt: &Stmt,
    here: usize,
    method_len: usize,
    in_facts: &constprop::Facts,
) -> Vec<usize> {
    match stmt {
        Stmt::If { cond, then_succ, else_succ } => match constprop::const_of_facts(in_facts, *cond) {
            Some(v) if v != 0 => vec![*then_succ],
            Some(_) => vec![*else_succ],
            None => vec![*then_succ, *else_succ],
        },
        Stmt::Switch { var, cases, default } => match constprop::const_of_facts(in_facts, *var) {
            Some(v) => match cases.iter().find(|(k, _)| *k == v) {
                Some((_, target)) => vec![*target],
                None => vec![*default],
            },
            None => stmt.successors(here, method_len),
        },
        _ => stmt.successors(here, method_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::model::ProgramBuilder;
    use crate::ir::Stmt;

    #[test]
    fn dead_assignment_before_return_is_reported() {
        let mut b = ProgramBuilder::new();
        let t = b.add_type("T");
        let m = b.declare_method("m", t);
        let x = b.fresh_var(m);
        let y = b.fresh_var(m);
        b.push_stmt(m, Stmt::ConstAssign { lhs: x, value: 1 });
        b.push_stmt(m, Stmt::ConstAssign { lhs: y, value: 2 });
        b.push_stmt(m, Stmt::Return { value: Some(y) });
        let program = b.finish();

        let dead = DeadCodeDetector::new().detect(program.method(m));
        assert_eq!(dead, vec![0]);
    }

    #[test]
    fn unreachable_branch_is_pruned_by_constant_condition() {
        let mut b = ProgramBuilder::new();
        let t = b.add_type("T");
        let m = b.declare_method("m", t);
        let cond = b.fresh_var(m);
        let x = b.fresh_var(m);
        b.push_stmt(m, Stmt::ConstAssign { lhs: cond, value: 0 });
        b.push_stmt(m, Stmt::If { cond, then_succ: 2, else_succ: 3 });
        b.push_stmt(m, Stmt::ConstAssign { lhs: x, value: 1 });
        b.push_stmt(m, Stmt::Return { value: Some(x) });
        let program = b.finish();

        let dead = DeadCodeDetector::new().detect(program.method(m));
        assert!(dead.contains(&2));
        assert!(!dead.contains(&0));
        assert!(!dead.contains(&1));
        assert!(!dead.contains(&3));
    }

    #[test]
    fn division_is_never_reported_dead_even_if_unused() {
        let mut b = ProgramBuilder::new();
        let t = b.add_type("T");
        let m = b.declare_method("m", t);
        let a = b.fresh_var(m);
        let c = b.fresh_var(m);
        let x = b.fresh_var(m);
        b.push_stmt(m, Stmt::ConstAssign { lhs: a, value: 10 });
        b.push_stmt(m, Stmt::ConstAssign { lhs: c, value: 0 });
        b.push_stmt(m, Stmt::BinOp { lhs: x, op: crate::ir::BinOp::Div, left: a, right: c });
        b.push_stmt(m, Stmt::Return { value: None });
        let program = b.finish();

        let dead = DeadCodeDetector::new().detect(program.method(m));
        assert!(!dead.contains(&2));
    }

    #[test]
    fn multiplication_with_unused_result_is_reported_dead() {
        let mut b = ProgramBuilder::new();
        let t = b.add_type("T");
        let m = b.declare_method("m", t);
        let a = b.fresh_var(m);
        let c = b.fresh_var(m);
        let x = b.fresh_var(m);
        b.push_stmt(m, Stmt::ConstAssign { lhs: a, value: 10 });
        b.push_stmt(m, Stmt::ConstAssign { lhs: c, value: 2 });
        b.push_stmt(m, Stmt::BinOp { lhs: x, op: crate::ir::BinOp::Mul, left: a, right: c });
        b.push_stmt(m, Stmt::Return { value: None });
        let program = b.finish();

        let dead = DeadCodeDetector::new().detect(program.method(m));
        assert!(dead.contains(&2));
    }

    #[test]
    fn field_access_is_never_reported_dead_even_if_unused() {
        let mut b = ProgramBuilder::new();
        let t = b.add_type("T");
        let field = b.add_field(t, "f", false);
        let m = b.declare_method("m", t);
        let recv = b.fresh_var(m);
        let x = b.fresh_var(m);
        b.push_stmt(m, Stmt::Alloc { lhs: recv, obj_type: t });
        b.push_stmt(m, Stmt::InstanceLoad { lhs: x, base: recv, field });
        b.push_stmt(m, Stmt::Return { value: None });
        let program = b.finish();

        let dead = DeadCodeDetector::new().detect(program.method(m));
        assert!(!dead.contains(&1));
    }
}
