// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Backward worklist live-variable analysis (§4.J.1): produces a live-out set per statement,
//! supplied as the default out-fact provider for the dead-code detector.

use std::collections::{HashSet, VecDeque};

use crate::ir::{Method, VarId};

pub type LiveSet = HashSet<VarId>;

fn predecessors(method: &Method) -> Vec<Vec<usize>> {
    let len = method.stmts.len();
    let mut preds = vec![Vec::new(); len];
    for (i, stmt) in method.stmts.iter().enumerate() {
        for succ in stmt.successors(i, len) {
            preds[succ].push(i);
        }
    }
    preds
}

/// Live-out set for every statement in `method`, via the standard backward fixed point
/// `out[s] = union(in[succ] for succ in successors(s))`, `in[s] = uses(s) ∪ (out[s] \ {lhs(s)})`.
pub fn analyze(method: &Method) -> Vec<LiveSet> {
    let len = method.stmts.len();
    let mut in_sets: Vec<LiveSet> = vec![LiveSet::new(); len];
    if len == 0 {
        return in_sets;
    }
    let preds = predecessors(method);

    let mut queue: VecDeque<usize> = (0..len).collect();
    let mut queued = vec![true; len];

    while let Some(s) = queue.pop_front() {
        queued[s] = false;
        let stmt = &method.stmts[s];
        let mut out = LiveSet::new();
        for succ in stmt.successors(s, len) {
            out.extend(in_sets[succ].iter().copied());
        }
        let mut new_in: LiveSet = stmt.uses().into_iter().collect();
        for &v in &out {
            if Some(v) != stmt.lhs() {
                new_in.insert(v);
            }
        }
        if new_in != in_sets[s] {
            in_sets[s] = new_in;
            for &p in &preds[s] {
                if !queued[p] {
                    queued[p] = true;
                    queue.push_back(p);
                }
            }
        }
    }

    // Callers want live-out, not live-in; recompute it once more now that `in_sets` is stable.
    (0..len)
        .map(|s| {
            let mut out = LiveSet::new();
            for succ in method.stmts[s].successors(s, len) {
                out.extend(in_sets[succ].iter().copied());
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::model::ProgramBuilder;
    use crate::ir::Stmt;

    #[test]
    fn dead_assignment_has_no_live_use() {
        let mut b = ProgramBuilder::new();
        let t = b.add_type("T");
        let m = b.declare_method("m", t);
        let x = b.fresh_var(m);
        let y = b.fresh_var(m);
        b.push_stmt(m, Stmt::ConstAssign { lhs: x, value: 1 });
        b.push_stmt(m, Stmt::ConstAssign { lhs: y, value: 2 });
        b.push_stmt(m, Stmt::Return { value: Some(y) });
        let program = b.finish();

        let live_out = analyze(program.method(m));
        assert!(!live_out[0].contains(&x));
        assert!(live_out[1].contains(&y));
    }
}
