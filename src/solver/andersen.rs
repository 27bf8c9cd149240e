// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Context-insensitive convenience entry point (§4.H), mirroring the teacher's separate
//! `AndersenPTA` front end: just `Solver` wired up with `ContextInsensitive` so callers that
//! don't care about context never have to name a selector.

use crate::context::selector::ContextInsensitive;
use crate::ir::model::Program;
use crate::taint::TaintRules;

use super::{SolveResult, Solver};

/// Runs a classic context-insensitive inclusion-based analysis to completion.
pub fn analyze(program: &Program, rules: TaintRules) -> SolveResult {
    Solver::new(program, Box::new(ContextInsensitive), rules).solve()
}
