// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! A whole-program, context-sensitive, inclusion-based (Andersen-style) pointer analysis for an
//! object-oriented intermediate representation, with a taint-propagation overlay, a
//! context-insensitive variant, and a dead-code detector that consumes the latter's CFG-level
//! dataflow facts.
//!
//! `ir` defines the external collaborator interfaces (IR, class hierarchy, heap model) the
//! solver consumes, plus a minimal in-memory `ir::model::Program` implementation good enough to
//! drive the whole crate without a real frontend. `context`/`manager`/`pts_set`/`graph`/
//! `worklist`/`builder`/`solver` implement the analysis core itself (§3-§4); `taint` is the
//! overlay; `deadcode` is the companion detector; `result` is the crate's public output type;
//! `util` carries the ambient stack (CLI options, statistics, result dumping, the interning
//! support types).

pub mod builder;
pub mod context;
pub mod deadcode;
pub mod graph;
pub mod ir;
pub mod manager;
pub mod pts_set;
pub mod result;
pub mod solver;
pub mod taint;
pub mod util;
pub mod worklist;

pub use result::PointerAnalysisResult;
