// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The graphs the solver maintains: the pointer flow graph (§4.C), the call graph (§4.E) and the
//! taint flow graph (taint overlay). All three are `petgraph`-backed multigraphs with dedup'd
//! edges, grounded on `graph::pag.rs` and `graph::call_graph.rs`.

pub mod call_graph;
pub mod pfg;
pub mod tfg;
