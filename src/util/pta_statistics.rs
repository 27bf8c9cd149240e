// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Post-solve statistics dump, grounded on `util::pta_statistics::{AndersenStat,
//! ContextSensitiveStat}`'s points-to/call-graph summary; collapsed to a single struct since this
//! crate has no CI/CS distinction to report separately (contexts are opaque either way).

use log::info;

use crate::graph::call_graph::CallGraph;
use crate::graph::pfg::PointerFlowGraph;
use crate::manager::CSManager;
use crate::pts_set::points_to::PointsToSet;
use crate::worklist::PtData;

#[derive(Debug, Clone, Copy, Default)]
pub struct PtaStatistics {
    pub num_pointers: usize,
    pub num_pts_relations: usize,
    pub num_reachable_methods: usize,
    pub num_call_edges: usize,
    pub num_pfg_edges: usize,
}

impl PtaStatistics {
    pub fn collect(_manager: &CSManager, pfg: &PointerFlowGraph, call_graph: &CallGraph, pt: &PtData) -> Self {
        let mut num_pointers = 0;
        let mut num_pts_relations = 0;
        for (_p, pts) in pt.iter() {
            num_pointers += 1;
            num_pts_relations += pts.count();
        }
        PtaStatistics {
            num_pointers,
            num_pts_relations,
            num_reachable_methods: call_graph.num_reachable(),
            num_call_edges: call_graph.num_edges(),
            num_pfg_edges: pfg.num_edges(),
        }
    }

    pub fn avg_pts_size(&self) -> f64 {
        if self.num_pointers == 0 {
            0.0
        } else {
            self.num_pts_relations as f64 / self.num_pointers as f64
        }
    }

    pub fn dump(&self) {
        info!("##########################################################");
        info!("Call Graph Statistics:");
        info!("#Reachable methods: {}", self.num_reachable_methods);
        info!("#Call edges: {}", self.num_call_edges);
        info!("----------------------------------------------------------");
        info!("Points-to Statistics:");
        info!("#Pointers: {}", self.num_pointers);
        info!("#PFG edges: {}", self.num_pfg_edges);
        info!("#Points-to relations: {}", self.num_pts_relations);
        info!("#Avg points-to size: {:.3}", self.avg_pts_size());
        info!("##########################################################");
    }
}
