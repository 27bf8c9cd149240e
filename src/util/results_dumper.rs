// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Result dumping (§7): points-to sets, call graph DOT, taint flows JSON. Grounded on
//! `util::results_dumper::{dump_pts, dump_call_graph}`'s "stdout"-sentinel output convention.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::Context;
use log::info;

use crate::manager::CSManager;
use crate::pts_set::points_to::PointsToSet;
use crate::solver::SolveResult;
use crate::taint::TaintFlow;
use crate::util::options::AnalysisOptions;

fn writer_for(path: &str) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        "stdout" => Box::new(std::io::stdout()),
        _ => Box::new(File::create(path).with_context(|| format!("failed to create {path}"))?),
    })
}

pub fn dump_pts(manager: &CSManager, result: &SolveResult, path: &str) -> anyhow::Result<()> {
    let mut w = BufWriter::new(writer_for(path)?);
    for (p, pts) in result.pt.iter() {
        if pts.is_empty() {
            continue;
        }
        write!(w, "{:?} ==> {{ ", manager.pointer(p))?;
        for obj in pts.iter() {
            write!(w, "{:?} ", manager.cs_obj(obj))?;
        }
        writeln!(w, "}}")?;
    }
    Ok(())
}

pub fn dump_call_graph(result: &SolveResult, path: &str) -> anyhow::Result<()> {
    std::fs::write(path, result.call_graph.to_dot())
        .with_context(|| format!("failed to write call graph dot to {path}"))
}

pub fn dump_taint_flows(flows: &[TaintFlow], path: &str) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(flows)?;
    std::fs::write(path, json).with_context(|| format!("failed to write taint flows to {path}"))
}

/// Dumps every output the options requested (§7).
pub fn dump_results(options: &AnalysisOptions, manager: &CSManager, result: &SolveResult) -> anyhow::Result<()> {
    if let Some(pts_output) = &options.pts_output {
        info!("Dumping points-to results...");
        dump_pts(manager, result, pts_output)?;
    }
    if let Some(cg_output) = &options.call_graph_output {
        info!("Dumping call graph...");
        dump_call_graph(result, cg_output)?;
    }
    if let Some(flows_output) = &options.taint_flows_output {
        info!("Dumping taint flows...");
        dump_taint_flows(&result.taint_flows, flows_output)?;
    }
    if options.dump_stats {
        result.stats.dump();
    }
    Ok(())
}
