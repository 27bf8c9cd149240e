// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Command-line front end (§6, §7): loads a program and an optional taint configuration, runs
//! the requested pointer-analysis configuration to completion, and dumps whatever results the
//! options asked for.

use std::path::Path;

use ander_pta::context::selector::{CallSiteSensitive, ContextInsensitive, ContextSelector, Hybrid, ObjectSensitive};
use ander_pta::ir::loader;
use ander_pta::result::PointerAnalysisResult;
use ander_pta::solver::Solver;
use ander_pta::taint::{TaintConfig, TaintRules};
use ander_pta::util::options::{AnalysisOptions, PtaType};
use ander_pta::util::results_dumper;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = AnalysisOptions::parse_from_args(&args);

    log::info!("Loading program from {}", options.program_path);
    let program = loader::load_program(&options.program_path)?;

    let rules = match &options.taint_config {
        Some(path) => {
            log::info!("Loading taint configuration from {path}");
            let config = TaintConfig::load(Path::new(path))?;
            TaintRules::resolve(&config, &program)
        }
        None => TaintRules::resolve(&TaintConfig::default(), &program),
    };

    let selector: Box<dyn ContextSelector> = match options.pta_type {
        PtaType::Andersen => Box::new(ContextInsensitive),
        PtaType::CallSiteSensitive => Box::new(CallSiteSensitive::new(options.context_depth)),
        PtaType::ObjectSensitive => Box::new(ObjectSensitive::new(options.context_depth)),
        PtaType::Hybrid => Box::new(Hybrid::new(options.context_depth)),
    };

    log::info!("Running pointer analysis ({:?})", options.pta_type);
    let solve_result = Solver::new(&program, selector, rules).solve();
    let manager_ref = &solve_result.manager;

    if options.dump_stats
        || options.call_graph_output.is_some()
        || options.pts_output.is_some()
        || options.taint_flows_output.is_some()
    {
        results_dumper::dump_results(&options, manager_ref, &solve_result)?;
    }

    let result = PointerAnalysisResult::from_solve(solve_result);
    log::info!(
        "Analysis complete: {} reachable methods, {} taint flows",
        result.call_graph().num_reachable(),
        result.taint_flows().len()
    );

    Ok(())
}
