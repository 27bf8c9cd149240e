// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Analysis options (§7).

use clap::{Arg, Command};

const PTA_USAGE: &str = r#"pta [OPTIONS] <PROGRAM>"#;

/// Which pointer-analysis configuration to run (§1, §4.F).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PtaType {
    Andersen,
    CallSiteSensitive,
    ObjectSensitive,
    Hybrid,
}

fn make_options_parser() -> Command<'static> {
    Command::new("pta")
        .no_binary_name(true)
        .override_usage(PTA_USAGE)
        .arg(
            Arg::new("pta-type")
                .long("pta-type")
                .takes_value(true)
                .value_parser(["andersen", "ander", "callsite-sensitive", "cs", "object-sensitive", "os", "hybrid"])
                .default_value("callsite-sensitive")
                .help("The type of pointer analysis."),
        )
        .arg(
            Arg::new("context-depth")
                .long("context-depth")
                .takes_value(true)
                .value_parser(clap::value_parser!(usize))
                .default_value("1")
                .help("The context depth limit for a context-sensitive pointer analysis."),
        )
        .arg(
            Arg::new("taint-config")
                .long("taint-config")
                .takes_value(true)
                .help("Path to a JSON taint source/sink/transfer configuration (§6)."),
        )
        .arg(
            Arg::new("dump-stats")
                .long("dump-stats")
                .takes_value(false)
                .help("Dump the statistics of the analysis results."),
        )
        .arg(
            Arg::new("call-graph-output")
                .long("dump-call-graph")
                .takes_value(true)
                .help("Dump the call graph in DOT format to the output file."),
        )
        .arg(
            Arg::new("pts-output")
                .long("dump-pts")
                .takes_value(true)
                .help("Dump points-to results to the output file."),
        )
        .arg(
            Arg::new("taint-flows-output")
                .long("dump-taint-flows")
                .takes_value(true)
                .help("Dump discovered taint flows as JSON to the output file."),
        )
        .arg(Arg::new("PROGRAM").required(true).help("The program JSON file to analyze."))
}

#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    pub program_path: String,
    pub taint_config: Option<String>,
    pub pta_type: PtaType,
    pub context_depth: usize,
    pub dump_stats: bool,
    pub call_graph_output: Option<String>,
    pub pts_output: Option<String>,
    pub taint_flows_output: Option<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            program_path: String::new(),
            taint_config: None,
            pta_type: PtaType::CallSiteSensitive,
            context_depth: 1,
            dump_stats: true,
            call_graph_output: None,
            pts_output: None,
            taint_flows_output: None,
        }
    }
}

impl AnalysisOptions {
    /// Parses options from a list of command-line arguments (excluding the binary name).
    pub fn parse_from_args(args: &[String]) -> Self {
        let matches = make_options_parser().get_matches_from(args);
        let mut options = AnalysisOptions {
            program_path: matches.get_one::<String>("PROGRAM").expect("required").clone(),
            ..AnalysisOptions::default()
        };

        options.pta_type = match matches.get_one::<String>("pta-type").unwrap().as_str() {
            "andersen" | "ander" => PtaType::Andersen,
            "callsite-sensitive" | "cs" => PtaType::CallSiteSensitive,
            "object-sensitive" | "os" => PtaType::ObjectSensitive,
            "hybrid" => PtaType::Hybrid,
            _ => unreachable!(),
        };
        if let Some(depth) = matches.get_one::<usize>("context-depth") {
            options.context_depth = *depth;
        }
        options.taint_config = matches.get_one::<String>("taint-config").cloned();
        options.dump_stats = matches.contains_id("dump-stats");
        options.call_graph_output = matches.get_one::<String>("call-graph-output").cloned();
        options.pts_output = matches.get_one::<String>("pts-output").cloned();
        options.taint_flows_output = matches.get_one::<String>("taint-flows-output").cloned();
        options
    }
}
