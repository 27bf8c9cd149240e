// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! End-to-end scenarios driving the solver through `ir::model::ProgramBuilder` the way a real
//! frontend would, plus one pass through the JSON loader to exercise the on-disk program format.

use ander_pta::context::selector::{CallSiteSensitive, ContextInsensitive};
use ander_pta::context::ContextId;
use ander_pta::ir::model::ProgramBuilder;
use ander_pta::ir::{BinOp, Stmt, RESULT};
use ander_pta::manager::Obj;
use ander_pta::pts_set::points_to::PointsToSet;
use ander_pta::result::PointerAnalysisResult;
use ander_pta::solver::{andersen, Solver};
use ander_pta::taint::config::{SinkRule, SourceRule, TransferRule};
use ander_pta::taint::{TaintConfig, TaintRules};

#[test]
fn copy_chain_propagates_allocated_object() {
    let mut b = ProgramBuilder::new();
    let t = b.add_type("T");
    let m = b.declare_method("main", t);
    let x = b.fresh_var(m);
    let y = b.fresh_var(m);
    let z = b.fresh_var(m);
    b.push_stmt(m, Stmt::Alloc { lhs: x, obj_type: t });
    b.push_stmt(m, Stmt::Copy { lhs: y, rhs: x });
    b.push_stmt(m, Stmt::Copy { lhs: z, rhs: y });
    b.push_stmt(m, Stmt::Return { value: None });
    b.add_entry_point(m);
    let program = b.finish();

    let rules = TaintRules::resolve(&TaintConfig::default(), &program);
    let result = PointerAnalysisResult::from_solve(andersen::analyze(&program, rules));

    let pts = result.points_to_var(ContextId(0), z);
    assert_eq!(pts.count(), 1);
    let obj = program.obj(m, 0);
    assert!(pts.iter().any(|cs_obj| result.manager().cs_obj(cs_obj).obj == Obj::Ordinary(obj)));
}

#[test]
fn virtual_dispatch_resolves_to_overriding_method() {
    let mut b = ProgramBuilder::new();
    let animal = b.add_type("Animal");
    let dog = b.add_type("Dog");
    b.add_subtype(dog, animal);

    let speak_animal = b.declare_method("speak_animal_impl", animal);
    b.push_stmt(speak_animal, Stmt::Return { value: None });
    b.add_virtual_method(animal, "speak", speak_animal);

    let speak_dog = b.declare_method("speak_dog_impl", dog);
    let this_var = b.fresh_var(speak_dog);
    b.set_this(speak_dog, this_var);
    b.push_stmt(speak_dog, Stmt::Return { value: None });
    b.add_virtual_method(dog, "speak", speak_dog);

    let main = b.declare_method("main", animal);
    let d = b.fresh_var(main);
    let r = b.fresh_var(main);
    b.push_stmt(main, Stmt::Alloc { lhs: d, obj_type: dog });
    b.push_stmt(
        main,
        Stmt::InstanceCall { recv: d, method_name: "speak".to_string(), args: Vec::new(), result: Some(r) },
    );
    b.push_stmt(main, Stmt::Return { value: None });
    b.add_entry_point(main);
    let program = b.finish();

    let rules = TaintRules::resolve(&TaintConfig::default(), &program);
    let mut result = Solver::new(&program, Box::new(CallSiteSensitive::new(1)), rules).solve();

    assert_eq!(result.call_graph.num_reachable(), 2);
    assert_eq!(result.call_graph.num_edges(), 1);

    let cs_call_site = result.manager.get_cs_call_site(ContextId(0), main, 1);
    let callees: Vec<_> = result.call_graph.callees(cs_call_site).into_iter().collect();
    assert_eq!(callees.len(), 1);
    assert_eq!(result.manager.cs_method(callees[0]).method, speak_dog);
}

#[test]
fn instance_field_store_then_load_flows_through_object() {
    let mut b = ProgramBuilder::new();
    let container = b.add_type("Container");
    let widget = b.add_type("Widget");
    let field = b.add_field(container, "f", false);

    let m = b.declare_method("main", container);
    let recv = b.fresh_var(m);
    let val = b.fresh_var(m);
    let out = b.fresh_var(m);
    b.push_stmt(m, Stmt::Alloc { lhs: recv, obj_type: container });
    b.push_stmt(m, Stmt::Alloc { lhs: val, obj_type: widget });
    b.push_stmt(m, Stmt::InstanceStore { base: recv, field, rhs: val });
    b.push_stmt(m, Stmt::InstanceLoad { lhs: out, base: recv, field });
    b.push_stmt(m, Stmt::Return { value: Some(out) });
    b.add_entry_point(m);
    let program = b.finish();

    let rules = TaintRules::resolve(&TaintConfig::default(), &program);
    let result = PointerAnalysisResult::from_solve(andersen::analyze(&program, rules));

    let pts = result.points_to_var(ContextId(0), out);
    let widget_obj = program.obj(m, 1);
    assert_eq!(pts.count(), 1);
    assert!(pts.iter().any(|cs_obj| result.manager().cs_obj(cs_obj).obj == Obj::Ordinary(widget_obj)));
}

#[test]
fn taint_source_reaches_configured_sink() {
    let mut b = ProgramBuilder::new();
    let util = b.add_type("Util");
    let get_input = b.declare_method("getInput", util);
    b.push_stmt(get_input, Stmt::Return { value: None });
    let process_data = b.declare_method("processData", util);
    let p = b.fresh_var(process_data);
    b.add_param(process_data, p);
    b.push_stmt(process_data, Stmt::Return { value: None });

    let main = b.declare_method("main", util);
    let r = b.fresh_var(main);
    b.push_stmt(main, Stmt::StaticCall { callee: get_input, args: Vec::new(), result: Some(r) });
    b.push_stmt(main, Stmt::StaticCall { callee: process_data, args: vec![r], result: None });
    b.push_stmt(main, Stmt::Return { value: None });
    b.add_entry_point(main);
    let program = b.finish();

    let config = TaintConfig {
        sources: vec![SourceRule { method: "getInput".to_string(), ty: "Util".to_string() }],
        sinks: vec![SinkRule { method: "processData".to_string(), param_index: 0 }],
        transfers: Vec::new(),
    };
    let rules = TaintRules::resolve(&config, &program);
    let result = Solver::new(&program, Box::new(ContextInsensitive), rules).solve();

    assert_eq!(result.taint_flows.len(), 1);
    assert_eq!(result.taint_flows[0].sink_param, 0);
}

#[test]
fn argument_taint_transfers_to_call_result() {
    let mut b = ProgramBuilder::new();
    let util = b.add_type("Util");
    let get_input = b.declare_method("getInput", util);
    b.push_stmt(get_input, Stmt::Return { value: None });

    let wrap = b.declare_method("wrap", util);
    let wrap_param = b.fresh_var(wrap);
    b.add_param(wrap, wrap_param);
    b.push_stmt(wrap, Stmt::Return { value: None });

    let process_data = b.declare_method("processData", util);
    let sink_param = b.fresh_var(process_data);
    b.add_param(process_data, sink_param);
    b.push_stmt(process_data, Stmt::Return { value: None });

    let main = b.declare_method("main", util);
    let r1 = b.fresh_var(main);
    let r2 = b.fresh_var(main);
    b.push_stmt(main, Stmt::StaticCall { callee: get_input, args: Vec::new(), result: Some(r1) });
    b.push_stmt(main, Stmt::StaticCall { callee: wrap, args: vec![r1], result: Some(r2) });
    b.push_stmt(main, Stmt::StaticCall { callee: process_data, args: vec![r2], result: None });
    b.push_stmt(main, Stmt::Return { value: None });
    b.add_entry_point(main);
    let program = b.finish();

    let config = TaintConfig {
        sources: vec![SourceRule { method: "getInput".to_string(), ty: "Util".to_string() }],
        sinks: vec![SinkRule { method: "processData".to_string(), param_index: 0 }],
        transfers: vec![TransferRule { method: "wrap".to_string(), from: 0, to: RESULT, ty: "Util".to_string() }],
    };
    let rules = TaintRules::resolve(&config, &program);
    let result = Solver::new(&program, Box::new(ContextInsensitive), rules).solve();

    assert_eq!(result.taint_flows.len(), 1);
    assert_eq!(result.taint_flows[0].sink_param, 0);
}

#[test]
fn arithmetic_division_has_no_points_to_effect_but_is_never_pruned() {
    let mut b = ProgramBuilder::new();
    let t = b.add_type("T");
    let m = b.declare_method("main", t);
    let a = b.fresh_var(m);
    let c = b.fresh_var(m);
    let q = b.fresh_var(m);
    b.push_stmt(m, Stmt::ConstAssign { lhs: a, value: 10 });
    b.push_stmt(m, Stmt::ConstAssign { lhs: c, value: 2 });
    b.push_stmt(m, Stmt::BinOp { lhs: q, op: BinOp::Div, left: a, right: c });
    b.push_stmt(m, Stmt::Return { value: None });
    b.add_entry_point(m);
    let program = b.finish();

    let rules = TaintRules::resolve(&TaintConfig::default(), &program);
    let result = PointerAnalysisResult::from_solve(andersen::analyze(&program, rules));

    assert_eq!(result.call_graph().num_reachable(), 1);
    let dead = ander_pta::deadcode::DeadCodeDetector::new().detect(program.method(m));
    assert!(!dead.contains(&2));
}

#[test]
fn loaded_json_program_propagates_through_andersen() {
    let json = r#"{
        "types": [{"name": "T"}],
        "methods": [{
            "name": "main",
            "declaring_type": 0,
            "is_instance": false,
            "num_locals": 2,
            "stmts": [
                {"kind": "alloc", "lhs": 0, "obj_type": 0},
                {"kind": "copy", "lhs": 1, "rhs": 0},
                {"kind": "return", "value": 1}
            ]
        }],
        "entry_points": [0]
    }"#;

    let path = std::env::temp_dir().join("ander_pta_loader_test_program.json");
    std::fs::write(&path, json).expect("write temp program");
    let program = ander_pta::ir::loader::load_program(&path).expect("load program");
    std::fs::remove_file(&path).ok();

    let rules = TaintRules::resolve(&TaintConfig::default(), &program);
    let result = PointerAnalysisResult::from_solve(andersen::analyze(&program, rules));

    let y = ander_pta::ir::VarId(1);
    let pts = result.points_to_var(ContextId(0), y);
    assert_eq!(pts.count(), 1);
}

#[test]
fn loaded_json_program_lowers_bin_op_statements() {
    let json = r#"{
        "types": [{"name": "T"}],
        "methods": [{
            "name": "main",
            "declaring_type": 0,
            "is_instance": false,
            "num_locals": 3,
            "stmts": [
                {"kind": "const_assign", "lhs": 0, "value": 10},
                {"kind": "const_assign", "lhs": 1, "value": 3},
                {"kind": "bin_op", "lhs": 2, "op": "rem", "left": 0, "right": 1},
                {"kind": "return", "value": 2}
            ]
        }],
        "entry_points": [0]
    }"#;

    let path = std::env::temp_dir().join("ander_pta_loader_binop_test_program.json");
    std::fs::write(&path, json).expect("write temp program");
    let program = ander_pta::ir::loader::load_program(&path).expect("load program");
    std::fs::remove_file(&path).ok();

    let facts = ander_pta::deadcode::constprop::analyze(program.method(ander_pta::ir::MethodId(0)));
    let z = ander_pta::ir::VarId(2);
    assert_eq!(ander_pta::deadcode::constprop::const_of(&facts, 3, z), Some(1));
}
