// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! JSON program loader (§6, §7): the on-disk counterpart of `ir::model::ProgramBuilder`, used by
//! the CLI in place of a real frontend. Not part of the analysis core — genuine I/O/parsing
//! failure here is the one place outside the solver where something can legitimately go wrong
//! (§7), so every fallible step is wrapped with `anyhow::Context`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

use super::model::{Program, ProgramBuilder};
use super::{BinOp, FieldId, MethodId, Stmt, TypeId, VarId};

#[derive(Deserialize)]
struct ProgramJson {
    types: Vec<TypeSpec>,
    #[serde(default)]
    fields: Vec<FieldSpec>,
    #[serde(default)]
    subtypes: Vec<(usize, usize)>,
    methods: Vec<MethodSpec>,
    #[serde(default)]
    virtual_methods: Vec<VirtualSpec>,
    entry_points: Vec<usize>,
}

#[derive(Deserialize)]
struct TypeSpec {
    name: String,
}

#[derive(Deserialize)]
struct FieldSpec {
    owner: usize,
    name: String,
    #[serde(default)]
    is_static: bool,
}

#[derive(Deserialize)]
struct VirtualSpec {
    owner: usize,
    name: String,
    method: usize,
}

#[derive(Deserialize)]
struct MethodSpec {
    name: String,
    declaring_type: usize,
    #[serde(default)]
    is_instance: bool,
    num_locals: usize,
    #[serde(default)]
    params: Vec<usize>,
    #[serde(default)]
    return_var: Option<usize>,
    #[serde(default)]
    stmts: Vec<StmtSpec>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum StmtSpec {
    Alloc { lhs: usize, obj_type: usize },
    Copy { lhs: usize, rhs: usize },
    ConstAssign { lhs: usize, value: i64 },
    BinOp { lhs: usize, op: BinOp, left: usize, right: usize },
    StaticStore { field: usize, rhs: usize },
    StaticLoad { lhs: usize, field: usize },
    InstanceStore { base: usize, field: usize, rhs: usize },
    InstanceLoad { lhs: usize, base: usize, field: usize },
    ArrayStore { base: usize, rhs: usize },
    ArrayLoad { lhs: usize, base: usize },
    StaticCall { callee: usize, #[serde(default)] args: Vec<usize>, result: Option<usize> },
    InstanceCall {
        recv: usize,
        method_name: String,
        #[serde(default)]
        args: Vec<usize>,
        result: Option<usize>,
    },
    Nop,
    If { cond: usize, then_succ: usize, else_succ: usize },
    Switch { var: usize, cases: Vec<(i64, usize)>, default: usize },
    Goto { target: usize },
    Return { value: Option<usize> },
}

/// Loads a `Program` from the JSON format documented in `SPEC_FULL.md` §6. Method bodies address
/// locals (params, `this`, temporaries) by a per-method local index; the loader allocates a
/// `VarId` per local up front and rewrites every `StmtSpec` reference through that table.
pub fn load_program(path: impl AsRef<Path>) -> anyhow::Result<Program> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let raw: ProgramJson =
        serde_json::from_str(&text).with_context(|| format!("failed to parse program JSON {}", path.display()))?;

    let mut b = ProgramBuilder::new();

    let types: Vec<TypeId> = raw.types.iter().map(|t| b.add_type(t.name.clone())).collect();
    for (sub, sup) in &raw.subtypes {
        b.add_subtype(types[*sub], types[*sup]);
    }

    let fields: Vec<FieldId> = raw
        .fields
        .iter()
        .map(|f| b.add_field(types[f.owner], f.name.clone(), f.is_static))
        .collect();

    let methods: Vec<MethodId> = raw
        .methods
        .iter()
        .map(|m| b.declare_method(m.name.clone(), types[m.declaring_type]))
        .collect();

    for v in &raw.virtual_methods {
        b.add_virtual_method(types[v.owner], v.name.clone(), methods[v.method]);
    }

    for &entry in &raw.entry_points {
        b.add_entry_point(methods[entry]);
    }

    for (m_idx, spec) in raw.methods.iter().enumerate() {
        let method = methods[m_idx];
        let locals: Vec<VarId> = (0..spec.num_locals).map(|_| b.fresh_var(method)).collect();

        if spec.is_instance {
            let this = *locals.first().context("instance method declares no locals for `this`")?;
            b.set_this(method, this);
        }
        for &p in &spec.params {
            b.add_param(method, locals[p]);
        }
        if let Some(r) = spec.return_var {
            b.set_return_var(method, locals[r]);
        }

        for stmt_spec in &spec.stmts {
            let stmt = lower_stmt(stmt_spec, &locals, &types, &fields, &methods);
            b.push_stmt(method, stmt);
        }
    }

    Ok(b.finish())
}

fn lower_stmt(
    spec: &StmtSpec,
    locals: &[VarId],
    types: &[TypeId],
    fields: &[FieldId],
    methods: &[MethodId],
) -> Stmt {
    let v = |i: usize| locals[i];
    let ov = |i: Option<usize>| i.map(v);
    match spec {
        StmtSpec::Alloc { lhs, obj_type } => Stmt::Alloc { lhs: v(*lhs), obj_type: types[*obj_type] },
        StmtSpec::Copy { lhs, rhs } => Stmt::Copy { lhs: v(*lhs), rhs: v(*rhs) },
        StmtSpec::ConstAssign { lhs, value } => Stmt::ConstAssign { lhs: v(*lhs), value: *value },
        StmtSpec::BinOp { lhs, op, left, right } => {
            Stmt::BinOp { lhs: v(*lhs), op: *op, left: v(*left), right: v(*right) }
        }
        StmtSpec::StaticStore { field, rhs } => Stmt::StaticStore { field: fields[*field], rhs: v(*rhs) },
        StmtSpec::StaticLoad { lhs, field } => Stmt::StaticLoad { lhs: v(*lhs), field: fields[*field] },
        StmtSpec::InstanceStore { base, field, rhs } => {
            Stmt::InstanceStore { base: v(*base), field: fields[*field], rhs: v(*rhs) }
        }
        StmtSpec::InstanceLoad { lhs, base, field } => {
            Stmt::InstanceLoad { lhs: v(*lhs), base: v(*base), field: fields[*field] }
        }
        StmtSpec::ArrayStore { base, rhs } => Stmt::ArrayStore { base: v(*base), rhs: v(*rhs) },
        StmtSpec::ArrayLoad { lhs, base } => Stmt::ArrayLoad { lhs: v(*lhs), base: v(*base) },
        StmtSpec::StaticCall { callee, args, result } => Stmt::StaticCall {
            callee: methods[*callee],
            args: args.iter().map(|&a| v(a)).collect(),
            result: ov(*result),
        },
        StmtSpec::InstanceCall { recv, method_name, args, result } => Stmt::InstanceCall {
            recv: v(*recv),
            method_name: method_name.clone(),
            args: args.iter().map(|&a| v(a)).collect(),
            result: ov(*result),
        },
        StmtSpec::Nop => Stmt::Nop,
        StmtSpec::If { cond, then_succ, else_succ } => {
            Stmt::If { cond: v(*cond), then_succ: *then_succ, else_succ: *else_succ }
        }
        StmtSpec::Switch { var, cases, default } => {
            Stmt::Switch { var: v(*var), cases: cases.clone(), default: *default }
        }
        StmtSpec::Goto { target } => Stmt::Goto { target: *target },
        StmtSpec::Return { value } => Stmt::Return { value: ov(*value) },
    }
}
