// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! A minimal, in-memory program representation implementing the `ir` traits. Stands in for a
//! real compiler frontend: good enough to drive the solver end to end and to build test
//! programs against directly, grounded on the shape `mir::function::Function` and
//! `mir::path::Path` give the teacher's own MIR-backed IR.

use std::collections::HashMap;

use super::{ClassHierarchy, FieldId, HeapModel, Method, MethodId, ObjId, Stmt, Type, TypeId, VarId};

/// Describes one field slot on a type; instance fields are keyed per-object by the caller via
/// `(CSObj, FieldId)`, static fields are keyed by `FieldId` alone (§3).
#[derive(Clone, Debug)]
pub struct Field {
    pub id: FieldId,
    pub owner: TypeId,
    pub name: String,
    pub is_static: bool,
}

/// A whole analyzed program: the set of methods, types and fields, plus the subtype relation the
/// class hierarchy collaborator resolves virtual calls against.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub methods: Vec<Method>,
    pub types: Vec<Type>,
    pub fields: Vec<Field>,
    /// `subtype -> supertype`, transitively closed by `ProgramBuilder::finish`.
    supertypes: HashMap<TypeId, Vec<TypeId>>,
    /// Virtual methods declared per type, by simple name (overload resolution is out of scope,
    /// §1 non-goal: IR construction) — a type's virtual dispatch table is just "does this type
    /// or one of its supertypes declare a method with this name".
    virtual_methods: HashMap<(TypeId, String), MethodId>,
    pub entry_points: Vec<MethodId>,
    /// One allocation obj per `Stmt::Alloc`, addressed by `(method, stmt_index)`.
    objs: HashMap<(MethodId, usize), ObjId>,
    obj_types: Vec<TypeId>,
    /// The method each variable was allocated in — every `VarId` belongs to exactly one method,
    /// since variables are never shared across method bodies. Lets the solver find the owning
    /// `MethodFlow` for a `CSVar` it only knows by id.
    var_owner: HashMap<VarId, MethodId>,
}

impl Program {
    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.0 as usize]
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.0 as usize]
    }

    /// The method that declared `var` (§4.H: needed to find the `MethodFlow` bucket for a
    /// `CSVar`'s field/array/call sites once a delta arrives at it).
    pub fn method_of_var(&self, var: VarId) -> MethodId {
        *self.var_owner.get(&var).expect("every VarId is allocated by ProgramBuilder::fresh_var")
    }

    /// Whether `sub` is `sup` or transitively extends/implements it.
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        sub == sup || self.supertypes.get(&sub).map_or(false, |sups| sups.contains(&sup))
    }
}

impl ClassHierarchy for Program {
    fn resolve_virtual(&self, recv_type: TypeId, call: &Stmt) -> Option<MethodId> {
        let name = match call {
            Stmt::InstanceCall { method_name, .. } => method_name,
            _ => return None,
        };
        if let Some(m) = self.virtual_methods.get(&(recv_type, name.clone())) {
            return Some(*m);
        }
        if let Some(sups) = self.supertypes.get(&recv_type) {
            for sup in sups {
                if let Some(m) = self.virtual_methods.get(&(*sup, name.clone())) {
                    return Some(*m);
                }
            }
        }
        None
    }
}

impl HeapModel for Program {
    fn obj(&self, method: MethodId, stmt_index: usize) -> ObjId {
        *self
            .objs
            .get(&(method, stmt_index))
            .expect("obj() called on a non-Alloc statement")
    }

    fn type_of(&self, obj: ObjId) -> TypeId {
        self.obj_types[obj.0 as usize]
    }
}

/// Builds a `Program` incrementally; used by the CLI's program loader and by tests.
#[derive(Default)]
pub struct ProgramBuilder {
    program: Program,
    next_var: u32,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, name: impl Into<String>) -> TypeId {
        let id = TypeId(self.program.types.len() as u32);
        self.program.types.push(Type { id, name: name.into() });
        id
    }

    pub fn add_subtype(&mut self, sub: TypeId, sup: TypeId) {
        self.program.supertypes.entry(sub).or_default().push(sup);
    }

    /// Transitively closes the subtype relation so `is_subtype`/virtual resolution need not walk
    /// multiple hops at query time.
    pub fn close_subtypes(&mut self) {
        loop {
            let mut additions = Vec::new();
            for (sub, sups) in self.program.supertypes.iter() {
                for sup in sups.clone() {
                    if let Some(grand) = self.program.supertypes.get(&sup) {
                        for g in grand {
                            if !sups.contains(g) {
                                additions.push((*sub, *g));
                            }
                        }
                    }
                }
            }
            if additions.is_empty() {
                break;
            }
            for (sub, sup) in additions {
                self.program.supertypes.entry(sub).or_default().push(sup);
            }
        }
    }

    pub fn add_field(&mut self, owner: TypeId, name: impl Into<String>, is_static: bool) -> FieldId {
        let id = FieldId(self.program.fields.len() as u32);
        self.program.fields.push(Field { id, owner, name: name.into(), is_static });
        id
    }

    pub fn declare_method(&mut self, name: impl Into<String>, declaring_type: TypeId) -> MethodId {
        let id = MethodId(self.program.methods.len() as u32);
        self.program.methods.push(Method {
            id,
            name: name.into(),
            this_var: None,
            params: Vec::new(),
            return_var: None,
            stmts: Vec::new(),
            declaring_type,
        });
        id
    }

    /// Registers `method` as the virtual-dispatch target of `name` on `owner`; callers resolving
    /// `InstanceCall` must separately record the intended name via `name_call_site`.
    pub fn add_virtual_method(&mut self, owner: TypeId, name: impl Into<String>, method: MethodId) {
        self.program.virtual_methods.insert((owner, name.into()), method);
    }

    /// Allocates a fresh, globally unique variable owned by `method`.
    pub fn fresh_var(&mut self, method: MethodId) -> VarId {
        let id = VarId(self.next_var);
        self.next_var += 1;
        self.program.var_owner.insert(id, method);
        id
    }

    pub fn set_this(&mut self, method: MethodId, var: VarId) {
        self.program.methods[method.0 as usize].this_var = Some(var);
    }

    pub fn add_param(&mut self, method: MethodId, var: VarId) {
        self.program.methods[method.0 as usize].params.push(var);
    }

    pub fn set_return_var(&mut self, method: MethodId, var: VarId) {
        self.program.methods[method.0 as usize].return_var = Some(var);
    }

    /// Appends `stmt` to `method`'s body, returning its index. If `stmt` is `Alloc`, interns a
    /// fresh `ObjId` for the site.
    pub fn push_stmt(&mut self, method: MethodId, stmt: Stmt) -> usize {
        let obj_type = if let Stmt::Alloc { obj_type, .. } = &stmt {
            Some(*obj_type)
        } else {
            None
        };
        let m = &mut self.program.methods[method.0 as usize];
        let index = m.stmts.len();
        m.stmts.push(stmt);
        if let Some(ty) = obj_type {
            let obj_id = ObjId(self.program.obj_types.len() as u32);
            self.program.obj_types.push(ty);
            self.program.objs.insert((method, index), obj_id);
        }
        index
    }

    pub fn add_entry_point(&mut self, method: MethodId) {
        self.program.entry_points.push(method);
    }

    pub fn finish(mut self) -> Program {
        self.close_subtypes();
        self.program
    }
}
