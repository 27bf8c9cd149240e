// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! CSManager (§4.B): interns every context-sensitive entity — pointers, objects, methods and
//! call sites — into dense ids, so that everything downstream (points-to sets, the PFG, the
//! call graph) compares and hashes entities by cheap integer equality. Grounded on the
//! `CSFuncId { cid, func_id }` pairing in `mir::function.rs`, generalized from a single
//! context-sensitive function id to every kind of context-sensitive entity the core needs, and
//! interned the way `mir::context::ContextCache` interns `Context` values.

use std::collections::HashMap;
use std::rc::Rc;

use crate::context::selector::Ctx;
use crate::context::ContextId;
use crate::ir::{FieldId, MethodId, ObjId, VarId};
use crate::util::bit_vec::Idx;

use serde::{Deserialize, Serialize};

macro_rules! cs_id {
    ($name:ident) => {
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl Idx for $name {
            #[inline]
            fn new(idx: usize) -> Self {
                $name(idx as u32)
            }
            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

cs_id!(CSObjId);
cs_id!(CSMethodId);
cs_id!(CSCallSiteId);
/// Dense id of an interned `Pointer` (§3) — the node type of the pointer flow graph.
cs_id!(PointerId);

/// `Obj` (§3): heap abstraction identity. *Ordinary* objects are one per allocation site;
/// *taint* objects are synthetic, identified by the call site that produced them and a type that
/// transfers may rewrite (§4.I).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Obj {
    Ordinary(ObjId),
    Taint { source_call: CSCallSiteId, ty: crate::ir::TypeId },
}

/// `CSObj = (Context, Obj)` (§3): a context-sensitive abstract object. Taint CSObjs are always
/// paired with the empty context (§4.I invariant), enforced by callers of `get_cs_obj`, not by
/// this type — the manager interns whatever context id it is given.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct CSObjKey {
    pub ctx: ContextId,
    pub obj: Obj,
}

/// `CSMethod = (Context, Method)` (§3): a context-sensitive reachable method.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct CSMethodKey {
    pub ctx: ContextId,
    pub method: MethodId,
}

/// `CSCallSite = (Context, InvokeStatement)` (§3): an invoke statement in a context.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct CSCallSiteKey {
    pub ctx: ContextId,
    pub method: MethodId,
    pub stmt_index: usize,
}

/// `Pointer` (§3): one of the four node kinds the pointer flow graph propagates points-to
/// information between.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Pointer {
    CSVar(ContextId, VarId),
    StaticField(FieldId),
    InstanceField(CSObjId, FieldId),
    ArrayIndex(CSObjId),
}

/// Generic bidirectional interning table: key struct to dense id and back. Used uniformly for
/// every `CS*` entity and for `Pointer` nodes, the way `ContextCache` interns `Context` values.
struct InternTable<K: Copy + Eq + std::hash::Hash, Id: Idx> {
    keys: Vec<K>,
    index: HashMap<K, Id>,
}

impl<K: Copy + Eq + std::hash::Hash, Id: Idx> Default for InternTable<K, Id> {
    fn default() -> Self {
        InternTable { keys: Vec::new(), index: HashMap::new() }
    }
}

impl<K: Copy + Eq + std::hash::Hash, Id: Idx> InternTable<K, Id> {
    fn intern(&mut self, key: K) -> Id {
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = Id::new(self.keys.len());
        self.keys.push(key);
        self.index.insert(key, id);
        id
    }

    fn get(&self, id: Id) -> K {
        self.keys[id.index()]
    }

    fn find(&self, key: &K) -> Option<Id> {
        self.index.get(key).copied()
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Interns contexts, pointers, objects, methods and call sites into dense ids (§4.B). The solver
/// and graphs never hold a `Pointer`/`CSObjKey`/etc directly — only the id this manager hands
/// back, which is what makes delta propagation and points-to set membership cheap integer
/// operations.
#[derive(Default)]
pub struct CSManager {
    pointers: InternTable<Pointer, PointerId>,
    objs: InternTable<CSObjKey, CSObjId>,
    methods: InternTable<CSMethodKey, CSMethodId>,
    call_sites: InternTable<CSCallSiteKey, CSCallSiteId>,
}

impl CSManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_cs_var(&mut self, ctx: ContextId, var: VarId) -> PointerId {
        self.pointers.intern(Pointer::CSVar(ctx, var))
    }

    /// Read-only lookup for a `(ctx, var)` pointer already interned during the solve, without
    /// inserting one that was never reached (§7: callers querying results post-solve, not
    /// installing new constraints).
    pub fn find_cs_var(&self, ctx: ContextId, var: VarId) -> Option<PointerId> {
        self.pointers.find(&Pointer::CSVar(ctx, var))
    }

    pub fn get_static_field(&mut self, field: FieldId) -> PointerId {
        self.pointers.intern(Pointer::StaticField(field))
    }

    pub fn get_instance_field(&mut self, obj: CSObjId, field: FieldId) -> PointerId {
        self.pointers.intern(Pointer::InstanceField(obj, field))
    }

    pub fn get_array_index(&mut self, obj: CSObjId) -> PointerId {
        self.pointers.intern(Pointer::ArrayIndex(obj))
    }

    pub fn pointer(&self, id: PointerId) -> Pointer {
        self.pointers.get(id)
    }

    pub fn num_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub fn get_cs_obj(&mut self, ctx: ContextId, obj: Obj) -> CSObjId {
        self.objs.intern(CSObjKey { ctx, obj })
    }

    pub fn cs_obj(&self, id: CSObjId) -> CSObjKey {
        self.objs.get(id)
    }

    /// `isTaint(csObj)` (§4.I).
    pub fn is_taint(&self, id: CSObjId) -> bool {
        matches!(self.cs_obj(id).obj, Obj::Taint { .. })
    }

    /// `sourceCallOf(csObj)` (§4.I): the call site that produced this taint object. `None` for
    /// ordinary objects.
    pub fn source_call_of(&self, id: CSObjId) -> Option<CSCallSiteId> {
        match self.cs_obj(id).obj {
            Obj::Taint { source_call, .. } => Some(source_call),
            Obj::Ordinary(_) => None,
        }
    }

    /// The declared type of an object: the heap model's type for ordinary objects, the
    /// transfer-rewritten type carried directly on taint objects.
    pub fn obj_type(&self, id: CSObjId, heap: &dyn crate::ir::HeapModel) -> crate::ir::TypeId {
        match self.cs_obj(id).obj {
            Obj::Ordinary(obj) => heap.type_of(obj),
            Obj::Taint { ty, .. } => ty,
        }
    }

    pub fn get_cs_method(&mut self, ctx: ContextId, method: MethodId) -> CSMethodId {
        self.methods.intern(CSMethodKey { ctx, method })
    }

    pub fn cs_method(&self, id: CSMethodId) -> CSMethodKey {
        self.methods.get(id)
    }

    pub fn num_methods(&self) -> usize {
        self.methods.len()
    }

    pub fn get_cs_call_site(
        &mut self,
        ctx: ContextId,
        method: MethodId,
        stmt_index: usize,
    ) -> CSCallSiteId {
        self.call_sites.intern(CSCallSiteKey { ctx, method, stmt_index })
    }

    pub fn cs_call_site(&self, id: CSCallSiteId) -> CSCallSiteKey {
        self.call_sites.get(id)
    }
}

/// Convenience: a context together with the cache needed to intern it, bundled since callers
/// almost always need both together (select a `Ctx`, then intern it to get a `ContextId`).
pub struct ContextInterner {
    pub cache: crate::context::ContextCache<crate::context::selector::CtxElem>,
}

impl Default for ContextInterner {
    fn default() -> Self {
        ContextInterner { cache: crate::context::selector::new_ctx_cache() }
    }
}

impl ContextInterner {
    pub fn intern(&mut self, ctx: &Rc<Ctx>) -> ContextId {
        self.cache.intern(ctx)
    }

    pub fn get(&self, id: ContextId) -> Rc<Ctx> {
        self.cache.get(id)
    }
}
