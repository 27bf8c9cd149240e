// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Concrete context selectors (§4.F). The solver only ever goes through the `ContextSelector`
//! trait; selectors below are swappable strategies, mirroring the teacher's
//! `KCallSiteSensitive`/`KObjectSensitive`/`HybridCtxElem` family.

use std::rc::Rc;

use crate::ir::{MethodId, ObjId};

use super::{Context, ContextCache, ContextElement};

/// A single context element: either the call site that pushed a new activation, or the
/// allocation-site object a heap context is keyed by, generalizing `HybridCtxElem`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CtxElem {
    CallSite(MethodId, usize),
    Object(ObjId),
}

impl ContextElement for CtxElem {}

pub type Ctx = Context<CtxElem>;

/// `contextSelector` (§4.F, §6): produces the context for a freshly reached call target and the
/// heap context for a freshly allocated object. The solver treats every `Context` as opaque.
pub trait ContextSelector {
    fn empty_context(&self) -> Rc<Ctx> {
        Ctx::empty()
    }

    /// Context for the callee of a static call site reached in caller context `caller_ctx`.
    fn select_context(
        &self,
        caller_ctx: &Rc<Ctx>,
        call_method: MethodId,
        call_stmt: usize,
        callee: MethodId,
    ) -> Rc<Ctx>;

    /// Context for the callee of an instance call site; `recv_obj` is the receiver object
    /// reached by the call (some selectors, e.g. object-sensitivity, key off it).
    fn select_instance_context(
        &self,
        caller_ctx: &Rc<Ctx>,
        call_method: MethodId,
        call_stmt: usize,
        recv_obj: ObjId,
        callee: MethodId,
    ) -> Rc<Ctx>;

    /// Heap context for a freshly allocated object in method context `method_ctx`.
    fn select_heap_context(&self, method_ctx: &Rc<Ctx>, obj: ObjId) -> Rc<Ctx>;
}

/// Context-insensitive: every method and every object shares the single empty context. Used by
/// the `andersen` entry point (§4.H) and as the cheap default for large programs.
#[derive(Default)]
pub struct ContextInsensitive;

impl ContextSelector for ContextInsensitive {
    fn select_context(&self, _: &Rc<Ctx>, _: MethodId, _: usize, _: MethodId) -> Rc<Ctx> {
        Ctx::empty()
    }

    fn select_instance_context(
        &self,
        _: &Rc<Ctx>,
        _: MethodId,
        _: usize,
        _: ObjId,
        _: MethodId,
    ) -> Rc<Ctx> {
        Ctx::empty()
    }

    fn select_heap_context(&self, _: &Rc<Ctx>, _: ObjId) -> Rc<Ctx> {
        Ctx::empty()
    }
}

/// k-call-site-sensitive (call-string, kCFA-style): the context is the last `k` call sites on
/// the path to the current method. Mirrors the teacher's `KCallSiteSensitive`.
pub struct CallSiteSensitive {
    k: usize,
}

impl CallSiteSensitive {
    pub fn new(k: usize) -> Self {
        CallSiteSensitive { k }
    }
}

impl ContextSelector for CallSiteSensitive {
    fn select_context(
        &self,
        caller_ctx: &Rc<Ctx>,
        call_method: MethodId,
        call_stmt: usize,
        _callee: MethodId,
    ) -> Rc<Ctx> {
        Ctx::extend_k_limited(caller_ctx, CtxElem::CallSite(call_method, call_stmt), self.k)
    }

    fn select_instance_context(
        &self,
        caller_ctx: &Rc<Ctx>,
        call_method: MethodId,
        call_stmt: usize,
        _recv_obj: ObjId,
        callee: MethodId,
    ) -> Rc<Ctx> {
        self.select_context(caller_ctx, call_method, call_stmt, callee)
    }

    fn select_heap_context(&self, method_ctx: &Rc<Ctx>, _obj: ObjId) -> Rc<Ctx> {
        method_ctx.clone()
    }
}

/// k-object-sensitive: the context of an instance method invocation is the last `k` allocation
/// sites of its receiver chain; static calls and heap contexts fall back to the caller's
/// context, as in the teacher's `KObjectSensitive`.
pub struct ObjectSensitive {
    k: usize,
}

impl ObjectSensitive {
    pub fn new(k: usize) -> Self {
        ObjectSensitive { k }
    }
}

impl ContextSelector for ObjectSensitive {
    fn select_context(
        &self,
        caller_ctx: &Rc<Ctx>,
        _call_method: MethodId,
        _call_stmt: usize,
        _callee: MethodId,
    ) -> Rc<Ctx> {
        caller_ctx.clone()
    }

    fn select_instance_context(
        &self,
        caller_ctx: &Rc<Ctx>,
        _call_method: MethodId,
        _call_stmt: usize,
        recv_obj: ObjId,
        _callee: MethodId,
    ) -> Rc<Ctx> {
        Ctx::extend_k_limited(caller_ctx, CtxElem::Object(recv_obj), self.k)
    }

    fn select_heap_context(&self, method_ctx: &Rc<Ctx>, _obj: ObjId) -> Rc<Ctx> {
        method_ctx.clone()
    }
}

/// Hybrid selector: object-sensitive for instance dispatch, call-site-sensitive for static
/// calls, both sharing one k-limited element stream — the direct analogue of the teacher's
/// `HybridCtxElem::{CallSite, Object}` union.
pub struct Hybrid {
    k: usize,
}

impl Hybrid {
    pub fn new(k: usize) -> Self {
        Hybrid { k }
    }
}

impl ContextSelector for Hybrid {
    fn select_context(
        &self,
        caller_ctx: &Rc<Ctx>,
        call_method: MethodId,
        call_stmt: usize,
        _callee: MethodId,
    ) -> Rc<Ctx> {
        Ctx::extend_k_limited(caller_ctx, CtxElem::CallSite(call_method, call_stmt), self.k)
    }

    fn select_instance_context(
        &self,
        caller_ctx: &Rc<Ctx>,
        _call_method: MethodId,
        _call_stmt: usize,
        recv_obj: ObjId,
        _callee: MethodId,
    ) -> Rc<Ctx> {
        Ctx::extend_k_limited(caller_ctx, CtxElem::Object(recv_obj), self.k)
    }

    fn select_heap_context(&self, method_ctx: &Rc<Ctx>, _obj: ObjId) -> Rc<Ctx> {
        method_ctx.clone()
    }
}

/// Interns the `Ctx` values produced by a selector into dense ids for the `CSManager`.
pub type CtxCache = ContextCache<CtxElem>;

pub fn new_ctx_cache() -> CtxCache {
    CtxCache::new()
}
