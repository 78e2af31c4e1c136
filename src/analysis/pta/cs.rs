//! Context-sensitive program elements.
//!
//! The analysis works on the cross product of program elements with contexts:
//! variables, objects, call sites, and methods each become context-sensitive
//! counterparts. The [`CsManager`] canonicalizes every `(element, context)` pair
//! to exactly one handle, which is what lets points-to sets be plain sets of
//! [`CsObjId`] and pointer-flow-graph nodes be keyed by handle equality.

use std::fmt;

use dashmap::DashMap;

use crate::analysis::pta::{ContextId, ObjId};
use crate::ir::{MethodId, StmtId, VarId};

/// Handle to a context-sensitive variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsVarId(pub(crate) u32);

impl fmt::Display for CsVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "csvar#{}", self.0)
    }
}

/// Handle to a context-sensitive object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsObjId(pub(crate) u32);

impl fmt::Display for CsObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "csobj#{}", self.0)
    }
}

/// Handle to a context-sensitive call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsCallSiteId(pub(crate) u32);

impl fmt::Display for CsCallSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cscall#{}", self.0)
    }
}

/// Handle to a context-sensitive method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsMethodId(pub(crate) u32);

impl fmt::Display for CsMethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "csmethod#{}", self.0)
    }
}

/// A variable under a calling context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CsVar {
    /// The underlying variable.
    pub var: VarId,
    /// Calling context of the enclosing method.
    pub ctx: ContextId,
}

/// An abstract object under a heap context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CsObj {
    /// The underlying abstract object.
    pub obj: ObjId,
    /// Heap context assigned at allocation time.
    pub ctx: ContextId,
}

/// A call site under the calling context of its containing method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CsCallSite {
    /// The invoke statement.
    pub call_site: StmtId,
    /// Calling context of the containing method.
    pub ctx: ContextId,
}

/// A method under a calling context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CsMethod {
    /// The underlying method.
    pub method: MethodId,
    /// Calling context the method is analyzed under.
    pub ctx: ContextId,
}

/// Canonicalization tables for context-sensitive elements.
///
/// Every getter is memoized: identical `(element, context)` pairs map to one
/// canonical handle, produced on demand and never removed. Arenas are
/// append-only, so a converged analysis result can be read concurrently without
/// locking.
#[derive(Debug, Default)]
pub struct CsManager {
    vars: boxcar::Vec<CsVar>,
    var_ids: DashMap<(VarId, ContextId), CsVarId>,
    objs: boxcar::Vec<CsObj>,
    obj_ids: DashMap<(ObjId, ContextId), CsObjId>,
    call_sites: boxcar::Vec<CsCallSite>,
    call_site_ids: DashMap<(StmtId, ContextId), CsCallSiteId>,
    methods: boxcar::Vec<CsMethod>,
    method_ids: DashMap<(MethodId, ContextId), CsMethodId>,
}

impl CsManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical handle for `(var, ctx)`.
    #[must_use]
    pub fn var(&self, var: VarId, ctx: ContextId) -> CsVarId {
        if let Some(existing) = self.var_ids.get(&(var, ctx)) {
            return *existing;
        }
        let index = self.vars.push(CsVar { var, ctx });
        let id = CsVarId(u32::try_from(index).expect("CS variable arena exceeds u32 range"));
        self.var_ids.insert((var, ctx), id);
        id
    }

    /// Returns the canonical handle for `(obj, ctx)`.
    #[must_use]
    pub fn obj(&self, obj: ObjId, ctx: ContextId) -> CsObjId {
        if let Some(existing) = self.obj_ids.get(&(obj, ctx)) {
            return *existing;
        }
        let index = self.objs.push(CsObj { obj, ctx });
        let id = CsObjId(u32::try_from(index).expect("CS object arena exceeds u32 range"));
        self.obj_ids.insert((obj, ctx), id);
        id
    }

    /// Returns the canonical handle for `(call_site, ctx)`.
    #[must_use]
    pub fn call_site(&self, call_site: StmtId, ctx: ContextId) -> CsCallSiteId {
        if let Some(existing) = self.call_site_ids.get(&(call_site, ctx)) {
            return *existing;
        }
        let index = self.call_sites.push(CsCallSite { call_site, ctx });
        let id = CsCallSiteId(u32::try_from(index).expect("CS call-site arena exceeds u32 range"));
        self.call_site_ids.insert((call_site, ctx), id);
        id
    }

    /// Returns the canonical handle for `(method, ctx)`.
    #[must_use]
    pub fn method(&self, method: MethodId, ctx: ContextId) -> CsMethodId {
        if let Some(existing) = self.method_ids.get(&(method, ctx)) {
            return *existing;
        }
        let index = self.methods.push(CsMethod { method, ctx });
        let id = CsMethodId(u32::try_from(index).expect("CS method arena exceeds u32 range"));
        self.method_ids.insert((method, ctx), id);
        id
    }

    /// Resolves a CS-variable handle.
    #[must_use]
    pub fn var_of(&self, id: CsVarId) -> CsVar {
        *self
            .vars
            .get(id.0 as usize)
            .expect("CS variable handle should be valid")
    }

    /// Resolves a CS-object handle.
    #[must_use]
    pub fn obj_of(&self, id: CsObjId) -> CsObj {
        *self
            .objs
            .get(id.0 as usize)
            .expect("CS object handle should be valid")
    }

    /// Resolves a CS-call-site handle.
    #[must_use]
    pub fn call_site_of(&self, id: CsCallSiteId) -> CsCallSite {
        *self
            .call_sites
            .get(id.0 as usize)
            .expect("CS call-site handle should be valid")
    }

    /// Resolves a CS-method handle.
    #[must_use]
    pub fn method_of(&self, id: CsMethodId) -> CsMethod {
        *self
            .methods
            .get(id.0 as usize)
            .expect("CS method handle should be valid")
    }

    /// Iterates over all CS variables created so far.
    pub fn vars(&self) -> impl Iterator<Item = (CsVarId, CsVar)> + '_ {
        self.vars
            .iter()
            .map(|(index, var)| (CsVarId(index as u32), *var))
    }

    /// Iterates over all CS objects created so far.
    pub fn objs(&self) -> impl Iterator<Item = (CsObjId, CsObj)> + '_ {
        self.objs
            .iter()
            .map(|(index, obj)| (CsObjId(index as u32), *obj))
    }

    /// Returns the number of distinct CS variables.
    #[must_use]
    pub fn var_count(&self) -> usize {
        self.vars.count()
    }

    /// Returns the number of distinct CS objects.
    #[must_use]
    pub fn obj_count(&self) -> usize {
        self.objs.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::pta::ContextId;

    #[test]
    fn test_pairs_are_canonical() {
        let csm = CsManager::new();
        let v = VarId(3);

        let a = csm.var(v, ContextId::EMPTY);
        let b = csm.var(v, ContextId::EMPTY);
        assert_eq!(a, b);

        let other_ctx = ContextId(1);
        let c = csm.var(v, other_ctx);
        assert_ne!(a, c);
        assert_eq!(csm.var_count(), 2);
    }

    #[test]
    fn test_handles_resolve_back() {
        let csm = CsManager::new();
        let id = csm.obj(ObjId(5), ContextId::EMPTY);
        let cs = csm.obj_of(id);
        assert_eq!(cs.obj, ObjId(5));
        assert_eq!(cs.ctx, ContextId::EMPTY);
    }

    #[test]
    fn test_iteration_covers_all_elements() {
        let csm = CsManager::new();
        let a = csm.obj(ObjId(0), ContextId::EMPTY);
        let b = csm.obj(ObjId(1), ContextId::EMPTY);

        let ids: Vec<CsObjId> = csm.objs().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
    }
}
