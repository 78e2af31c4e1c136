//! Interned, k-limited calling and heap contexts.
//!
//! A context is an ordered, finite sequence of [`ContextElement`]s, capped at a
//! configured length `k` by dropping the *oldest* elements (suffix truncation:
//! the most recent call or allocation sites are retained). Contexts are
//! canonicalized by the [`ContextFactory`]: structurally equal sequences map to
//! the same [`ContextId`], so context equality is a handle comparison and the
//! common-prefix backbone of related contexts is shared through the append cache.
//!
//! The empty context is the distinguished [`ContextId::EMPTY`] singleton used by
//! context-insensitive selection; truncating to `k = 0` always yields it.

use std::fmt;

use dashmap::DashMap;

use crate::analysis::pta::ObjId;
use crate::ir::{ClassId, StmtId};

/// One element of a context.
///
/// Which kind of element a context carries depends on the sensitivity variant:
/// call-site sensitivity appends invoke statements, object sensitivity appends
/// receiver objects, type sensitivity appends the classes containing the
/// receivers' allocation sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextElement {
    /// An invoke statement (call-site sensitivity).
    CallSite(StmtId),
    /// An abstract object (object sensitivity).
    Obj(ObjId),
    /// A class (type sensitivity).
    Type(ClassId),
}

impl fmt::Display for ContextElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallSite(site) => write!(f, "{site}"),
            Self::Obj(obj) => write!(f, "{obj}"),
            Self::Type(class) => write!(f, "{class}"),
        }
    }
}

/// Handle to an interned context.
///
/// Two contexts are structurally equal iff their handles are equal, which is what
/// makes `(element, context)` pairs usable as canonical keys throughout the
/// context-sensitive element tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) u32);

impl ContextId {
    /// The distinguished empty context.
    pub const EMPTY: ContextId = ContextId(0);

    /// Returns the arena index of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Interning factory for contexts.
///
/// The factory owns the context arena and the canonicalization tables. All
/// operations are append-only: once interned, a context stays valid for the
/// lifetime of the analysis, and readers of a converged result never need a lock.
#[derive(Debug)]
pub struct ContextFactory {
    /// Arena of element sequences; index 0 is the empty context.
    arena: boxcar::Vec<Vec<ContextElement>>,
    /// Structural interning table.
    interned: DashMap<Vec<ContextElement>, ContextId>,
    /// Append cache: one lookup per repeated `(parent, element, k)` append.
    append_cache: DashMap<(ContextId, ContextElement, u32), ContextId>,
}

impl ContextFactory {
    /// Creates a factory with the empty context pre-interned.
    #[must_use]
    pub fn new() -> Self {
        let factory = Self {
            arena: boxcar::Vec::new(),
            interned: DashMap::new(),
            append_cache: DashMap::new(),
        };
        let empty = factory.arena.push(Vec::new());
        debug_assert_eq!(empty, ContextId::EMPTY.index());
        factory.interned.insert(Vec::new(), ContextId::EMPTY);
        factory
    }

    /// Returns the elements of a context, oldest first.
    #[must_use]
    pub fn elements(&self, ctx: ContextId) -> &[ContextElement] {
        self.arena
            .get(ctx.index())
            .map_or(&[], |elements| elements.as_slice())
    }

    /// Returns the number of elements in a context.
    #[must_use]
    pub fn len(&self, ctx: ContextId) -> usize {
        self.elements(ctx).len()
    }

    /// Returns `true` for the empty context.
    #[must_use]
    pub fn is_empty(&self, ctx: ContextId) -> bool {
        ctx == ContextId::EMPTY
    }

    /// Returns the number of distinct contexts interned so far.
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.arena.count()
    }

    /// Appends `element` to `parent` and truncates to the last `limit` elements.
    ///
    /// `limit == 0` always yields the empty context. Identical inputs yield the
    /// identical handle.
    #[must_use]
    pub fn append(&self, parent: ContextId, element: ContextElement, limit: u32) -> ContextId {
        if limit == 0 {
            return ContextId::EMPTY;
        }
        if let Some(cached) = self.append_cache.get(&(parent, element, limit)) {
            return *cached;
        }

        let parent_elements = self.elements(parent);
        let limit_len = limit as usize;
        let mut elements = Vec::with_capacity(limit_len.min(parent_elements.len() + 1));
        let keep_from = (parent_elements.len() + 1).saturating_sub(limit_len);
        elements.extend_from_slice(&parent_elements[keep_from.min(parent_elements.len())..]);
        elements.push(element);

        let ctx = self.intern(elements);
        self.append_cache.insert((parent, element, limit), ctx);
        ctx
    }

    /// Truncates a context to its last `limit` elements.
    ///
    /// Used to derive heap contexts from method contexts. Returns the same handle
    /// when no truncation is needed.
    #[must_use]
    pub fn make_last_k(&self, ctx: ContextId, limit: u32) -> ContextId {
        if limit == 0 {
            return ContextId::EMPTY;
        }
        let elements = self.elements(ctx);
        let limit_len = limit as usize;
        if elements.len() <= limit_len {
            return ctx;
        }
        self.intern(elements[elements.len() - limit_len..].to_vec())
    }

    fn intern(&self, elements: Vec<ContextElement>) -> ContextId {
        if elements.is_empty() {
            return ContextId::EMPTY;
        }
        if let Some(existing) = self.interned.get(&elements) {
            return *existing;
        }
        let index = self.arena.push(elements.clone());
        let ctx = ContextId(u32::try_from(index).expect("context arena exceeds u32 range"));
        self.interned.insert(elements, ctx);
        ctx
    }
}

impl Default for ContextFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(n: u32) -> ContextElement {
        ContextElement::CallSite(crate::ir::StmtId(n))
    }

    #[test]
    fn test_append_is_canonical() {
        let factory = ContextFactory::new();

        let c1 = factory.append(ContextId::EMPTY, site(1), 2);
        let c2 = factory.append(ContextId::EMPTY, site(1), 2);
        assert_eq!(c1, c2, "structurally equal appends intern to one handle");

        // Same sequence reached along a different path is still the same handle.
        let other_parent = factory.append(ContextId::EMPTY, site(9), 1);
        let via_other = factory.append(other_parent, site(1), 1);
        let direct = factory.append(ContextId::EMPTY, site(1), 1);
        assert_eq!(via_other, direct);
    }

    #[test]
    fn test_append_keeps_most_recent_elements() {
        let factory = ContextFactory::new();

        let mut ctx = ContextId::EMPTY;
        for n in 1..=4 {
            ctx = factory.append(ctx, site(n), 3);
        }

        // Oldest element (1) dropped, most recent retained.
        assert_eq!(factory.elements(ctx), &[site(2), site(3), site(4)]);
    }

    #[test]
    fn test_zero_limit_collapses_to_empty() {
        let factory = ContextFactory::new();

        let deep = factory.append(ContextId::EMPTY, site(7), 3);
        assert_eq!(factory.append(deep, site(8), 0), ContextId::EMPTY);
        assert_eq!(factory.make_last_k(deep, 0), ContextId::EMPTY);
    }

    #[test]
    fn test_make_last_k() {
        let factory = ContextFactory::new();

        let mut ctx = ContextId::EMPTY;
        for n in 1..=3 {
            ctx = factory.append(ctx, site(n), 3);
        }

        let truncated = factory.make_last_k(ctx, 2);
        assert_eq!(factory.elements(truncated), &[site(2), site(3)]);

        // No truncation needed: identical handle, not just an equal sequence.
        assert_eq!(factory.make_last_k(ctx, 3), ctx);
        assert_eq!(factory.make_last_k(ctx, 10), ctx);
    }

    #[test]
    fn test_empty_context_is_singleton() {
        let factory = ContextFactory::new();
        assert_eq!(factory.len(ContextId::EMPTY), 0);
        assert!(factory.is_empty(ContextId::EMPTY));
        assert_eq!(factory.context_count(), 1);
    }
}
