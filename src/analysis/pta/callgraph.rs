//! Context-sensitive call graph.
//!
//! The call graph is discovered on the fly: nodes are context-sensitive methods,
//! edges connect context-sensitive call sites to their resolved callees, and both
//! appear only as the solver's points-to facts make them reachable. Like every
//! other structure of the analysis, the graph is append-only.

use std::collections::{HashMap, HashSet};

use crate::analysis::pta::{CsCallSiteId, CsMethodId};
use crate::ir::CallKind;

/// One edge of the call graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallEdge {
    /// Dispatch kind of the underlying invoke.
    pub kind: CallKind,
    /// The context-sensitive call site.
    pub call_site: CsCallSiteId,
    /// The context-sensitive callee.
    pub callee: CsMethodId,
}

impl CallEdge {
    /// Creates a new call edge.
    #[must_use]
    pub const fn new(kind: CallKind, call_site: CsCallSiteId, callee: CsMethodId) -> Self {
        Self {
            kind,
            call_site,
            callee,
        }
    }
}

/// Context-sensitive call graph built during solving.
///
/// Edge and reachability insertion both report newness, which is what the solver
/// uses to trigger first-time processing exactly once per distinct element.
#[derive(Debug, Default)]
pub struct CsCallGraph {
    /// All edges, for idempotent insertion.
    edges: HashSet<CallEdge>,
    /// Outgoing edges per call site.
    callees: HashMap<CsCallSiteId, Vec<CallEdge>>,
    /// Incoming edges per callee method.
    callers: HashMap<CsMethodId, Vec<CallEdge>>,
    /// Reachable methods, as a set for membership tests.
    reachable_set: HashSet<CsMethodId>,
    /// Reachable methods in discovery order.
    reachable: Vec<CsMethodId>,
}

impl CsCallGraph {
    /// Creates an empty call graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a call edge; returns `true` if the edge is new.
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        if !self.edges.insert(edge) {
            return false;
        }
        self.callees.entry(edge.call_site).or_default().push(edge);
        self.callers.entry(edge.callee).or_default().push(edge);
        true
    }

    /// Marks a method reachable; returns `true` if it was not reachable before.
    pub fn add_reachable(&mut self, method: CsMethodId) -> bool {
        if !self.reachable_set.insert(method) {
            return false;
        }
        self.reachable.push(method);
        true
    }

    /// Returns `true` if the method has been discovered.
    #[must_use]
    pub fn is_reachable(&self, method: CsMethodId) -> bool {
        self.reachable_set.contains(&method)
    }

    /// Returns the reachable methods in discovery order.
    #[must_use]
    pub fn reachable_methods(&self) -> &[CsMethodId] {
        &self.reachable
    }

    /// Returns the edges leaving a call site.
    #[must_use]
    pub fn callees_of(&self, call_site: CsCallSiteId) -> &[CallEdge] {
        self.callees.get(&call_site).map_or(&[], Vec::as_slice)
    }

    /// Returns the edges targeting a method.
    #[must_use]
    pub fn callers_of(&self, method: CsMethodId) -> &[CallEdge] {
        self.callers.get(&method).map_or(&[], Vec::as_slice)
    }

    /// Iterates over all call edges.
    pub fn edges(&self) -> impl Iterator<Item = CallEdge> + '_ {
        self.edges.iter().copied()
    }

    /// Returns the number of call edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of reachable methods.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.reachable.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_insertion_is_idempotent() {
        let mut cg = CsCallGraph::new();
        let edge = CallEdge::new(CallKind::Virtual, CsCallSiteId(0), CsMethodId(0));

        assert!(cg.add_edge(edge));
        assert!(!cg.add_edge(edge));
        assert_eq!(cg.edge_count(), 1);
        assert_eq!(cg.callees_of(CsCallSiteId(0)), &[edge]);
        assert_eq!(cg.callers_of(CsMethodId(0)), &[edge]);
    }

    #[test]
    fn test_reachability_reports_newness() {
        let mut cg = CsCallGraph::new();
        assert!(cg.add_reachable(CsMethodId(3)));
        assert!(!cg.add_reachable(CsMethodId(3)));
        assert!(cg.is_reachable(CsMethodId(3)));
        assert_eq!(cg.reachable_methods(), &[CsMethodId(3)]);
    }

    #[test]
    fn test_discovery_order_is_preserved() {
        let mut cg = CsCallGraph::new();
        for id in [2, 0, 1] {
            cg.add_reachable(CsMethodId(id));
        }
        assert_eq!(
            cg.reachable_methods(),
            &[CsMethodId(2), CsMethodId(0), CsMethodId(1)]
        );
    }
}
