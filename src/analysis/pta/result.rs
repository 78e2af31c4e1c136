//! Converged pointer analysis results.
//!
//! A [`PointerAnalysisResult`] owns all state a solver run produced: the heap
//! model, the interned contexts, the canonical CS elements, the pointer flow
//! graph, and the call graph. Everything inside is append-only and no longer
//! mutated, so results can be shared across threads and queried without locking.

use crate::analysis::pta::{
    ContextFactory, CsCallGraph, CsManager, CsMethodId, CsObjId, CsVarId, HeapModel, Pointer,
    PointerFlowGraph, PointerId, PointsToSet, SolverStats,
};
use crate::ir::{FieldId, VarId};

/// The converged output of a pointer analysis run.
///
/// Points-to queries return references into the flow graph; pointers the solver
/// never created (e.g. a variable no reachable code touches) yield the empty set
/// rather than an error, matching the rule that absence is ordinary data.
#[derive(Debug)]
pub struct PointerAnalysisResult {
    heap: HeapModel,
    factory: ContextFactory,
    csm: CsManager,
    pfg: PointerFlowGraph,
    cg: CsCallGraph,
    stats: SolverStats,
    empty: PointsToSet,
}

impl PointerAnalysisResult {
    pub(crate) fn new(
        heap: HeapModel,
        factory: ContextFactory,
        csm: CsManager,
        pfg: PointerFlowGraph,
        cg: CsCallGraph,
        stats: SolverStats,
    ) -> Self {
        Self {
            heap,
            factory,
            csm,
            pfg,
            cg,
            stats,
            empty: PointsToSet::new(),
        }
    }

    /// Returns the points-to set of a context-sensitive variable.
    #[must_use]
    pub fn points_to(&self, var: CsVarId) -> &PointsToSet {
        self.pts_of(Pointer::Var(var))
    }

    /// Returns the union of a variable's points-to sets over all contexts.
    #[must_use]
    pub fn points_to_var(&self, var: VarId) -> PointsToSet {
        let mut merged = PointsToSet::new();
        for (cs_id, cs_var) in self.csm.vars() {
            if cs_var.var == var {
                for obj in self.points_to(cs_id).iter() {
                    merged.add(obj);
                }
            }
        }
        merged
    }

    /// Returns the contents of an instance field of a context-sensitive object.
    #[must_use]
    pub fn points_to_field(&self, obj: CsObjId, field: FieldId) -> &PointsToSet {
        self.pts_of(Pointer::InstanceField(obj, field))
    }

    /// Returns the union of `o.field` contents over every object a variable
    /// points to, in any context.
    #[must_use]
    pub fn points_to_var_field(&self, var: VarId, field: FieldId) -> PointsToSet {
        let mut merged = PointsToSet::new();
        for obj in self.points_to_var(var).iter() {
            for value in self.points_to_field(obj, field).iter() {
                merged.add(value);
            }
        }
        merged
    }

    /// Returns the element contents of a context-sensitive array object.
    #[must_use]
    pub fn points_to_array(&self, obj: CsObjId) -> &PointsToSet {
        self.pts_of(Pointer::ArrayIndex(obj))
    }

    /// Returns the contents of a static field.
    #[must_use]
    pub fn points_to_static(&self, field: FieldId) -> &PointsToSet {
        self.pts_of(Pointer::StaticField(field))
    }

    /// Returns the computed context-sensitive call graph.
    #[must_use]
    pub const fn call_graph(&self) -> &CsCallGraph {
        &self.cg
    }

    /// Returns the reachable context-sensitive methods in discovery order.
    #[must_use]
    pub fn reachable_methods(&self) -> &[CsMethodId] {
        self.cg.reachable_methods()
    }

    /// Returns the abstract heap the analysis built.
    #[must_use]
    pub const fn heap(&self) -> &HeapModel {
        &self.heap
    }

    /// Returns the context interning factory.
    #[must_use]
    pub const fn contexts(&self) -> &ContextFactory {
        &self.factory
    }

    /// Returns the canonical CS-element tables.
    #[must_use]
    pub const fn cs_elements(&self) -> &CsManager {
        &self.csm
    }

    /// Returns the pointer flow graph.
    #[must_use]
    pub const fn flow_graph(&self) -> &PointerFlowGraph {
        &self.pfg
    }

    /// Iterates over all pointers the analysis created.
    pub fn pointers(&self) -> impl Iterator<Item = (PointerId, Pointer)> + '_ {
        self.pfg.pointers()
    }

    /// Returns the aggregate metrics of the solver run.
    #[must_use]
    pub const fn stats(&self) -> SolverStats {
        self.stats
    }

    fn pts_of(&self, pointer: Pointer) -> &PointsToSet {
        self.pfg
            .lookup(pointer)
            .map_or(&self.empty, |id| self.pfg.pts(id))
    }
}
