//! Context-sensitive pointer analysis.
//!
//! This module implements a whole-program points-to analysis with on-the-fly
//! call-graph construction. The analysis is organized leaf to root:
//!
//! - [`heap`] - abstract objects and the memoized heap model
//! - [`context`] - interned, k-limited contexts
//! - [`cs`] - canonical context-sensitive elements (variables, objects, call
//!   sites, methods)
//! - [`selector`] - pluggable context selection strategies
//! - [`pfg`] - the pointer flow graph and points-to sets
//! - [`callgraph`] - the context-sensitive call graph
//! - [`solver`] - the worklist fixpoint engine
//! - [`result`] - the converged, read-only query surface
//!
//! # Usage
//!
//! ```rust
//! use jscope::analysis::pta::{AnalysisOptions, PointerAnalysis};
//! use jscope::ir::{MethodDescriptor, ProgramBuilder, Type};
//!
//! // class A { void foo() {} }
//! // static void main() { A a = new A(); a.foo(); }
//! let mut b = ProgramBuilder::new();
//! let a = b.add_class("A").unwrap();
//! b.instance_method(a, "foo").finish();
//! let mut main = b.static_method(a, "main");
//! let va = main.var("a", Type::Class(a));
//! main.alloc(va, a);
//! let foo = main.method_ref(a, "foo", MethodDescriptor::void());
//! main.invoke_virtual(va, foo, vec![], None).unwrap();
//! let main = main.finish();
//! b.set_entry(main).unwrap();
//! let program = b.finish();
//!
//! let analysis = PointerAnalysis::new(&program, AnalysisOptions::default())?;
//! let result = analysis.solve()?;
//! assert_eq!(result.points_to_var(va).len(), 1);
//! assert_eq!(result.call_graph().edge_count(), 1);
//! # Ok::<(), jscope::Error>(())
//! ```
//!
//! # Configuration
//!
//! [`AnalysisOptions`] is read once at construction. The sensitivity descriptor
//! selects the context policy (`ci`, `k-call[-hk]`, `k-obj[-hk]`, `k-type[-hk]`);
//! a guided plan, when present, takes precedence over the descriptor; a selective
//! policy wraps whichever selector was chosen. All configuration errors surface
//! from [`PointerAnalysis::new`], never mid-solve.

pub mod callgraph;
pub mod context;
pub mod cs;
pub mod heap;
pub mod pfg;
pub mod result;
pub mod selector;
pub mod solver;

pub use callgraph::{CallEdge, CsCallGraph};
pub use context::{ContextElement, ContextFactory, ContextId};
pub use cs::{
    CsCallSite, CsCallSiteId, CsManager, CsMethod, CsMethodId, CsObj, CsObjId, CsVar, CsVarId,
};
pub use heap::{HeapModel, HeapOptions, Obj, ObjId};
pub use pfg::{Pointer, PointerFlowGraph, PointerId, PointsToSet};
pub use result::PointerAnalysisResult;
pub use selector::{
    ContextSelector, GuidedVariant, SelectionCx, SelectivePolicy, Sensitivity,
};
pub use solver::SolverStats;

use std::collections::HashMap;

use crate::{
    ir::{MethodId, Program},
    Result,
};

/// Configuration of a pointer analysis run.
///
/// Consumed once by [`PointerAnalysis::new`]; nothing is re-read mid-analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Sensitivity descriptor: `ci` or `k-kind[-hk]` with kind one of
    /// `call`, `obj`, `type`.
    pub sensitivity: String,
    /// Heap-merging flags.
    pub heap: HeapOptions,
    /// Optional selective policy wrapped around the chosen selector.
    pub selective: Option<SelectivePolicy>,
    /// Optional guided plan (method to variant name); takes precedence over
    /// `sensitivity` when present.
    pub guided: Option<HashMap<MethodId, String>>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            sensitivity: "ci".to_string(),
            heap: HeapOptions::default(),
            selective: None,
            guided: None,
        }
    }
}

/// A configured pointer analysis over one program.
///
/// Construction validates the whole configuration (descriptor syntax, guided
/// variant names); [`PointerAnalysis::solve`] runs the worklist engine to its
/// fixpoint. The analysis itself holds no mutable state, so one instance can be
/// solved repeatedly.
#[derive(Debug)]
pub struct PointerAnalysis<'p> {
    program: &'p Program,
    selector: ContextSelector,
    heap_options: HeapOptions,
}

impl<'p> PointerAnalysis<'p> {
    /// Creates an analysis from options, surfacing every configuration error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] for a malformed sensitivity descriptor or
    /// an unknown variant name in the guided plan.
    pub fn new(program: &'p Program, options: AnalysisOptions) -> Result<Self> {
        // The descriptor is validated even when a guided plan overrides it, so
        // that a typo never ships silently inside a guided configuration.
        let parsed = Sensitivity::parse(&options.sensitivity)?;
        let base = match &options.guided {
            Some(plan) => ContextSelector::guided(plan)?,
            None => ContextSelector::from_sensitivity(parsed),
        };
        let selector = match options.selective {
            Some(policy) => ContextSelector::Selective {
                inner: Box::new(base),
                policy,
            },
            None => base,
        };

        Ok(Self {
            program,
            selector,
            heap_options: options.heap,
        })
    }

    /// Returns the selector this analysis will use.
    #[must_use]
    pub const fn selector(&self) -> &ContextSelector {
        &self.selector
    }

    /// Runs the analysis to its fixpoint.
    ///
    /// # Errors
    ///
    /// Returns a resolution error ([`crate::Error::UnresolvedDispatch`],
    /// [`crate::Error::MethodNotFound`]) if the program model is unsound for a
    /// call the analysis discovers; such errors are fatal to the run.
    pub fn solve(&self) -> Result<PointerAnalysisResult> {
        solver::Solver::new(self.program, &self.selector, self.heap_options).solve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ir::ProgramBuilder, Error};

    #[test]
    fn test_malformed_descriptor_fails_construction() {
        let program = ProgramBuilder::new().finish();
        let options = AnalysisOptions {
            sensitivity: "two-obj".to_string(),
            ..AnalysisOptions::default()
        };
        assert!(matches!(
            PointerAnalysis::new(&program, options),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_guided_plan_is_validated_eagerly() {
        let program = ProgramBuilder::new().finish();
        let mut plan = HashMap::new();
        plan.insert(MethodId(0), "3-ctx".to_string());
        let options = AnalysisOptions {
            guided: Some(plan),
            ..AnalysisOptions::default()
        };
        assert!(matches!(
            PointerAnalysis::new(&program, options),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_selective_wraps_selector() {
        let program = ProgramBuilder::new().finish();
        let options = AnalysisOptions {
            sensitivity: "2-obj".to_string(),
            selective: Some(SelectivePolicy::default()),
            ..AnalysisOptions::default()
        };
        let analysis = PointerAnalysis::new(&program, options).unwrap();
        assert!(matches!(
            analysis.selector(),
            ContextSelector::Selective { .. }
        ));
    }
}
