//! # jscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! and traits from the jscope library. Import this module to get quick access to
//! the essential types for building program models and running pointer analyses.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all jscope operations
pub use crate::Error;

/// The result type used throughout jscope
pub use crate::Result;

// ================================================================================================
// Program Model
// ================================================================================================

/// Program registry and construction
pub use crate::ir::{MethodBuilder, Program, ProgramBuilder};

/// Stable element handles
pub use crate::ir::{ClassId, FieldId, MethodId, StmtId, VarId};

/// Class, method, and field metadata
pub use crate::ir::{
    Class, ClassFlags, ClassRc, Field, Method, MethodDescriptor, MethodFlags, MethodRef,
};

/// Statements and types
pub use crate::ir::{CallKind, Invoke, PrimitiveType, Stmt, StmtKind, Type, Var, VarOrigin};

// ================================================================================================
// Pointer Analysis
// ================================================================================================

/// Analysis entry points
pub use crate::analysis::pta::{AnalysisOptions, PointerAnalysis, PointerAnalysisResult};

/// Heap abstraction
pub use crate::analysis::pta::{HeapModel, HeapOptions, Obj, ObjId};

/// Contexts and context-sensitive elements
pub use crate::analysis::pta::{
    ContextElement, ContextFactory, ContextId, CsCallSiteId, CsManager, CsMethodId, CsObjId,
    CsVarId,
};

/// Context selection strategies
pub use crate::analysis::pta::{ContextSelector, GuidedVariant, SelectivePolicy, Sensitivity};

/// Pointer flow graph and call graph
pub use crate::analysis::pta::{
    CallEdge, CsCallGraph, Pointer, PointerFlowGraph, PointerId, PointsToSet, SolverStats,
};
