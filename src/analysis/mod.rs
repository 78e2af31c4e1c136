//! Program analysis infrastructure.
//!
//! This module hosts the whole-program analyses built on top of the [`crate::ir`]
//! program model. Its centerpiece is the context-sensitive pointer analysis in
//! [`pta`], which computes points-to sets and the program's call graph in one
//! interleaved fixpoint.
//!
//! # Usage
//!
//! ```rust,ignore
//! use jscope::analysis::pta::{AnalysisOptions, PointerAnalysis};
//!
//! let analysis = PointerAnalysis::new(&program, AnalysisOptions::default())?;
//! let result = analysis.solve()?;
//! for &method in result.reachable_methods() {
//!     // inspect the converged call graph
//! }
//! ```

pub mod pta;

// Re-export the primary entry points at module level
pub use pta::{AnalysisOptions, PointerAnalysis, PointerAnalysisResult};
