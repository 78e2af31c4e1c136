// Copyright 2026 The jscope developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # jscope
//!
//! A whole-program, context-sensitive pointer analysis framework for JVM bytecode.
//! `jscope` computes points-to sets and discovers the program's call graph in a
//! single worklist fixpoint, with pluggable context sensitivity (call-site,
//! object, and type sensitivity with k-limiting) and configurable heap merging.
//!
//! ## Features
//!
//! - **On-the-fly call graph** - callees are discovered as receiver points-to
//!   sets are populated, during the same fixpoint that computes them
//! - **Pluggable context sensitivity** - `ci`, `k-call`, `k-obj`, `k-type`,
//!   fixed-depth specializations, selective and externally guided policies
//! - **Bounded heap abstraction** - optional merging of string constants,
//!   string builders, and exception objects to trade precision for scale
//! - **Canonical everything** - contexts, abstract objects, and
//!   context-sensitive elements are interned in append-only arenas, so a
//!   converged result is safe to read from any thread without locking
//!
//! ## Quick Start
//!
//! Programs are assembled through the [`ir::ProgramBuilder`] (bytecode loading is
//! a separate concern); the analysis is configured and run through
//! [`analysis::pta::PointerAnalysis`]:
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
//!
//! let mut main = b.static_method(a, "main");
//! let va = main.var("a", Type::Class(a));
//! main.alloc(va, a);
//! let foo = main.method_ref(a, "foo", MethodDescriptor::void());
//! main.invoke_virtual(va, foo, vec![], None)?;
//! let main = main.finish();
//! b.set_entry(main)?;
//! let program = b.finish();
//!
//! let analysis = PointerAnalysis::new(&program, AnalysisOptions::default())?;
//! let result = analysis.solve()?;
//!
//! assert_eq!(result.points_to_var(va).len(), 1);
//! assert_eq!(result.call_graph().edge_count(), 1);
//! # Ok::<(), jscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `jscope` is organized into two layers:
//!
//! - [`ir`] - the program model: classes, fields, methods, variables,
//!   three-address statements, and the class-hierarchy queries (subtyping, field
//!   resolution, virtual dispatch) the analysis consumes
//! - [`analysis`] - the analyses; [`analysis::pta`] is the context-sensitive
//!   pointer analysis core: heap model, context abstraction, context-sensitive
//!   elements, context selectors, pointer flow graph, and the worklist solver
//!
//! The dependency order inside the pointer analysis is strictly leaf to root:
//! the heap model knows nothing about contexts, contexts know nothing about the
//! flow graph, and only the solver ties everything together.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result). Configuration
//! errors (malformed sensitivity descriptors, invalid guided plans) surface at
//! analysis construction; resolution errors (failed dispatch) are fatal to a
//! run; missing method bodies degrade gracefully to warnings via the `log`
//! facade:
//!
//! ```rust
//! use jscope::{Error, analysis::pta::{AnalysisOptions, PointerAnalysis}};
//! use jscope::ir::ProgramBuilder;
//!
//! let program = ProgramBuilder::new().finish();
//! let options = AnalysisOptions {
//!     sensitivity: "k-call".to_string(),
//!     ..AnalysisOptions::default()
//! };
//! match PointerAnalysis::new(&program, options) {
//!     Err(Error::Config { message, .. }) => println!("bad config: {message}"),
//!     _ => unreachable!(),
//! }
//! ```

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the jscope library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use jscope::prelude::*;
///
/// let program = ProgramBuilder::new().finish();
/// let analysis = PointerAnalysis::new(&program, AnalysisOptions::default())?;
/// # Ok::<(), jscope::Error>(())
/// ```
pub mod prelude;

/// Program model: classes, methods, variables, statements, hierarchy queries.
///
/// See [`ir::Program`] for the registry and [`ir::ProgramBuilder`] for
/// construction.
pub mod ir;

/// Whole-program analyses over the [`ir`] model.
///
/// The context-sensitive pointer analysis lives in [`analysis::pta`].
pub mod analysis;

/// `jscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. This is used consistently throughout the crate for all
/// fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `jscope` Error type
///
/// The main error type for all operations in this crate. See [`Error`] for the
/// taxonomy: configuration errors, resolution errors, and program construction
/// errors.
pub use error::Error;
