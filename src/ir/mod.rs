//! Program model consumed by the analyses.
//!
//! This module is the IR collaborator of the pointer analysis: a whole-program
//! registry of classes, fields, methods, variables, and three-address statements,
//! together with the class-hierarchy queries (subtype tests, field resolution,
//! virtual dispatch) that drive on-the-fly call-graph construction.
//!
//! # Key Types
//!
//! - [`Program`] - the frozen, shareable program registry
//! - [`ProgramBuilder`] / [`MethodBuilder`] - programmatic construction
//! - [`Stmt`] / [`StmtKind`] - the statement surface the solver reacts to
//! - [`CallKind`] - the four JVM invocation kinds
//! - [`ClassId`], [`FieldId`], [`MethodId`], [`VarId`], [`StmtId`] - stable handles
//!
//! # Construction
//!
//! Programs are assembled through the builder and frozen by
//! [`ProgramBuilder::finish`]; see [`builder`] for a worked example. After that
//! point the model is immutable and every handle stays valid for its lifetime.

pub mod builder;
pub mod class;
pub mod field;
pub mod ids;
pub mod method;
pub mod program;
pub mod stmt;
pub mod types;
pub mod var;

pub use builder::{MethodBuilder, ProgramBuilder};
pub use class::{Class, ClassFlags, ClassRc};
pub use field::Field;
pub use ids::{ClassId, FieldId, MethodId, StmtId, VarId};
pub use method::{Method, MethodDescriptor, MethodFlags, MethodRef};
pub use program::Program;
pub use stmt::{CallKind, Invoke, Stmt, StmtKind};
pub use types::{PrimitiveType, Type};
pub use var::{Var, VarOrigin};
