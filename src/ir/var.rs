//! Variables of the three-address IR.

use crate::ir::{MethodId, Type};

/// Origin of a variable within its method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarOrigin {
    /// The implicit `this` reference of an instance method.
    This,
    /// A declared parameter with the given position.
    Param(u16),
    /// A local or compiler-introduced temporary.
    Local,
}

/// A variable in a method body.
///
/// Variables are the atoms of the pointer flow graph: every reference-typed
/// variable, paired with a calling context, becomes a pointer node. Variables are
/// registered in a program-global arena, so a [`crate::ir::VarId`] alone is enough
/// to identify the variable and its containing method.
#[derive(Debug, Clone)]
pub struct Var {
    /// Containing method.
    pub method: MethodId,
    /// Source-level or synthetic name.
    pub name: String,
    /// Declared type.
    pub ty: Type,
    /// How this variable came to exist.
    pub origin: VarOrigin,
}

impl Var {
    /// Creates a new variable record.
    #[must_use]
    pub const fn new(method: MethodId, name: String, ty: Type, origin: VarOrigin) -> Self {
        Self {
            method,
            name,
            ty,
            origin,
        }
    }

    /// Returns `true` if this variable can hold heap references.
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        self.ty.is_reference()
    }
}
