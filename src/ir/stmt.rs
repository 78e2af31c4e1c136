//! Three-address statements consumed by the pointer analysis.
//!
//! This is the statement surface the analysis reacts to: allocations, copies,
//! field and array accesses, invokes, and returns. Statements live in a
//! program-wide arena and every statement records its containing method, so a
//! [`crate::ir::StmtId`] doubles as a stable allocation-site or call-site
//! identity.

use strum::Display;

use crate::ir::{ClassId, FieldId, MethodId, MethodRef, Type, VarId};

/// The dispatch kind of an invoke statement.
///
/// Mirrors the four JVM invocation opcodes relevant to call-graph construction.
/// `invokedynamic` is out of scope for this model.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// `invokestatic`: no receiver, resolved at the declared class.
    #[strum(serialize = "static")]
    Static,
    /// `invokespecial`: constructors, private methods, and `super` calls.
    #[strum(serialize = "special")]
    Special,
    /// `invokevirtual`: dispatched on the receiver's runtime class.
    #[strum(serialize = "virtual")]
    Virtual,
    /// `invokeinterface`: dispatched on the receiver's runtime class through an interface.
    #[strum(serialize = "interface")]
    Interface,
}

impl CallKind {
    /// Returns `true` if this call selects its target from the receiver's runtime type.
    ///
    /// Virtual and interface calls can only be resolved once the receiver's
    /// points-to set is populated; static and special calls resolve eagerly.
    #[must_use]
    pub const fn is_dispatched(&self) -> bool {
        matches!(self, Self::Virtual | Self::Interface)
    }
}

/// An invoke statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoke {
    /// Dispatch kind of the call.
    pub kind: CallKind,
    /// The declared target of the call.
    pub target: MethodRef,
    /// Receiver variable, present iff the call kind takes a receiver.
    pub recv: Option<VarId>,
    /// Argument variables, one per descriptor parameter.
    pub args: Vec<VarId>,
    /// Variable receiving the return value, if the result is used.
    pub result: Option<VarId>,
}

/// A statement in a method body.
#[derive(Debug, Clone)]
pub struct Stmt {
    /// Containing method.
    pub method: MethodId,
    /// What the statement does.
    pub kind: StmtKind,
}

/// The operation performed by a statement.
///
/// This is a closed set: the solver exhaustively matches over it, and each variant
/// maps to exactly one rule of the pointer analysis.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `lhs = new C()`: an allocation site.
    New {
        /// Variable receiving the fresh object.
        lhs: VarId,
        /// Class being instantiated.
        class: ClassId,
    },
    /// `lhs = new T[..]`: an array allocation site (length-insensitive).
    NewArray {
        /// Variable receiving the fresh array.
        lhs: VarId,
        /// Element type of the array.
        elem: Type,
    },
    /// `lhs = "literal"`: a string constant load.
    AssignLiteral {
        /// Variable receiving the constant object.
        lhs: VarId,
        /// The literal value.
        literal: String,
    },
    /// `lhs = rhs`: a local copy.
    Copy {
        /// Target variable.
        lhs: VarId,
        /// Source variable.
        rhs: VarId,
    },
    /// `lhs = base.field`: an instance field load.
    LoadField {
        /// Variable receiving the field value.
        lhs: VarId,
        /// Base object variable.
        base: VarId,
        /// The accessed field.
        field: FieldId,
    },
    /// `base.field = rhs`: an instance field store.
    StoreField {
        /// Base object variable.
        base: VarId,
        /// The accessed field.
        field: FieldId,
        /// Stored variable.
        rhs: VarId,
    },
    /// `lhs = C.field`: a static field load.
    LoadStatic {
        /// Variable receiving the field value.
        lhs: VarId,
        /// The accessed field.
        field: FieldId,
    },
    /// `C.field = rhs`: a static field store.
    StoreStatic {
        /// The accessed field.
        field: FieldId,
        /// Stored variable.
        rhs: VarId,
    },
    /// `lhs = array[*]`: an array element load (index-insensitive).
    LoadArray {
        /// Variable receiving the element.
        lhs: VarId,
        /// Array variable.
        array: VarId,
    },
    /// `array[*] = rhs`: an array element store (index-insensitive).
    StoreArray {
        /// Array variable.
        array: VarId,
        /// Stored variable.
        rhs: VarId,
    },
    /// A method invocation.
    Invoke(Invoke),
    /// `return` or `return v`.
    Return(Option<VarId>),
}

impl Stmt {
    /// Returns the invoke payload if this statement is a call.
    #[must_use]
    pub const fn as_invoke(&self) -> Option<&Invoke> {
        match &self.kind {
            StmtKind::Invoke(invoke) => Some(invoke),
            _ => None,
        }
    }

    /// Returns `true` if this statement is an allocation site.
    #[must_use]
    pub const fn is_allocation(&self) -> bool {
        matches!(self.kind, StmtKind::New { .. } | StmtKind::NewArray { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_kind_dispatch() {
        assert!(CallKind::Virtual.is_dispatched());
        assert!(CallKind::Interface.is_dispatched());
        assert!(!CallKind::Static.is_dispatched());
        assert!(!CallKind::Special.is_dispatched());
    }

    #[test]
    fn test_call_kind_display() {
        assert_eq!(CallKind::Static.to_string(), "static");
        assert_eq!(CallKind::Interface.to_string(), "interface");
    }

    #[test]
    fn test_stmt_classification() {
        let alloc = Stmt {
            method: MethodId(0),
            kind: StmtKind::New {
                lhs: VarId(0),
                class: ClassId(0),
            },
        };
        assert!(alloc.is_allocation());
        assert!(alloc.as_invoke().is_none());
    }
}
