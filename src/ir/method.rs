//! Method metadata for the program model.
//!
//! This module defines the flags, descriptor, reference, and record types used to
//! represent methods. A method's *subsignature* (name plus descriptor) is the unit
//! of dispatch: virtual dispatch walks the receiver's superclass chain looking for
//! a concrete method with a matching subsignature.

use bitflags::bitflags;

use crate::ir::{ClassId, MethodId, StmtId, Type, VarId};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method access and property flags (`ACC_*` values from the class file format).
    pub struct MethodFlags: u32 {
        /// Declared `public`.
        const PUBLIC = 0x0001;
        /// Declared `private`.
        const PRIVATE = 0x0002;
        /// Declared `protected`.
        const PROTECTED = 0x0004;
        /// Declared `static`; no `this` reference.
        const STATIC = 0x0008;
        /// Declared `final`; may not be overridden.
        const FINAL = 0x0010;
        /// Declared `native`; implemented outside the bytecode, so no body.
        const NATIVE = 0x0100;
        /// Declared `abstract`; no body, must be overridden.
        const ABSTRACT = 0x0400;
        /// Generated by a compiler, not present in source.
        const SYNTHETIC = 0x1000;
    }
}

/// Parameter and return types of a method.
///
/// Two methods with equal name and equal descriptor have the same subsignature and
/// therefore override each other across a superclass edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Parameter types, in declaration order (excluding `this`).
    pub params: Vec<Type>,
    /// Return type, `None` for `void`.
    pub ret: Option<Type>,
}

impl MethodDescriptor {
    /// Creates a new descriptor.
    #[must_use]
    pub const fn new(params: Vec<Type>, ret: Option<Type>) -> Self {
        Self { params, ret }
    }

    /// The descriptor of a `void` method with no parameters.
    #[must_use]
    pub const fn void() -> Self {
        Self {
            params: Vec::new(),
            ret: None,
        }
    }
}

/// A symbolic reference to a method, as it appears at a call site.
///
/// The referenced class is the *declared* owner; the actual target is determined by
/// resolution (static/special calls) or by virtual dispatch on the receiver object's
/// runtime type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// Class the reference names as the owner.
    pub class: ClassId,
    /// Method name.
    pub name: String,
    /// Parameter and return types.
    pub descriptor: MethodDescriptor,
}

impl MethodRef {
    /// Creates a new method reference.
    #[must_use]
    pub const fn new(class: ClassId, name: String, descriptor: MethodDescriptor) -> Self {
        Self {
            class,
            name,
            descriptor,
        }
    }
}

/// A method in the program model.
///
/// Bodies are ordered statement lists over the program-wide statement arena.
/// Native and abstract methods have no body; the solver treats calls to them as
/// no-op callees (logged, never fatal).
#[derive(Debug)]
pub struct Method {
    /// Handle of this method.
    pub id: MethodId,
    /// Declaring class.
    pub class: ClassId,
    /// Method name, e.g. `foo` or `<init>`.
    pub name: String,
    /// Parameter and return types.
    pub descriptor: MethodDescriptor,
    /// Access and property flags.
    pub flags: MethodFlags,
    /// The `this` variable, present iff the method is an instance method.
    pub this_var: Option<VarId>,
    /// Parameter variables, one per descriptor parameter.
    pub params: Vec<VarId>,
    /// Variables returned by `return` statements in the body.
    pub ret_vars: Vec<VarId>,
    /// Body statements in order, `None` for native/abstract methods.
    pub body: Option<Vec<StmtId>>,
}

impl Method {
    /// Returns `true` if the method is `static`.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    /// Returns `true` if the method is `abstract`.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT)
    }

    /// Returns `true` if the method is `native`.
    #[must_use]
    pub const fn is_native(&self) -> bool {
        self.flags.contains(MethodFlags::NATIVE)
    }

    /// Returns `true` if the method has an analyzable body.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Returns `true` if this method's subsignature matches the given name and descriptor.
    #[must_use]
    pub fn matches(&self, name: &str, descriptor: &MethodDescriptor) -> bool {
        self.name == name && &self.descriptor == descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::PrimitiveType;

    #[test]
    fn test_subsignature_match() {
        let m = Method {
            id: MethodId(0),
            class: ClassId(0),
            name: "foo".to_string(),
            descriptor: MethodDescriptor::new(vec![Type::Primitive(PrimitiveType::Int)], None),
            flags: MethodFlags::PUBLIC,
            this_var: Some(VarId(0)),
            params: vec![VarId(1)],
            ret_vars: Vec::new(),
            body: Some(Vec::new()),
        };

        assert!(m.matches(
            "foo",
            &MethodDescriptor::new(vec![Type::Primitive(PrimitiveType::Int)], None)
        ));
        assert!(!m.matches("foo", &MethodDescriptor::void()));
        assert!(!m.matches("bar", &m.descriptor.clone()));
    }

    #[test]
    fn test_body_presence() {
        let mut m = Method {
            id: MethodId(0),
            class: ClassId(0),
            name: "nativeOp".to_string(),
            descriptor: MethodDescriptor::void(),
            flags: MethodFlags::PUBLIC | MethodFlags::NATIVE,
            this_var: Some(VarId(0)),
            params: Vec::new(),
            ret_vars: Vec::new(),
            body: None,
        };
        assert!(m.is_native());
        assert!(!m.has_body());

        m.body = Some(Vec::new());
        assert!(m.has_body());
    }
}
