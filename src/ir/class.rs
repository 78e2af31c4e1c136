//! Class metadata for the program model.
//!
//! A [`Class`] records its name, access flags, superclass, implemented interfaces,
//! and the handles of its declared fields and methods. Member lists are append-only
//! vectors so that a class registered early can keep receiving members while the
//! registry is shared.

use std::sync::Arc;

use bitflags::bitflags;

use crate::ir::{ClassId, FieldId, MethodId};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Class access and property flags (`ACC_*` values from the class file format).
    pub struct ClassFlags: u32 {
        /// Declared `public`.
        const PUBLIC = 0x0001;
        /// Declared `final`; no subclasses allowed.
        const FINAL = 0x0010;
        /// Is an interface, not a class.
        const INTERFACE = 0x0200;
        /// Declared `abstract`; must not be instantiated.
        const ABSTRACT = 0x0400;
    }
}

/// Reference counted pointer to a [`Class`].
pub type ClassRc = Arc<Class>;

/// A class or interface in the program model.
///
/// Classes are registered once in the program registry and shared behind an [`Arc`].
/// The field and method lists are lock-free append-only vectors: the program builder
/// pushes into them as members are declared, and the analysis only ever iterates.
#[derive(Debug)]
pub struct Class {
    /// Handle of this class in the registry.
    pub id: ClassId,
    /// Fully qualified name, e.g. `java.lang.String`.
    pub name: String,
    /// Access and property flags.
    pub flags: ClassFlags,
    /// Direct superclass, `None` only for `java.lang.Object`.
    pub superclass: Option<ClassId>,
    /// Directly implemented interfaces.
    pub interfaces: Vec<ClassId>,
    /// Declared fields, in declaration order.
    pub fields: boxcar::Vec<FieldId>,
    /// Declared methods, in declaration order.
    pub methods: boxcar::Vec<MethodId>,
}

impl Class {
    /// Creates a new class with empty member lists.
    #[must_use]
    pub fn new(
        id: ClassId,
        name: String,
        flags: ClassFlags,
        superclass: Option<ClassId>,
        interfaces: Vec<ClassId>,
    ) -> Self {
        Self {
            id,
            name,
            flags,
            superclass,
            interfaces,
            fields: boxcar::Vec::new(),
            methods: boxcar::Vec::new(),
        }
    }

    /// Returns `true` if this is an interface.
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::INTERFACE)
    }

    /// Returns `true` if this class cannot be instantiated directly.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.flags.contains(ClassFlags::ABSTRACT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_flags() {
        let c = Class::new(
            ClassId(1),
            "p.A".to_string(),
            ClassFlags::PUBLIC | ClassFlags::ABSTRACT,
            Some(ClassId(0)),
            Vec::new(),
        );
        assert!(c.is_abstract());
        assert!(!c.is_interface());
        assert_eq!(c.methods.count(), 0);
    }
}
