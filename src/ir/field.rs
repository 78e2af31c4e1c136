//! Field metadata for the program model.

use crate::ir::{ClassId, Type};

/// A declared field.
///
/// Fields are identified by their [`crate::ir::FieldId`] handle; the analysis uses the
/// handle both for instance-field pointers (paired with an abstract object) and for
/// static-field pointers (on their own). Whether a field is static is a property of
/// the statements that access it, mirroring how bytecode distinguishes `getfield`
/// from `getstatic`.
#[derive(Debug, Clone)]
pub struct Field {
    /// Class that declares this field.
    pub class: ClassId,
    /// Field name.
    pub name: String,
    /// Declared type of the field.
    pub ty: Type,
}

impl Field {
    /// Creates a new field record.
    #[must_use]
    pub const fn new(class: ClassId, name: String, ty: Type) -> Self {
        Self { class, name, ty }
    }
}
