//! Central program registry and class hierarchy queries.
//!
//! This module provides the [`Program`], a thread-safe registry for all classes,
//! fields, methods, variables, and statements of the program under analysis. It
//! serves as the central hub for element lookup and for the class-hierarchy queries
//! the pointer analysis relies on: subtype tests, field resolution, and virtual
//! dispatch.
//!
//! # Registry Architecture
//!
//! The registry uses the same storage split throughout:
//!
//! - **Ordered primary storage**: classes live in a lock-free skip list keyed by
//!   [`ClassId`], so iteration follows registration order.
//! - **Name index**: a concurrent map from fully qualified class names to handles.
//! - **Flat arenas**: fields, methods, variables, and statements live in append-only
//!   vectors indexed by their handles.
//!
//! # Thread Safety
//!
//! All collections are lock-free; a fully built program can be shared and queried
//! from any number of threads without synchronization. Construction itself goes
//! through [`crate::ir::ProgramBuilder`], which owns the program exclusively until
//! `finish()`.
//!
//! # Well-Known Classes
//!
//! A handful of `java.lang` classes have meaning to the analysis itself (string
//! constants, builder merging, exception merging). They are pre-registered by the
//! builder the same way primitive types are pre-registered in a metadata registry,
//! and can always be resolved by name.

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    ir::{
        Class, ClassId, ClassRc, Field, FieldId, Method, MethodDescriptor, MethodId, MethodRef,
        Stmt, StmtId, Type, Var, VarId,
    },
    Error, Result,
};

/// Fully qualified name of `java.lang.Object`.
pub const OBJECT: &str = "java.lang.Object";
/// Fully qualified name of `java.lang.String`.
pub const STRING: &str = "java.lang.String";
/// Fully qualified name of `java.lang.StringBuilder`.
pub const STRING_BUILDER: &str = "java.lang.StringBuilder";
/// Fully qualified name of `java.lang.StringBuffer`.
pub const STRING_BUFFER: &str = "java.lang.StringBuffer";
/// Fully qualified name of `java.lang.Throwable`.
pub const THROWABLE: &str = "java.lang.Throwable";

/// The whole program under analysis.
///
/// A `Program` is the IR collaborator of the pointer analysis: it owns every class,
/// method, variable, and statement, and answers the hierarchy queries (dispatch,
/// field resolution, subtype tests) the solver issues while discovering code.
///
/// Programs are immutable once built; all pointer-analysis state is kept outside
/// the registry, so one program can back any number of concurrent analyses.
///
/// # Example
///
/// ```rust
/// use jscope::ir::{ProgramBuilder, program::OBJECT};
///
/// let program = ProgramBuilder::new().finish();
/// let object = program.class_by_name(OBJECT).unwrap();
/// assert!(object.superclass.is_none());
/// ```
#[derive(Debug)]
pub struct Program {
    /// Primary class storage, ordered by handle.
    pub(crate) classes: SkipMap<ClassId, ClassRc>,
    /// Name index: fully qualified name to class handle.
    pub(crate) classes_by_name: DashMap<String, ClassId>,
    /// Field arena.
    pub(crate) fields: boxcar::Vec<Field>,
    /// Method arena.
    pub(crate) methods: boxcar::Vec<Method>,
    /// Variable arena.
    pub(crate) vars: boxcar::Vec<Var>,
    /// Statement arena.
    pub(crate) stmts: boxcar::Vec<Stmt>,
    /// Entry-point methods, in registration order.
    pub(crate) entry_points: Vec<MethodId>,
}

impl Program {
    /// Creates an empty program with no classes registered.
    pub(crate) fn empty() -> Self {
        Self {
            classes: SkipMap::new(),
            classes_by_name: DashMap::new(),
            fields: boxcar::Vec::new(),
            methods: boxcar::Vec::new(),
            vars: boxcar::Vec::new(),
            stmts: boxcar::Vec::new(),
            entry_points: Vec::new(),
        }
    }

    /// Returns a class by handle.
    #[must_use]
    pub fn class(&self, id: ClassId) -> Option<ClassRc> {
        self.classes.get(&id).map(|entry| entry.value().clone())
    }

    /// Returns a class by its fully qualified name.
    #[must_use]
    pub fn class_by_name(&self, name: &str) -> Option<ClassRc> {
        self.class_id(name).and_then(|id| self.class(id))
    }

    /// Returns the handle of a class by its fully qualified name.
    #[must_use]
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.classes_by_name.get(name).map(|entry| *entry.value())
    }

    /// Returns a field by handle.
    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id.index())
    }

    /// Returns a method by handle.
    #[must_use]
    pub fn method(&self, id: MethodId) -> Option<&Method> {
        self.methods.get(id.index())
    }

    /// Returns a variable by handle.
    #[must_use]
    pub fn var(&self, id: VarId) -> Option<&Var> {
        self.vars.get(id.index())
    }

    /// Returns a statement by handle.
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> Option<&Stmt> {
        self.stmts.get(id.index())
    }

    /// Returns the entry-point methods of the program.
    #[must_use]
    pub fn entry_points(&self) -> &[MethodId] {
        &self.entry_points
    }

    /// Returns the number of registered classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Returns the number of registered methods.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.count()
    }

    /// Returns the number of statements in the program.
    #[must_use]
    pub fn stmt_count(&self) -> usize {
        self.stmts.count()
    }

    /// Iterates over all classes in registration order.
    pub fn class_iter(&self) -> impl Iterator<Item = ClassRc> + '_ {
        self.classes.iter().map(|entry| entry.value().clone())
    }

    /// Iterates over the superclass chain of a class, starting at the class itself.
    pub fn superclass_chain(&self, id: ClassId) -> impl Iterator<Item = ClassRc> + '_ {
        let mut current = self.class(id);
        std::iter::from_fn(move || {
            let class = current.take()?;
            current = class.superclass.and_then(|sup| self.class(sup));
            Some(class)
        })
    }

    /// Returns `true` if `sub` is `sup` or a transitive subtype of it.
    ///
    /// Walks the superclass chain and, from every class on it, the transitively
    /// implemented interfaces.
    #[must_use]
    pub fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
        for class in self.superclass_chain(sub) {
            if class.id == sup {
                return true;
            }
            if class
                .interfaces
                .iter()
                .any(|&iface| self.is_subclass_of(iface, sup))
            {
                return true;
            }
        }
        false
    }

    /// Resolves a field by name, starting at `class` and walking up the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldNotFound`] if no class on the superclass chain
    /// declares a field of the given name.
    pub fn resolve_field(&self, class: ClassId, name: &str) -> Result<FieldId> {
        for candidate in self.superclass_chain(class) {
            for (_, &fid) in candidate.fields.iter() {
                if let Some(field) = self.field(fid) {
                    if field.name == name {
                        return Ok(fid);
                    }
                }
            }
        }
        Err(Error::FieldNotFound {
            class: self.class_name(class),
            field: name.to_string(),
        })
    }

    /// Resolves a method reference to its declared target.
    ///
    /// This is the resolution used by static and special calls: the declared class
    /// and its superclasses are searched for a matching subsignature, without any
    /// receiver-type dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MethodNotFound`] if no class on the chain declares a method
    /// with the referenced subsignature.
    pub fn resolve_method(&self, mref: &MethodRef) -> Result<MethodId> {
        for candidate in self.superclass_chain(mref.class) {
            if let Some(mid) = self.find_declared(&candidate, &mref.name, &mref.descriptor) {
                return Ok(mid);
            }
        }
        Err(Error::MethodNotFound {
            class: self.class_name(mref.class),
            method: self.subsignature(&mref.name, &mref.descriptor),
        })
    }

    /// Resolves a virtual or interface call against a concrete receiver class.
    ///
    /// Walks the superclass chain of `recv_class` looking for a *concrete* method
    /// whose subsignature matches the reference. This is the single dispatch
    /// primitive of the analysis: the solver calls it once per (receiver object,
    /// call site) pair as receiver points-to sets grow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedDispatch`] if the chain contains no applicable
    /// concrete method. This indicates an unsound program model (for example, an
    /// allocation of an abstract class) and is fatal to the analysis run.
    pub fn dispatch(&self, recv_class: ClassId, mref: &MethodRef) -> Result<MethodId> {
        for candidate in self.superclass_chain(recv_class) {
            if let Some(mid) = self.find_declared(&candidate, &mref.name, &mref.descriptor) {
                let method = self.method(mid).expect("method arena entry should exist");
                if !method.is_abstract() {
                    return Ok(mid);
                }
            }
        }
        Err(Error::UnresolvedDispatch {
            class: self.class_name(recv_class),
            method: self.subsignature(&mref.name, &mref.descriptor),
        })
    }

    /// Finds a method declared directly on `class` with the given subsignature.
    fn find_declared(
        &self,
        class: &Class,
        name: &str,
        descriptor: &MethodDescriptor,
    ) -> Option<MethodId> {
        for (_, &mid) in class.methods.iter() {
            if let Some(method) = self.method(mid) {
                if method.matches(name, descriptor) {
                    return Some(mid);
                }
            }
        }
        None
    }

    /// Renders a type in Java source form (`int`, `p.A`, `java.lang.String[]`).
    #[must_use]
    pub fn type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Class(id) => self.class_name(*id),
            Type::Array(elem) => format!("{}[]", self.type_name(elem)),
            Type::Primitive(p) => p.to_string(),
            Type::Null => "null".to_string(),
        }
    }

    /// Renders a subsignature (`name(param,param)`).
    #[must_use]
    pub fn subsignature(&self, name: &str, descriptor: &MethodDescriptor) -> String {
        let params: Vec<String> = descriptor
            .params
            .iter()
            .map(|ty| self.type_name(ty))
            .collect();
        format!("{}({})", name, params.join(","))
    }

    /// Returns the fully qualified name of a class, or a placeholder for an
    /// unknown handle.
    #[must_use]
    pub fn class_name(&self, id: ClassId) -> String {
        self.class(id)
            .map_or_else(|| id.to_string(), |class| class.name.clone())
    }
}
