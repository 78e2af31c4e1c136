//! Abstract heap model.
//!
//! The heap model turns allocation sites, string literals, and synthetic
//! environment effects into abstract objects ([`Obj`]), and owns the tables that
//! make object creation idempotent: asking twice for the object of the same
//! allocation site, literal, or mock key always yields the same [`ObjId`].
//!
//! # Merging
//!
//! To bound heap size, configuration flags ([`HeapOptions`]) can direct the model
//! to collapse whole families of allocations into a single [`Obj::Merged`] per
//! type: string constants, `StringBuilder`/`StringBuffer` instances, and
//! `Throwable` subtypes. Merging is decided once from static configuration and
//! never changes during analysis; the underlying objects are still recorded as
//! members of their merged representative so clients can enumerate what was
//! collapsed.

use std::fmt;
use std::sync::OnceLock;

use dashmap::DashMap;

use crate::ir::{
    program::{STRING, STRING_BUFFER, STRING_BUILDER, THROWABLE},
    ClassId, MethodId, Program, StmtId, StmtKind, Type,
};

/// Handle to an abstract object in the heap model's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub(crate) u32);

impl ObjId {
    /// Returns the arena index of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// An abstract heap object.
///
/// The four variants form a closed set; every analysis rule matches over them
/// directly. Equality of objects is equality of handles: the [`HeapModel`]
/// guarantees one arena slot per allocation identity.
#[derive(Debug)]
pub enum Obj {
    /// An object identified by its allocation site.
    ///
    /// Two `New` objects are distinct iff their allocation sites differ.
    New {
        /// The `new` statement that allocates this object.
        site: StmtId,
        /// Instantiated class or array type.
        ty: Type,
        /// Method containing the allocation site.
        method: MethodId,
    },

    /// A set of objects collapsed into one to bound heap size.
    ///
    /// The representative is assigned lazily: the first member added answers all
    /// container queries for the merged object.
    Merged {
        /// The type this merged object stands for.
        ty: Type,
        /// The objects represented by this one.
        members: boxcar::Vec<ObjId>,
        /// First member added; answers container queries.
        representative: OnceLock<ObjId>,
    },

    /// An object denoted by a literal constant, e.g. a string literal.
    Constant {
        /// The literal value.
        literal: String,
        /// Type of the constant.
        ty: Type,
    },

    /// An object synthesized for environment or native-method effects.
    Mock {
        /// Tag describing what this object models.
        descriptor: &'static str,
        /// Opaque allocation key; one mock object exists per (descriptor, key).
        key: String,
        /// Type of the mock object.
        ty: Type,
        /// Method this object is attributed to, if any.
        container: Option<MethodId>,
    },
}

impl Obj {
    /// Returns the type of this abstract object.
    #[must_use]
    pub fn ty(&self) -> Type {
        match self {
            Self::New { ty, .. }
            | Self::Merged { ty, .. }
            | Self::Constant { ty, .. }
            | Self::Mock { ty, .. } => ty.clone(),
        }
    }

    /// Returns `true` if this object stands for multiple allocations.
    #[must_use]
    pub const fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// Heap-merging configuration.
///
/// All flags default to `false` (maximum precision). Merging trades precision
/// for scalability and is typically enabled for large inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapOptions {
    /// Collapse all string constants into one object.
    pub merge_string_constants: bool,
    /// Collapse `StringBuilder`/`StringBuffer` allocations per type.
    pub merge_string_builders: bool,
    /// Collapse allocations of `Throwable` subtypes per concrete type.
    pub merge_exception_objects: bool,
}

/// Factory and registry for abstract objects.
///
/// All constructors are memoized; repeated calls with identical inputs return the
/// same handle. The arena is append-only, so handles stay valid for the lifetime
/// of the analysis and a converged result can be read without locking.
#[derive(Debug)]
pub struct HeapModel {
    options: HeapOptions,
    string_class: Option<ClassId>,
    builder_classes: Vec<ClassId>,
    throwable_class: Option<ClassId>,
    objs: boxcar::Vec<Obj>,
    site_objs: DashMap<StmtId, ObjId>,
    constant_objs: DashMap<String, ObjId>,
    merged_objs: DashMap<Type, ObjId>,
    mock_objs: DashMap<(&'static str, String), ObjId>,
}

impl HeapModel {
    /// Creates a heap model for the given program.
    ///
    /// The well-known classes the merging flags refer to are resolved once here;
    /// a program without them simply never triggers the corresponding merging.
    #[must_use]
    pub fn new(program: &Program, options: HeapOptions) -> Self {
        let builder_classes = [STRING_BUILDER, STRING_BUFFER]
            .into_iter()
            .filter_map(|name| program.class_id(name))
            .collect();

        Self {
            options,
            string_class: program.class_id(STRING),
            builder_classes,
            throwable_class: program.class_id(THROWABLE),
            objs: boxcar::Vec::new(),
            site_objs: DashMap::new(),
            constant_objs: DashMap::new(),
            merged_objs: DashMap::new(),
            mock_objs: DashMap::new(),
        }
    }

    /// Returns the abstract object for an allocation site.
    ///
    /// The statement behind `site` must be a `new`. Depending on the merging
    /// flags the returned object is either the site's own [`Obj::New`] or the
    /// per-type [`Obj::Merged`] that represents it.
    ///
    /// # Panics
    ///
    /// Panics if `site` is not an allocation statement of `program`.
    #[must_use]
    pub fn obj_of(&self, program: &Program, site: StmtId) -> ObjId {
        if let Some(existing) = self.site_objs.get(&site) {
            return *existing;
        }

        let stmt = program.stmt(site).expect("allocation site should exist");
        let ty = match &stmt.kind {
            StmtKind::New { class, .. } => Type::Class(*class),
            StmtKind::NewArray { elem, .. } => Type::array_of(elem.clone()),
            _ => panic!("obj_of called on a non-allocation statement"),
        };

        let raw = self.alloc(Obj::New {
            site,
            ty: ty.clone(),
            method: stmt.method,
        });

        let obj = match self.merge_target(program, &ty) {
            Some(ty) => {
                let merged = self.merged_obj(ty);
                self.add_member(merged, raw);
                merged
            }
            None => raw,
        };

        self.site_objs.insert(site, obj);
        obj
    }

    /// Returns the abstract object for a string literal.
    ///
    /// With [`HeapOptions::merge_string_constants`] enabled, every literal maps to
    /// the one merged string-constant object; the individual [`Obj::Constant`] is
    /// still created and recorded as a member.
    #[must_use]
    pub fn constant_obj(&self, literal: &str) -> ObjId {
        if let Some(existing) = self.constant_objs.get(literal) {
            return *existing;
        }

        let ty = self
            .string_class
            .map_or(Type::Null, Type::Class);
        let raw = self.alloc(Obj::Constant {
            literal: literal.to_string(),
            ty: ty.clone(),
        });

        let obj = if self.options.merge_string_constants {
            let merged = self.merged_obj(ty);
            self.add_member(merged, raw);
            merged
        } else {
            raw
        };

        self.constant_objs.insert(literal.to_string(), obj);
        obj
    }

    /// Returns a mock object for an environment or native effect.
    ///
    /// One mock object exists per (descriptor, key) pair.
    #[must_use]
    pub fn mock_obj(
        &self,
        descriptor: &'static str,
        key: &str,
        ty: Type,
        container: Option<MethodId>,
    ) -> ObjId {
        if let Some(existing) = self.mock_objs.get(&(descriptor, key.to_string())) {
            return *existing;
        }

        let obj = self.alloc(Obj::Mock {
            descriptor,
            key: key.to_string(),
            ty,
            container,
        });
        self.mock_objs.insert((descriptor, key.to_string()), obj);
        obj
    }

    /// Returns an object by handle.
    #[must_use]
    pub fn obj(&self, id: ObjId) -> Option<&Obj> {
        self.objs.get(id.index())
    }

    /// Returns the number of abstract objects created so far.
    #[must_use]
    pub fn obj_count(&self) -> usize {
        self.objs.count()
    }

    /// Iterates over all abstract objects.
    pub fn objs(&self) -> impl Iterator<Item = (ObjId, &Obj)> {
        self.objs
            .iter()
            .map(|(index, obj)| (ObjId(index as u32), obj))
    }

    /// Returns the type of an object.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not belong to this heap model.
    #[must_use]
    pub fn obj_type(&self, id: ObjId) -> Type {
        self.obj(id).expect("object handle should be valid").ty()
    }

    /// Returns the method an object is attributed to, if any.
    ///
    /// Merged objects delegate to their representative.
    #[must_use]
    pub fn container_method(&self, id: ObjId) -> Option<MethodId> {
        match self.obj(id)? {
            Obj::New { method, .. } => Some(*method),
            Obj::Merged { representative, .. } => {
                representative.get().and_then(|&rep| self.container_method(rep))
            }
            Obj::Constant { .. } => None,
            Obj::Mock { container, .. } => *container,
        }
    }

    /// Returns the class an object is contained in, used by type sensitivity.
    ///
    /// For site-allocated objects this is the declaring class of the containing
    /// method; constants fall back to their own type's class, mock objects to
    /// their container method or their own type, merged objects to their
    /// representative.
    #[must_use]
    pub fn container_class(&self, program: &Program, id: ObjId) -> Option<ClassId> {
        match self.obj(id)? {
            Obj::New { method, .. } => program.method(*method).map(|m| m.class),
            Obj::Merged {
                representative, ty, ..
            } => representative
                .get()
                .and_then(|&rep| self.container_class(program, rep))
                .or_else(|| ty.as_class()),
            Obj::Constant { ty, .. } => ty.as_class(),
            Obj::Mock { container, ty, .. } => container
                .and_then(|m| program.method(m).map(|m| m.class))
                .or_else(|| ty.as_class()),
        }
    }

    /// Returns the members of a merged object, or an empty list for other objects.
    #[must_use]
    pub fn merged_members(&self, id: ObjId) -> Vec<ObjId> {
        match self.obj(id) {
            Some(Obj::Merged { members, .. }) => members.iter().map(|(_, &m)| m).collect(),
            _ => Vec::new(),
        }
    }

    fn merge_target(&self, program: &Program, ty: &Type) -> Option<Type> {
        let class = ty.as_class()?;
        if self.options.merge_string_builders && self.builder_classes.contains(&class) {
            return Some(Type::Class(class));
        }
        if self.options.merge_exception_objects {
            if let Some(throwable) = self.throwable_class {
                if program.is_subclass_of(class, throwable) {
                    return Some(Type::Class(class));
                }
            }
        }
        None
    }

    fn merged_obj(&self, ty: Type) -> ObjId {
        if let Some(existing) = self.merged_objs.get(&ty) {
            return *existing;
        }
        let obj = self.alloc(Obj::Merged {
            ty: ty.clone(),
            members: boxcar::Vec::new(),
            representative: OnceLock::new(),
        });
        self.merged_objs.insert(ty, obj);
        obj
    }

    fn add_member(&self, merged: ObjId, member: ObjId) {
        if let Some(Obj::Merged {
            members,
            representative,
            ..
        }) = self.obj(merged)
        {
            members.push(member);
            let _ = representative.set(member);
        }
    }

    fn alloc(&self, obj: Obj) -> ObjId {
        let index = self.objs.push(obj);
        ObjId(u32::try_from(index).expect("object arena exceeds u32 range"))
    }
}
