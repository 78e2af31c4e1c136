//! Programmatic construction of program models.
//!
//! Bytecode loading is outside the scope of this crate; programs are built through
//! [`ProgramBuilder`], which plays the same role an instruction assembler plays for
//! a disassembler test suite: a compact way to put together exactly the program
//! shape an analysis should be exercised on.
//!
//! # Example
//!
//! ```rust
//! use jscope::ir::{CallKind, MethodDescriptor, MethodFlags, ProgramBuilder, Type};
//!
//! let mut b = ProgramBuilder::new();
//! let a = b.add_class("A").unwrap();
//!
//! // class A { void foo() {} }
//! let foo = b.instance_method(a, "foo").finish();
//!
//! // static void main() { A a = new A(); a.foo(); }
//! let mut main = b.static_method(a, "main");
//! let va = main.var("a", Type::Class(a));
//! main.alloc(va, a);
//! let foo_ref = main.method_ref(a, "foo", MethodDescriptor::void());
//! main.invoke_virtual(va, foo_ref, vec![], None).unwrap();
//! let main = main.finish();
//!
//! b.set_entry(main).unwrap();
//! let program = b.finish();
//! assert_eq!(program.entry_points(), &[main]);
//! # let _ = foo;
//! ```

use crate::{
    ir::{
        program::{OBJECT, STRING, STRING_BUFFER, STRING_BUILDER, THROWABLE},
        CallKind, Class, ClassFlags, ClassId, ClassRc, Field, FieldId, Invoke, Method,
        MethodDescriptor, MethodFlags, MethodId, MethodRef, Program, Stmt, StmtId, StmtKind, Type,
        Var, VarId, VarOrigin,
    },
    Error, Result,
};

/// Builder for [`Program`] instances.
///
/// The builder owns the program exclusively; once [`ProgramBuilder::finish`] is
/// called the program is frozen and can be shared freely. Well-known `java.lang`
/// classes are pre-registered on construction so that string and exception
/// handling in the heap model always has classes to resolve against.
#[derive(Debug)]
pub struct ProgramBuilder {
    program: Program,
    entries: Vec<MethodId>,
    object: ClassId,
    string: ClassId,
    string_builder: ClassId,
    string_buffer: ClassId,
    throwable: ClassId,
}

impl ProgramBuilder {
    /// Creates a builder with the well-known classes pre-registered.
    #[must_use]
    pub fn new() -> Self {
        let program = Program::empty();
        let mut builder = Self {
            program,
            entries: Vec::new(),
            object: ClassId(0),
            string: ClassId(0),
            string_builder: ClassId(0),
            string_buffer: ClassId(0),
            throwable: ClassId(0),
        };

        let object = builder
            .register_class(OBJECT, ClassFlags::PUBLIC, None, &[])
            .expect("fresh registry cannot contain Object");
        builder.object = object;
        builder.string = builder
            .register_class(
                STRING,
                ClassFlags::PUBLIC | ClassFlags::FINAL,
                Some(object),
                &[],
            )
            .expect("fresh registry cannot contain String");
        builder.string_builder = builder
            .register_class(STRING_BUILDER, ClassFlags::PUBLIC, Some(object), &[])
            .expect("fresh registry cannot contain StringBuilder");
        builder.string_buffer = builder
            .register_class(STRING_BUFFER, ClassFlags::PUBLIC, Some(object), &[])
            .expect("fresh registry cannot contain StringBuffer");
        builder.throwable = builder
            .register_class(THROWABLE, ClassFlags::PUBLIC, Some(object), &[])
            .expect("fresh registry cannot contain Throwable");

        builder
    }

    /// Handle of `java.lang.Object`.
    #[must_use]
    pub const fn object_class(&self) -> ClassId {
        self.object
    }

    /// Handle of `java.lang.String`.
    #[must_use]
    pub const fn string_class(&self) -> ClassId {
        self.string
    }

    /// Handle of `java.lang.StringBuilder`.
    #[must_use]
    pub const fn string_builder_class(&self) -> ClassId {
        self.string_builder
    }

    /// Handle of `java.lang.StringBuffer`.
    #[must_use]
    pub const fn string_buffer_class(&self) -> ClassId {
        self.string_buffer
    }

    /// Handle of `java.lang.Throwable`.
    #[must_use]
    pub const fn throwable_class(&self) -> ClassId {
        self.throwable
    }

    /// Registers a public class extending `java.lang.Object`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateClass`] if the name is already registered.
    pub fn add_class(&mut self, name: &str) -> Result<ClassId> {
        let object = self.object;
        self.register_class(name, ClassFlags::PUBLIC, Some(object), &[])
    }

    /// Registers a class with explicit flags, superclass, and interfaces.
    ///
    /// A `superclass` of `None` defaults to `java.lang.Object`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateClass`] if the name is already registered.
    pub fn add_class_with(
        &mut self,
        name: &str,
        flags: ClassFlags,
        superclass: Option<ClassId>,
        interfaces: &[ClassId],
    ) -> Result<ClassId> {
        let superclass = superclass.or(Some(self.object));
        self.register_class(name, flags, superclass, interfaces)
    }

    /// Registers a public interface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateClass`] if the name is already registered.
    pub fn add_interface(&mut self, name: &str) -> Result<ClassId> {
        let object = self.object;
        self.register_class(
            name,
            ClassFlags::PUBLIC | ClassFlags::INTERFACE | ClassFlags::ABSTRACT,
            Some(object),
            &[],
        )
    }

    /// Declares a field on a class.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] if the class handle is unknown.
    pub fn add_field(&mut self, class: ClassId, name: &str, ty: Type) -> Result<FieldId> {
        let class_rc = self
            .program
            .class(class)
            .ok_or_else(|| Error::ClassNotFound(class.to_string()))?;

        let index = self
            .program
            .fields
            .push(Field::new(class, name.to_string(), ty));
        let fid = FieldId(u32::try_from(index).expect("field arena exceeds u32 range"));
        class_rc.fields.push(fid);
        Ok(fid)
    }

    /// Creates a method reference for use at call sites.
    #[must_use]
    pub fn method_ref(
        &self,
        class: ClassId,
        name: &str,
        descriptor: MethodDescriptor,
    ) -> MethodRef {
        MethodRef::new(class, name.to_string(), descriptor)
    }

    /// Starts building an instance method; the `this` variable is created eagerly.
    pub fn instance_method(&mut self, class: ClassId, name: &str) -> MethodBuilder<'_> {
        MethodBuilder::new(self, class, name, MethodFlags::PUBLIC)
    }

    /// Starts building a static method.
    pub fn static_method(&mut self, class: ClassId, name: &str) -> MethodBuilder<'_> {
        MethodBuilder::new(self, class, name, MethodFlags::PUBLIC | MethodFlags::STATIC)
    }

    /// Marks a method as a program entry point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProgram`] if the method has no body: an entry point
    /// without statements cannot seed the analysis.
    pub fn set_entry(&mut self, method: MethodId) -> Result<()> {
        let Some(m) = self.program.method(method) else {
            return Err(Error::InvalidProgram(format!(
                "entry point {method} does not exist"
            )));
        };
        if !m.has_body() {
            return Err(Error::InvalidProgram(format!(
                "entry point {}.{} has no body",
                self.program.class_name(m.class),
                m.name
            )));
        }
        self.entries.push(method);
        Ok(())
    }

    /// Freezes the builder and returns the finished program.
    #[must_use]
    pub fn finish(mut self) -> Program {
        self.program.entry_points = std::mem::take(&mut self.entries);
        self.program
    }

    fn register_class(
        &mut self,
        name: &str,
        flags: ClassFlags,
        superclass: Option<ClassId>,
        interfaces: &[ClassId],
    ) -> Result<ClassId> {
        if self.program.classes_by_name.contains_key(name) {
            return Err(Error::DuplicateClass(name.to_string()));
        }

        let next = u32::try_from(self.program.classes.len()).expect("class registry exceeds u32 range");
        let id = ClassId(next);
        let class = Class::new(id, name.to_string(), flags, superclass, interfaces.to_vec());
        self.program.classes.insert(id, ClassRc::new(class));
        self.program.classes_by_name.insert(name.to_string(), id);
        Ok(id)
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a single method body.
///
/// Statement helpers append to the program-wide statement arena and return the
/// fresh [`StmtId`], so tests can hold on to allocation and call sites directly.
/// Dropping a `MethodBuilder` without calling [`MethodBuilder::finish`] leaves the
/// already-created variables and statements orphaned; always finish.
#[derive(Debug)]
pub struct MethodBuilder<'a> {
    builder: &'a mut ProgramBuilder,
    id: MethodId,
    class: ClassId,
    name: String,
    flags: MethodFlags,
    descriptor: MethodDescriptor,
    this_var: Option<VarId>,
    params: Vec<VarId>,
    ret_vars: Vec<VarId>,
    stmts: Vec<StmtId>,
}

impl<'a> MethodBuilder<'a> {
    fn new(builder: &'a mut ProgramBuilder, class: ClassId, name: &str, flags: MethodFlags) -> Self {
        let id = MethodId(
            u32::try_from(builder.program.methods.count()).expect("method arena exceeds u32 range"),
        );
        let mut mb = Self {
            builder,
            id,
            class,
            name: name.to_string(),
            flags,
            descriptor: MethodDescriptor::void(),
            this_var: None,
            params: Vec::new(),
            ret_vars: Vec::new(),
            stmts: Vec::new(),
        };
        if !flags.contains(MethodFlags::STATIC) {
            mb.this_var = Some(mb.push_var("this", Type::Class(class), VarOrigin::This));
        }
        mb
    }

    /// The handle this method will have once finished.
    #[must_use]
    pub const fn id(&self) -> MethodId {
        self.id
    }

    /// The `this` variable, present iff this is an instance method.
    #[must_use]
    pub const fn this(&self) -> Option<VarId> {
        self.this_var
    }

    /// Adds flags (e.g. [`MethodFlags::NATIVE`]) to the method.
    pub fn set_flags(&mut self, flags: MethodFlags) -> &mut Self {
        self.flags |= flags;
        self
    }

    /// Declares the return type; unset means `void`.
    pub fn returns(&mut self, ty: Type) -> &mut Self {
        self.descriptor.ret = Some(ty);
        self
    }

    /// Declares the next parameter and returns its variable.
    pub fn param(&mut self, name: &str, ty: Type) -> VarId {
        let position = u16::try_from(self.params.len()).expect("parameter count exceeds u16 range");
        self.descriptor.params.push(ty.clone());
        let var = self.push_var(name, ty, VarOrigin::Param(position));
        self.params.push(var);
        var
    }

    /// Declares a local variable.
    pub fn var(&mut self, name: &str, ty: Type) -> VarId {
        self.push_var(name, ty, VarOrigin::Local)
    }

    /// Creates a [`MethodRef`] without releasing the builder borrow.
    #[must_use]
    pub fn method_ref(
        &self,
        class: ClassId,
        name: &str,
        descriptor: MethodDescriptor,
    ) -> MethodRef {
        MethodRef::new(class, name.to_string(), descriptor)
    }

    /// Appends `lhs = new C()`.
    pub fn alloc(&mut self, lhs: VarId, class: ClassId) -> StmtId {
        self.push_stmt(StmtKind::New { lhs, class })
    }

    /// Appends `lhs = new T[..]`.
    pub fn alloc_array(&mut self, lhs: VarId, elem: Type) -> StmtId {
        self.push_stmt(StmtKind::NewArray { lhs, elem })
    }

    /// Appends `lhs = "literal"`.
    pub fn assign_literal(&mut self, lhs: VarId, literal: &str) -> StmtId {
        self.push_stmt(StmtKind::AssignLiteral {
            lhs,
            literal: literal.to_string(),
        })
    }

    /// Appends `lhs = rhs`.
    pub fn copy(&mut self, lhs: VarId, rhs: VarId) -> StmtId {
        self.push_stmt(StmtKind::Copy { lhs, rhs })
    }

    /// Appends `lhs = base.field`.
    pub fn load_field(&mut self, lhs: VarId, base: VarId, field: FieldId) -> StmtId {
        self.push_stmt(StmtKind::LoadField { lhs, base, field })
    }

    /// Appends `base.field = rhs`.
    pub fn store_field(&mut self, base: VarId, field: FieldId, rhs: VarId) -> StmtId {
        self.push_stmt(StmtKind::StoreField { base, field, rhs })
    }

    /// Appends `lhs = C.field`.
    pub fn load_static(&mut self, lhs: VarId, field: FieldId) -> StmtId {
        self.push_stmt(StmtKind::LoadStatic { lhs, field })
    }

    /// Appends `C.field = rhs`.
    pub fn store_static(&mut self, field: FieldId, rhs: VarId) -> StmtId {
        self.push_stmt(StmtKind::StoreStatic { field, rhs })
    }

    /// Appends `lhs = array[*]`.
    pub fn load_array(&mut self, lhs: VarId, array: VarId) -> StmtId {
        self.push_stmt(StmtKind::LoadArray { lhs, array })
    }

    /// Appends `array[*] = rhs`.
    pub fn store_array(&mut self, array: VarId, rhs: VarId) -> StmtId {
        self.push_stmt(StmtKind::StoreArray { array, rhs })
    }

    /// Appends an invoke statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProgram`] if the receiver does not match the call
    /// kind (static calls take none, all others require one) or the argument count
    /// does not match the target descriptor.
    pub fn invoke(
        &mut self,
        kind: CallKind,
        target: MethodRef,
        recv: Option<VarId>,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> Result<StmtId> {
        match kind {
            CallKind::Static if recv.is_some() => {
                return Err(Error::InvalidProgram(
                    "static call must not have a receiver".to_string(),
                ));
            }
            CallKind::Special | CallKind::Virtual | CallKind::Interface if recv.is_none() => {
                return Err(Error::InvalidProgram(format!(
                    "{kind} call requires a receiver"
                )));
            }
            _ => {}
        }
        if args.len() != target.descriptor.params.len() {
            return Err(Error::InvalidProgram(format!(
                "call to {} passes {} arguments, descriptor has {}",
                target.name,
                args.len(),
                target.descriptor.params.len()
            )));
        }

        Ok(self.push_stmt(StmtKind::Invoke(Invoke {
            kind,
            target,
            recv,
            args,
            result,
        })))
    }

    /// Appends an `invokestatic` call.
    ///
    /// # Errors
    ///
    /// See [`MethodBuilder::invoke`].
    pub fn invoke_static(
        &mut self,
        target: MethodRef,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> Result<StmtId> {
        self.invoke(CallKind::Static, target, None, args, result)
    }

    /// Appends an `invokevirtual` call.
    ///
    /// # Errors
    ///
    /// See [`MethodBuilder::invoke`].
    pub fn invoke_virtual(
        &mut self,
        recv: VarId,
        target: MethodRef,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> Result<StmtId> {
        self.invoke(CallKind::Virtual, target, Some(recv), args, result)
    }

    /// Appends an `invokespecial` call.
    ///
    /// # Errors
    ///
    /// See [`MethodBuilder::invoke`].
    pub fn invoke_special(
        &mut self,
        recv: VarId,
        target: MethodRef,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> Result<StmtId> {
        self.invoke(CallKind::Special, target, Some(recv), args, result)
    }

    /// Appends an `invokeinterface` call.
    ///
    /// # Errors
    ///
    /// See [`MethodBuilder::invoke`].
    pub fn invoke_interface(
        &mut self,
        recv: VarId,
        target: MethodRef,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> Result<StmtId> {
        self.invoke(CallKind::Interface, target, Some(recv), args, result)
    }

    /// Appends `return` or `return v`.
    pub fn ret(&mut self, value: Option<VarId>) -> StmtId {
        if let Some(v) = value {
            self.ret_vars.push(v);
        }
        self.push_stmt(StmtKind::Return(value))
    }

    /// Finishes the method, registers it on its class, and returns its handle.
    ///
    /// The handle is also available as [`MethodBuilder::id`] before finishing, so
    /// ignoring the return value is fine when the handle was taken earlier.
    pub fn finish(self) -> MethodId {
        let body = if self
            .flags
            .intersects(MethodFlags::NATIVE | MethodFlags::ABSTRACT)
        {
            None
        } else {
            Some(self.stmts)
        };

        let method = Method {
            id: self.id,
            class: self.class,
            name: self.name,
            descriptor: self.descriptor,
            flags: self.flags,
            this_var: self.this_var,
            params: self.params,
            ret_vars: self.ret_vars,
            body,
        };

        let index = self.builder.program.methods.push(method);
        debug_assert_eq!(index, self.id.index(), "method handle reserved at builder creation");

        if let Some(class) = self.builder.program.class(self.class) {
            class.methods.push(self.id);
        }
        self.id
    }

    fn push_var(&mut self, name: &str, ty: Type, origin: VarOrigin) -> VarId {
        let index = self
            .builder
            .program
            .vars
            .push(Var::new(self.id, name.to_string(), ty, origin));
        VarId(u32::try_from(index).expect("variable arena exceeds u32 range"))
    }

    fn push_stmt(&mut self, kind: StmtKind) -> StmtId {
        let index = self.builder.program.stmts.push(Stmt {
            method: self.id,
            kind,
        });
        let sid = StmtId(u32::try_from(index).expect("statement arena exceeds u32 range"));
        self.stmts.push(sid);
        sid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_class_rejected() {
        let mut b = ProgramBuilder::new();
        b.add_class("p.A").unwrap();
        assert!(matches!(
            b.add_class("p.A"),
            Err(Error::DuplicateClass(name)) if name == "p.A"
        ));
    }

    #[test]
    fn test_instance_method_gets_this() {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("p.A").unwrap();
        let mb = b.instance_method(a, "foo");
        assert!(mb.this().is_some());
        let foo = mb.finish();

        let program = b.finish();
        let method = program.method(foo).unwrap();
        assert!(!method.is_static());
        assert!(method.this_var.is_some());
    }

    #[test]
    fn test_static_call_rejects_receiver() {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("p.A").unwrap();
        let helper = b.static_method(a, "helper").finish();
        let _ = helper;

        let mut main = b.static_method(a, "main");
        let v = main.var("v", Type::Class(a));
        let target = main.method_ref(a, "helper", MethodDescriptor::void());
        let err = main.invoke(CallKind::Static, target, Some(v), vec![], None);
        assert!(matches!(err, Err(Error::InvalidProgram(_))));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("p.A").unwrap();
        let mut main = b.static_method(a, "main");
        let v = main.var("v", Type::Class(a));
        let target = main.method_ref(
            a,
            "foo",
            MethodDescriptor::new(vec![Type::Class(a)], None),
        );
        let err = main.invoke_virtual(v, target, vec![], None);
        assert!(matches!(err, Err(Error::InvalidProgram(_))));
    }

    #[test]
    fn test_native_method_has_no_body() {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("p.A").unwrap();
        let mut mb = b.instance_method(a, "nativeOp");
        mb.set_flags(MethodFlags::NATIVE);
        let m = mb.finish();

        let err = b.set_entry(m);
        assert!(matches!(err, Err(Error::InvalidProgram(_))));

        let program = b.finish();
        assert!(!program.method(m).unwrap().has_body());
    }
}
