//! Pointer analysis integration tests.
//!
//! These tests verify the complete analysis pipeline using the public API:
//! 1. Build a program model with `ProgramBuilder`
//! 2. Configure and run `PointerAnalysis`
//! 3. Verify points-to sets, call-graph shape, and sensitivity behavior

use jscope::{
    analysis::pta::{AnalysisOptions, PointerAnalysis, PointerAnalysisResult},
    ir::{
        CallKind, ClassFlags, MethodDescriptor, MethodFlags, Program, ProgramBuilder, Type, VarId,
    },
    Result,
};

/// Run an analysis with the given sensitivity descriptor.
fn solve(program: &Program, sensitivity: &str) -> Result<PointerAnalysisResult> {
    let options = AnalysisOptions {
        sensitivity: sensitivity.to_string(),
        ..AnalysisOptions::default()
    };
    PointerAnalysis::new(program, options)?.solve()
}

/// Collect a variable's aggregated points-to set as a sorted vector.
fn pts_vec(result: &PointerAnalysisResult, var: VarId) -> Vec<jscope::analysis::pta::CsObjId> {
    let mut objs: Vec<_> = result.points_to_var(var).iter().collect();
    objs.sort();
    objs
}

#[test]
fn test_soundness_on_fixed_small_program() -> Result<()> {
    // class A { void foo() {} }
    // static void main() { A a = new A(); a.foo(); }
    let mut b = ProgramBuilder::new();
    let a = b.add_class("A").unwrap();
    let foo = b.instance_method(a, "foo").finish();

    let mut main = b.static_method(a, "main");
    let va = main.var("a", Type::Class(a));
    main.alloc(va, a);
    let foo_ref = main.method_ref(a, "foo", MethodDescriptor::void());
    main.invoke_virtual(va, foo_ref, vec![], None)?;
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    let result = solve(&program, "ci")?;

    // Exactly one object: the NewObj of the single allocation site.
    assert_eq!(result.points_to_var(va).len(), 1);

    // Exactly one call edge, and it targets A.foo.
    let edges: Vec<_> = result.call_graph().edges().collect();
    assert_eq!(edges.len(), 1);
    let callee = result.cs_elements().method_of(edges[0].callee);
    assert_eq!(callee.method, foo);
    assert_eq!(edges[0].kind, CallKind::Virtual);

    // Both main and A.foo are reachable.
    assert_eq!(result.reachable_methods().len(), 2);
    Ok(())
}

#[test]
fn test_object_sensitivity_distinguishes_receivers() -> Result<()> {
    // class C { Object f; void set(Object v) { this.f = v; } }
    // static void main() {
    //     C c1 = new C(); c1.set(new Object());
    //     C c2 = new C(); c2.set(new Object());
    // }
    let mut b = ProgramBuilder::new();
    let object = b.object_class();
    let c = b.add_class("C").unwrap();
    let f = b.add_field(c, "f", Type::Class(object))?;

    let mut set = b.instance_method(c, "set");
    let this = set.this().unwrap();
    let v = set.param("v", Type::Class(object));
    set.store_field(this, f, v);
    set.finish();

    let mut main = b.static_method(c, "main");
    let c1 = main.var("c1", Type::Class(c));
    let c2 = main.var("c2", Type::Class(c));
    let o1 = main.var("o1", Type::Class(object));
    let o2 = main.var("o2", Type::Class(object));
    let set_ref = main.method_ref(
        c,
        "set",
        MethodDescriptor::new(vec![Type::Class(object)], None),
    );
    main.alloc(c1, c);
    main.alloc(o1, object);
    main.invoke_virtual(c1, set_ref.clone(), vec![o1], None)?;
    main.alloc(c2, c);
    main.alloc(o2, object);
    main.invoke_virtual(c2, set_ref, vec![o2], None)?;
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    // 1-object sensitivity: each receiver keeps its own field contents.
    let result = solve(&program, "1-obj")?;
    let f1 = result.points_to_var_field(c1, f);
    let f2 = result.points_to_var_field(c2, f);
    assert_eq!(f1.len(), 1, "c1.f is a singleton");
    assert_eq!(f2.len(), 1, "c2.f is a singleton");
    assert!(
        !f1.iter().any(|obj| f2.contains(obj)),
        "no spurious merging across receivers"
    );

    // Context-insensitive: both fields conflate both stored objects.
    let ci = solve(&program, "ci")?;
    let f1 = ci.points_to_var_field(c1, f);
    let f2 = ci.points_to_var_field(c2, f);
    assert_eq!(f1.len(), 2);
    let mut lhs: Vec<_> = f1.iter().collect();
    let mut rhs: Vec<_> = f2.iter().collect();
    lhs.sort();
    rhs.sort();
    assert_eq!(lhs, rhs);
    Ok(())
}

#[test]
fn test_call_site_sensitivity_distinguishes_call_sites() -> Result<()> {
    // static A id(A x) { return x; }
    // static void main() { A r1 = id(new A()); A r2 = id(new A()); }
    let mut b = ProgramBuilder::new();
    let a = b.add_class("A").unwrap();

    let mut id = b.static_method(a, "id");
    id.returns(Type::Class(a));
    let x = id.param("x", Type::Class(a));
    id.ret(Some(x));
    id.finish();

    let mut main = b.static_method(a, "main");
    let v1 = main.var("v1", Type::Class(a));
    let v2 = main.var("v2", Type::Class(a));
    let r1 = main.var("r1", Type::Class(a));
    let r2 = main.var("r2", Type::Class(a));
    let id_ref = main.method_ref(
        a,
        "id",
        MethodDescriptor::new(vec![Type::Class(a)], Some(Type::Class(a))),
    );
    main.alloc(v1, a);
    main.invoke_static(id_ref.clone(), vec![v1], Some(r1))?;
    main.alloc(v2, a);
    main.invoke_static(id_ref, vec![v2], Some(r2))?;
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    // Context-insensitive: the identity function conflates its two callers.
    let ci = solve(&program, "ci")?;
    assert_eq!(ci.points_to_var(r1).len(), 2);
    assert_eq!(ci.points_to_var(r2).len(), 2);

    // 1-call-site sensitivity keeps the two calls apart.
    let cs = solve(&program, "1-call")?;
    assert_eq!(cs.points_to_var(r1).len(), 1);
    assert_eq!(cs.points_to_var(r2).len(), 1);
    assert_ne!(pts_vec(&cs, r1), pts_vec(&cs, r2));
    Ok(())
}

#[test]
fn test_virtual_dispatch_selects_override() -> Result<()> {
    // class A { void foo() {} }
    // class B extends A { void foo() {} }
    // static void main() { A a = new B(); a.foo(); }
    let mut b = ProgramBuilder::new();
    let a = b.add_class("A").unwrap();
    let a_foo = b.instance_method(a, "foo").finish();
    let sub = b.add_class_with("B", ClassFlags::PUBLIC, Some(a), &[])?;
    let b_foo = b.instance_method(sub, "foo").finish();

    let mut main = b.static_method(a, "main");
    let va = main.var("a", Type::Class(a));
    main.alloc(va, sub);
    let foo_ref = main.method_ref(a, "foo", MethodDescriptor::void());
    main.invoke_virtual(va, foo_ref, vec![], None)?;
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    let result = solve(&program, "ci")?;
    let callees: Vec<_> = result
        .call_graph()
        .edges()
        .map(|edge| result.cs_elements().method_of(edge.callee).method)
        .collect();
    assert_eq!(callees, vec![b_foo], "dispatch on the runtime class");
    assert_ne!(callees[0], a_foo);
    Ok(())
}

#[test]
fn test_interface_dispatch_reaches_implementation() -> Result<()> {
    // interface I { void foo(); }
    // class A implements I { void foo() {} }
    // static void main() { I i = new A(); i.foo(); }
    let mut b = ProgramBuilder::new();
    let iface = b.add_interface("I")?;
    let mut decl = b.instance_method(iface, "foo");
    decl.set_flags(MethodFlags::ABSTRACT);
    decl.finish();

    let a = b.add_class_with("A", ClassFlags::PUBLIC, None, &[iface])?;
    let a_foo = b.instance_method(a, "foo").finish();

    let mut main = b.static_method(a, "main");
    let vi = main.var("i", Type::Class(iface));
    main.alloc(vi, a);
    let foo_ref = main.method_ref(iface, "foo", MethodDescriptor::void());
    main.invoke_interface(vi, foo_ref, vec![], None)?;
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    let result = solve(&program, "ci")?;
    let callees: Vec<_> = result
        .call_graph()
        .edges()
        .map(|edge| result.cs_elements().method_of(edge.callee).method)
        .collect();
    assert_eq!(callees, vec![a_foo]);
    assert_eq!(
        result.call_graph().edges().next().unwrap().kind,
        CallKind::Interface
    );
    Ok(())
}

#[test]
fn test_special_call_binds_receiver() -> Result<()> {
    // class C { Object f; C() { this.f = new Object(); } }
    // static void main() { C c = new C(); c.<init>(); }
    let mut b = ProgramBuilder::new();
    let object = b.object_class();
    let c = b.add_class("C").unwrap();
    let f = b.add_field(c, "f", Type::Class(object))?;

    let mut ctor = b.instance_method(c, "<init>");
    let this = ctor.this().unwrap();
    let tmp = ctor.var("tmp", Type::Class(object));
    ctor.alloc(tmp, object);
    ctor.store_field(this, f, tmp);
    ctor.finish();

    let mut main = b.static_method(c, "main");
    let vc = main.var("c", Type::Class(c));
    main.alloc(vc, c);
    let ctor_ref = main.method_ref(c, "<init>", MethodDescriptor::void());
    main.invoke_special(vc, ctor_ref, vec![], None)?;
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    let result = solve(&program, "ci")?;
    assert_eq!(result.points_to_var_field(vc, f).len(), 1);
    assert_eq!(
        result.call_graph().edges().next().unwrap().kind,
        CallKind::Special
    );
    Ok(())
}

#[test]
fn test_store_wired_after_source_has_facts_still_flows() -> Result<()> {
    // The store base (x) grows *after* y already points somewhere: the freshly
    // created field edge must be seeded with y's existing points-to set.
    // static void main() { B y = new B(); A x = new A(); x.f = y; B r = x.f; }
    let mut b = ProgramBuilder::new();
    let cls_b = b.add_class("B").unwrap();
    let cls_a = b.add_class("A").unwrap();
    let f = b.add_field(cls_a, "f", Type::Class(cls_b))?;

    let mut main = b.static_method(cls_a, "main");
    let y = main.var("y", Type::Class(cls_b));
    let x = main.var("x", Type::Class(cls_a));
    let r = main.var("r", Type::Class(cls_b));
    main.alloc(y, cls_b);
    main.alloc(x, cls_a);
    main.store_field(x, f, y);
    main.load_field(r, x, f);
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    let result = solve(&program, "ci")?;
    assert_eq!(pts_vec(&result, r), pts_vec(&result, y));
    assert_eq!(result.points_to_var(r).len(), 1);
    Ok(())
}

#[test]
fn test_static_fields_flow() -> Result<()> {
    // class A { static A g; }
    // static void main() { A a = new A(); A.g = a; A r = A.g; }
    let mut b = ProgramBuilder::new();
    let a = b.add_class("A").unwrap();
    let g = b.add_field(a, "g", Type::Class(a))?;

    let mut main = b.static_method(a, "main");
    let va = main.var("a", Type::Class(a));
    let vr = main.var("r", Type::Class(a));
    main.alloc(va, a);
    main.store_static(g, va);
    main.load_static(vr, g);
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    let result = solve(&program, "ci")?;
    assert_eq!(pts_vec(&result, vr), pts_vec(&result, va));
    Ok(())
}

#[test]
fn test_array_elements_flow() -> Result<()> {
    // static void main() { A[] arr = new A[..]; arr[*] = new A(); A r = arr[*]; }
    let mut b = ProgramBuilder::new();
    let a = b.add_class("A").unwrap();

    let mut main = b.static_method(a, "main");
    let arr = main.var("arr", Type::array_of(Type::Class(a)));
    let va = main.var("a", Type::Class(a));
    let vr = main.var("r", Type::Class(a));
    main.alloc_array(arr, Type::Class(a));
    main.alloc(va, a);
    main.store_array(arr, va);
    main.load_array(vr, arr);
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    let result = solve(&program, "ci")?;
    assert_eq!(pts_vec(&result, vr), pts_vec(&result, va));
    Ok(())
}

#[test]
fn test_parameters_and_returns_flow_through_calls() -> Result<()> {
    // class A { A self() { return this; } }
    // static void main() { A a = new A(); A r = a.self(); }
    let mut b = ProgramBuilder::new();
    let a = b.add_class("A").unwrap();

    let mut self_m = b.instance_method(a, "self");
    self_m.returns(Type::Class(a));
    let this = self_m.this().unwrap();
    self_m.ret(Some(this));
    self_m.finish();

    let mut main = b.static_method(a, "main");
    let va = main.var("a", Type::Class(a));
    let vr = main.var("r", Type::Class(a));
    main.alloc(va, a);
    let self_ref = main.method_ref(
        a,
        "self",
        MethodDescriptor::new(vec![], Some(Type::Class(a))),
    );
    main.invoke_virtual(va, self_ref, vec![], Some(vr))?;
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    let result = solve(&program, "ci")?;
    assert_eq!(pts_vec(&result, vr), pts_vec(&result, va));
    Ok(())
}

#[test]
fn test_string_constant_merging_reduces_cardinality() -> Result<()> {
    // static void main() { String s1 = "a"; String s2 = "b"; }
    let mut b = ProgramBuilder::new();
    let a = b.add_class("A").unwrap();
    let string = b.string_class();

    let mut main = b.static_method(a, "main");
    let s1 = main.var("s1", Type::Class(string));
    let s2 = main.var("s2", Type::Class(string));
    main.assign_literal(s1, "a");
    main.assign_literal(s2, "b");
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    let precise = solve(&program, "ci")?;
    assert_ne!(pts_vec(&precise, s1), pts_vec(&precise, s2));

    let merged_options = AnalysisOptions {
        heap: jscope::analysis::pta::HeapOptions {
            merge_string_constants: true,
            ..Default::default()
        },
        ..AnalysisOptions::default()
    };
    let merged = PointerAnalysis::new(&program, merged_options)?.solve()?;
    assert_eq!(pts_vec(&merged, s1), pts_vec(&merged, s2));
    assert!(
        merged.stats().cs_objects <= precise.stats().cs_objects,
        "merging never increases the CS-object universe"
    );
    assert!(merged.stats().cs_objects < precise.stats().cs_objects);
    Ok(())
}

#[test]
fn test_two_obj_specialization_matches_general_kobj() -> Result<()> {
    // Nested factories: under 2-obj the inner products stay apart, and the
    // fixed-length specialization agrees with the general 2-obj configuration.
    // class Box { Object val; void put(Object v) { this.val = v; } }
    // class Maker { Box make() { Box b = new Box(); return b; } }
    // static void main() {
    //     Maker m1 = new Maker(); Box b1 = m1.make(); b1.put(new Object());
    //     Maker m2 = new Maker(); Box b2 = m2.make(); b2.put(new Object());
    // }
    let mut b = ProgramBuilder::new();
    let object = b.object_class();
    let boxc = b.add_class("Box").unwrap();
    let val = b.add_field(boxc, "val", Type::Class(object))?;
    let maker = b.add_class("Maker").unwrap();

    let mut put = b.instance_method(boxc, "put");
    let put_this = put.this().unwrap();
    let v = put.param("v", Type::Class(object));
    put.store_field(put_this, val, v);
    put.finish();

    let mut make = b.instance_method(maker, "make");
    make.returns(Type::Class(boxc));
    let fresh = make.var("b", Type::Class(boxc));
    make.alloc(fresh, boxc);
    make.ret(Some(fresh));
    make.finish();

    let make_ref = b.method_ref(
        maker,
        "make",
        MethodDescriptor::new(vec![], Some(Type::Class(boxc))),
    );
    let put_ref = b.method_ref(
        boxc,
        "put",
        MethodDescriptor::new(vec![Type::Class(object)], None),
    );

    let mut main = b.static_method(maker, "main");
    let m1 = main.var("m1", Type::Class(maker));
    let m2 = main.var("m2", Type::Class(maker));
    let b1 = main.var("b1", Type::Class(boxc));
    let b2 = main.var("b2", Type::Class(boxc));
    let o1 = main.var("o1", Type::Class(object));
    let o2 = main.var("o2", Type::Class(object));
    main.alloc(m1, maker);
    main.invoke_virtual(m1, make_ref.clone(), vec![], Some(b1))?;
    main.alloc(o1, object);
    main.invoke_virtual(b1, put_ref.clone(), vec![o1], None)?;
    main.alloc(m2, maker);
    main.invoke_virtual(m2, make_ref, vec![], Some(b2))?;
    main.alloc(o2, object);
    main.invoke_virtual(b2, put_ref, vec![o2], None)?;
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    for descriptor in ["2-obj", "2-obj-1"] {
        let result = solve(&program, descriptor)?;
        let f1 = result.points_to_var_field(b1, val);
        let f2 = result.points_to_var_field(b2, val);
        assert_eq!(f1.len(), 1, "{descriptor}: b1.val stays precise");
        assert!(
            !f1.iter().any(|obj| f2.contains(obj)),
            "{descriptor}: no merging across maker instances"
        );
    }
    Ok(())
}

#[test]
fn test_selective_policy_mixes_sensitivity() -> Result<()> {
    // Same program as the call-site test, but the callee is virtual so a
    // receiver context would apply; with an empty selective policy everything
    // collapses to the context-insensitive result.
    let mut b = ProgramBuilder::new();
    let a = b.add_class("A").unwrap();

    let mut id = b.instance_method(a, "id");
    id.returns(Type::Class(a));
    let x = id.param("x", Type::Class(a));
    id.ret(Some(x));
    id.finish();

    let mut main = b.static_method(a, "main");
    let recv = main.var("recv", Type::Class(a));
    let v1 = main.var("v1", Type::Class(a));
    let v2 = main.var("v2", Type::Class(a));
    let r1 = main.var("r1", Type::Class(a));
    let r2 = main.var("r2", Type::Class(a));
    let id_ref = main.method_ref(
        a,
        "id",
        MethodDescriptor::new(vec![Type::Class(a)], Some(Type::Class(a))),
    );
    main.alloc(recv, a);
    main.alloc(v1, a);
    main.invoke_virtual(recv, id_ref.clone(), vec![v1], Some(r1))?;
    main.alloc(v2, a);
    main.invoke_virtual(recv, id_ref, vec![v2], Some(r2))?;
    let main = main.finish();
    b.set_entry(main)?;
    let program = b.finish();

    let options = AnalysisOptions {
        sensitivity: "1-call".to_string(),
        selective: Some(jscope::analysis::pta::SelectivePolicy::default()),
        ..AnalysisOptions::default()
    };
    let collapsed = PointerAnalysis::new(&program, options)?.solve()?;
    assert_eq!(collapsed.points_to_var(r1).len(), 2, "collapsed to ci");

    let full = solve(&program, "1-call")?;
    assert_eq!(full.points_to_var(r1).len(), 1);
    Ok(())
}
