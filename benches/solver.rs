//! Benchmarks for the pointer analysis solver.
//!
//! Measures the two hot paths of the engine:
//! - Context interning (append with k-limiting)
//! - Solving a synthetic call chain under different sensitivities

extern crate jscope;

use criterion::{criterion_group, criterion_main, Criterion};
use jscope::analysis::pta::{
    AnalysisOptions, ContextElement, ContextFactory, ContextId, PointerAnalysis,
};
use jscope::ir::{ClassId, MethodDescriptor, Program, ProgramBuilder, Type};
use std::hint::black_box;

/// Benchmark appending context elements with a depth limit of 2.
fn bench_context_append(c: &mut Criterion) {
    let mut builder = ProgramBuilder::new();
    let classes: Vec<ClassId> = (0..64)
        .map(|i| builder.add_class(&format!("K{i}")).unwrap())
        .collect();

    c.bench_function("context_append_k2", |b| {
        b.iter(|| {
            let factory = ContextFactory::new();
            let mut ctx = ContextId::EMPTY;
            for &class in &classes {
                ctx = factory.append(ctx, ContextElement::Type(class), 2);
            }
            black_box(ctx)
        });
    });
}

/// Build a chain of `depth` classes where each method allocates and calls the next.
fn chained_program(depth: usize) -> Program {
    let mut b = ProgramBuilder::new();
    let root = b.add_class("C0").unwrap();

    let mut classes = vec![root];
    for i in 1..depth {
        classes.push(b.add_class(&format!("C{i}")).unwrap());
    }

    // Each class gets `step()`, calling the next class's step on a fresh object.
    for (i, &class) in classes.iter().enumerate() {
        let mut step = b.instance_method(class, "step");
        if i + 1 < depth {
            let next = classes[i + 1];
            let v = step.var("next", Type::Class(next));
            step.alloc(v, next);
            let step_ref = step.method_ref(next, "step", MethodDescriptor::void());
            step.invoke_virtual(v, step_ref, vec![], None).unwrap();
        }
        step.finish();
    }

    let mut main = b.static_method(root, "main");
    let v = main.var("c", Type::Class(root));
    main.alloc(v, root);
    let step_ref = main.method_ref(root, "step", MethodDescriptor::void());
    main.invoke_virtual(v, step_ref, vec![], None).unwrap();
    let main = main.finish();
    b.set_entry(main).unwrap();
    b.finish()
}

/// Benchmark solving a 64-deep call chain under different sensitivities.
fn bench_solve_call_chain(c: &mut Criterion) {
    let program = chained_program(64);

    for sensitivity in ["ci", "1-call", "2-obj"] {
        c.bench_function(&format!("solve_chain64_{sensitivity}"), |b| {
            b.iter(|| {
                let options = AnalysisOptions {
                    sensitivity: sensitivity.to_string(),
                    ..AnalysisOptions::default()
                };
                let result = PointerAnalysis::new(black_box(&program), options)
                    .unwrap()
                    .solve()
                    .unwrap();
                black_box(result.stats())
            });
        });
    }
}

criterion_group!(benches, bench_context_append, bench_solve_call_chain);
criterion_main!(benches);
