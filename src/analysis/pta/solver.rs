//! Worklist-based pointer analysis solver.
//!
//! This module provides the fixpoint engine that simultaneously computes
//! points-to sets and discovers the program's call graph on the fly.
//!
//! # Algorithm
//!
//! The solver drains two queues to quiescence:
//!
//! 1. Initialize: create the context-sensitive method for every entry point
//!    under the empty context, mark it reachable, and seed its statements
//!    (allocations produce initial points-to facts, copies and static accesses
//!    produce initial flow edges, static invokes produce initial call edges).
//! 2. While pointer entries remain: pop `(pointer, delta)`, fold the delta into
//!    the pointer's points-to set, and forward the *newly added* objects to all
//!    flow successors.
//! 3. When a variable's points-to set grows, react to the statements indexed on
//!    that variable: wire instance-field and array-index pointers, and resolve
//!    receiver-dependent calls via virtual dispatch, binding the receiver into
//!    the callee's `this` and enqueueing the call edge.
//! 4. When no pointer entries remain, drain one call edge: a new edge makes its
//!    callee reachable (processing its body exactly once per distinct
//!    context-sensitive method) and wires argument-to-parameter and
//!    return-to-result flow.
//!
//! The loop terminates because every structure grows monotonically over a finite
//! universe of objects and contexts. A freshly added flow edge is seeded with its
//! source's points-to set at creation time; together with delta propagation this
//! makes the fixpoint edge-triggered, never re-scanning nodes.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{
    analysis::pta::{
        CallEdge, ContextFactory, ContextId, CsCallGraph, CsManager, CsMethodId, CsObjId, CsVarId,
        HeapModel, HeapOptions, Pointer, PointerAnalysisResult, PointerFlowGraph, PointerId,
        PointsToSet, SelectionCx, ContextSelector,
    },
    ir::{
        program::{OBJECT, STRING},
        CallKind, Program, StmtId, StmtKind, Type, VarId,
    },
    Error, Result,
};

/// Aggregate metrics of a finished solver run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolverStats {
    /// Number of reachable context-sensitive methods.
    pub reachable_methods: usize,
    /// Number of call edges in the context-sensitive call graph.
    pub call_edges: usize,
    /// Number of pointer nodes created.
    pub pointer_count: usize,
    /// Number of pointer-flow edges created.
    pub pfg_edges: usize,
    /// Number of distinct contexts interned.
    pub contexts: usize,
    /// Number of distinct context-sensitive objects.
    pub cs_objects: usize,
    /// Number of pointer entries processed until quiescence.
    pub processed_entries: usize,
}

/// Pending work of the solver.
///
/// Pointer entries and call edges are kept in separate FIFO queues; pointer
/// entries are always drained first. The interleaving affects performance only,
/// never the converged result.
#[derive(Debug, Default)]
struct WorkList {
    entries: VecDeque<(PointerId, PointsToSet)>,
    call_edges: VecDeque<CallEdge>,
}

impl WorkList {
    fn push_entry(&mut self, pointer: PointerId, pts: PointsToSet) {
        self.entries.push_back((pointer, pts));
    }

    fn pop_entry(&mut self) -> Option<(PointerId, PointsToSet)> {
        self.entries.pop_front()
    }

    fn push_call_edge(&mut self, edge: CallEdge) {
        self.call_edges.push_back(edge);
    }

    fn pop_call_edge(&mut self) -> Option<CallEdge> {
        self.call_edges.pop_front()
    }
}

/// The pointer analysis fixpoint engine.
///
/// One solver instance owns all analysis state (heap, contexts, CS elements,
/// pointer flow graph, call graph) for the duration of one `solve()` run; the
/// state is handed over to the [`PointerAnalysisResult`] on convergence.
pub(crate) struct Solver<'a> {
    program: &'a Program,
    selector: &'a ContextSelector,
    heap: HeapModel,
    factory: ContextFactory,
    csm: CsManager,
    pfg: PointerFlowGraph,
    cg: CsCallGraph,
    worklist: WorkList,
    /// Instance stores indexed by base variable.
    stores_on: HashMap<VarId, Vec<StmtId>>,
    /// Instance loads indexed by base variable.
    loads_on: HashMap<VarId, Vec<StmtId>>,
    /// Array stores indexed by array variable.
    array_stores_on: HashMap<VarId, Vec<StmtId>>,
    /// Array loads indexed by array variable.
    array_loads_on: HashMap<VarId, Vec<StmtId>>,
    /// Receiver-dependent invokes indexed by receiver variable.
    invokes_on: HashMap<VarId, Vec<StmtId>>,
    /// Methods whose statement indexes have been built.
    indexed_methods: HashSet<crate::ir::MethodId>,
    stats: SolverStats,
}

impl<'a> Solver<'a> {
    /// Creates a solver over a program with a fixed selection strategy.
    pub(crate) fn new(
        program: &'a Program,
        selector: &'a ContextSelector,
        heap_options: HeapOptions,
    ) -> Self {
        Self {
            program,
            selector,
            heap: HeapModel::new(program, heap_options),
            factory: ContextFactory::new(),
            csm: CsManager::new(),
            pfg: PointerFlowGraph::new(),
            cg: CsCallGraph::new(),
            worklist: WorkList::default(),
            stores_on: HashMap::new(),
            loads_on: HashMap::new(),
            array_stores_on: HashMap::new(),
            array_loads_on: HashMap::new(),
            invokes_on: HashMap::new(),
            indexed_methods: HashSet::new(),
            stats: SolverStats::default(),
        }
    }

    /// Runs the fixpoint to quiescence and returns the converged result.
    pub(crate) fn solve(mut self) -> Result<PointerAnalysisResult> {
        log::debug!(target: "pta-solver", "solving pointer analysis to fixpoint..");
        self.initialize()?;

        loop {
            if let Some((pointer, pts)) = self.worklist.pop_entry() {
                self.stats.processed_entries += 1;
                let delta = self.propagate(pointer, &pts);
                if !delta.is_empty() {
                    if let Pointer::Var(cs_var) = self.pfg.pointer(pointer) {
                        self.process_var_growth(cs_var, &delta)?;
                    }
                }
                continue;
            }
            if let Some(edge) = self.worklist.pop_call_edge() {
                self.process_call_edge(edge)?;
                continue;
            }
            break;
        }

        self.stats.reachable_methods = self.cg.reachable_count();
        self.stats.call_edges = self.cg.edge_count();
        self.stats.pointer_count = self.pfg.node_count();
        self.stats.pfg_edges = self.pfg.edge_count();
        self.stats.contexts = self.factory.context_count();
        self.stats.cs_objects = self.csm.obj_count();
        log::debug!(
            target: "pta-solver",
            "fixpoint reached: {} reachable methods, {} call edges, {} pointers",
            self.stats.reachable_methods,
            self.stats.call_edges,
            self.stats.pointer_count
        );

        Ok(PointerAnalysisResult::new(
            self.heap,
            self.factory,
            self.csm,
            self.pfg,
            self.cg,
            self.stats,
        ))
    }

    /// Seeds the analysis with the program's entry methods.
    fn initialize(&mut self) -> Result<()> {
        for &entry in self.program.entry_points() {
            let cs_method = self.csm.method(entry, ContextId::EMPTY);
            self.add_reachable(cs_method)?;
            self.seed_entry_environment(entry);
        }
        Ok(())
    }

    /// Binds mock objects for the `String[] args` parameter of an entry method.
    ///
    /// Models the runtime environment handing the entry method its argument
    /// array: one mock array object plus one mock string element, both under the
    /// empty context.
    fn seed_entry_environment(&mut self, entry: crate::ir::MethodId) {
        let program = self.program;
        let Some(method) = program.method(entry) else {
            return;
        };
        let Some(string) = program.class_id(STRING) else {
            return;
        };
        let args_ty = Type::array_of(Type::Class(string));

        for &param in &method.params {
            let matches_args = program.var(param).is_some_and(|v| v.ty == args_ty);
            if !matches_args {
                continue;
            }

            let key = entry.to_string();
            let args_obj =
                self.heap
                    .mock_obj("entry-point-args", &key, args_ty.clone(), Some(entry));
            let cs_args = self.csm.obj(args_obj, ContextId::EMPTY);
            let param_ptr = self.var_ptr(param, ContextId::EMPTY);
            self.worklist
                .push_entry(param_ptr, PointsToSet::singleton(cs_args));

            let elem_obj = self.heap.mock_obj(
                "entry-point-args-elem",
                &key,
                Type::Class(string),
                Some(entry),
            );
            let cs_elem = self.csm.obj(elem_obj, ContextId::EMPTY);
            let elem_ptr = self.pfg.array_index_ptr(cs_args);
            self.worklist
                .push_entry(elem_ptr, PointsToSet::singleton(cs_elem));
        }
    }

    /// Marks a context-sensitive method reachable and seeds its body once.
    fn add_reachable(&mut self, cs_method: CsMethodId) -> Result<()> {
        if !self.cg.add_reachable(cs_method) {
            return Ok(());
        }

        let cs = self.csm.method_of(cs_method);
        let program = self.program;
        let method = program.method(cs.method).expect("reachable method should exist");
        let Some(body) = &method.body else {
            log::warn!(
                target: "pta-solver",
                "skipping method without body: {}.{}",
                program.class_name(method.class),
                method.name
            );
            return Ok(());
        };

        self.index_method(cs.method);
        for &sid in body {
            self.process_stmt(cs_method, cs.ctx, sid)?;
        }
        Ok(())
    }

    /// First-time processing of one statement under a calling context.
    fn process_stmt(
        &mut self,
        cs_method: CsMethodId,
        ctx: ContextId,
        sid: StmtId,
    ) -> Result<()> {
        let program = self.program;
        let stmt = program.stmt(sid).expect("body statement should exist");

        match &stmt.kind {
            StmtKind::New { lhs, .. } | StmtKind::NewArray { lhs, .. } => {
                let obj = self.heap.obj_of(program, sid);
                let heap_ctx =
                    self.selector
                        .select_heap_context(self.selection_cx(), cs_method, obj);
                let cs_obj = self.csm.obj(obj, heap_ctx);
                let lhs_ptr = self.var_ptr(*lhs, ctx);
                self.worklist
                    .push_entry(lhs_ptr, PointsToSet::singleton(cs_obj));
            }
            StmtKind::AssignLiteral { lhs, literal } => {
                let obj = self.heap.constant_obj(literal);
                let cs_obj = self.csm.obj(obj, ContextId::EMPTY);
                let lhs_ptr = self.var_ptr(*lhs, ctx);
                self.worklist
                    .push_entry(lhs_ptr, PointsToSet::singleton(cs_obj));
            }
            StmtKind::Copy { lhs, rhs } => {
                let from = self.var_ptr(*rhs, ctx);
                let to = self.var_ptr(*lhs, ctx);
                self.add_pfg_edge(from, to);
            }
            StmtKind::LoadStatic { lhs, field } => {
                let from = self.pfg.static_field_ptr(*field);
                let to = self.var_ptr(*lhs, ctx);
                self.add_pfg_edge(from, to);
            }
            StmtKind::StoreStatic { field, rhs } => {
                let from = self.var_ptr(*rhs, ctx);
                let to = self.pfg.static_field_ptr(*field);
                self.add_pfg_edge(from, to);
            }
            StmtKind::Invoke(invoke) if invoke.kind == CallKind::Static => {
                self.process_static_call(ctx, sid)?;
            }
            // Instance field/array accesses and receiver-dependent calls react
            // to receiver points-to growth, not to first-time processing.
            StmtKind::LoadField { .. }
            | StmtKind::StoreField { .. }
            | StmtKind::LoadArray { .. }
            | StmtKind::StoreArray { .. }
            | StmtKind::Invoke(_)
            | StmtKind::Return(_) => {}
        }
        Ok(())
    }

    /// Resolves and enqueues a static call discovered during body seeding.
    fn process_static_call(&mut self, ctx: ContextId, sid: StmtId) -> Result<()> {
        let program = self.program;
        let stmt = program.stmt(sid).expect("invoke statement should exist");
        let invoke = stmt.as_invoke().expect("static call site should be an invoke");

        let callee = program.resolve_method(&invoke.target)?;
        let callee_method = program.method(callee).expect("resolved method should exist");
        if !callee_method.has_body() {
            log::warn!(
                target: "pta-solver",
                "call to method without body treated as no-op: {}.{}",
                program.class_name(callee_method.class),
                callee_method.name
            );
            return Ok(());
        }

        let cs_call_site = self.csm.call_site(sid, ctx);
        let callee_ctx =
            self.selector
                .select_context(self.selection_cx(), cs_call_site, None, callee);
        let cs_callee = self.csm.method(callee, callee_ctx);
        self.worklist
            .push_call_edge(CallEdge::new(invoke.kind, cs_call_site, cs_callee));
        Ok(())
    }

    /// Folds a delta into `pt(pointer)` and forwards the growth to successors.
    fn propagate(&mut self, pointer: PointerId, pts: &PointsToSet) -> PointsToSet {
        let mut delta = PointsToSet::new();
        let target = self.pfg.pts_mut(pointer);
        for obj in pts.iter() {
            if target.add(obj) {
                delta.add(obj);
            }
        }

        if !delta.is_empty() {
            let successors: Vec<PointerId> = self.pfg.successors_of(pointer).collect();
            for succ in successors {
                self.worklist.push_entry(succ, delta.clone());
            }
        }
        delta
    }

    /// Reacts to growth of a variable's points-to set.
    fn process_var_growth(&mut self, cs_var: CsVarId, delta: &PointsToSet) -> Result<()> {
        let cs = self.csm.var_of(cs_var);
        let (var, ctx) = (cs.var, cs.ctx);
        let program = self.program;

        // Instance stores: v.f = x  =>  x flows into o.f for each new o.
        for sid in self.indexed(&self.stores_on, var) {
            let stmt = program.stmt(sid).expect("indexed statement should exist");
            let StmtKind::StoreField { field, rhs, .. } = &stmt.kind else {
                continue;
            };
            for obj in delta.iter() {
                let target = self.pfg.instance_field_ptr(obj, *field);
                let source = self.var_ptr(*rhs, ctx);
                self.add_pfg_edge(source, target);
            }
        }

        // Instance loads: y = v.f  =>  o.f flows into y for each new o.
        for sid in self.indexed(&self.loads_on, var) {
            let stmt = program.stmt(sid).expect("indexed statement should exist");
            let StmtKind::LoadField { lhs, field, .. } = &stmt.kind else {
                continue;
            };
            for obj in delta.iter() {
                let source = self.pfg.instance_field_ptr(obj, *field);
                let target = self.var_ptr(*lhs, ctx);
                self.add_pfg_edge(source, target);
            }
        }

        // Array stores: v[*] = x, only for objects that actually are arrays.
        for sid in self.indexed(&self.array_stores_on, var) {
            let stmt = program.stmt(sid).expect("indexed statement should exist");
            let StmtKind::StoreArray { rhs, .. } = &stmt.kind else {
                continue;
            };
            for obj in delta.iter() {
                if !self.is_array_obj(obj) {
                    continue;
                }
                let target = self.pfg.array_index_ptr(obj);
                let source = self.var_ptr(*rhs, ctx);
                self.add_pfg_edge(source, target);
            }
        }

        // Array loads: y = v[*].
        for sid in self.indexed(&self.array_loads_on, var) {
            let stmt = program.stmt(sid).expect("indexed statement should exist");
            let StmtKind::LoadArray { lhs, .. } = &stmt.kind else {
                continue;
            };
            for obj in delta.iter() {
                if !self.is_array_obj(obj) {
                    continue;
                }
                let source = self.pfg.array_index_ptr(obj);
                let target = self.var_ptr(*lhs, ctx);
                self.add_pfg_edge(source, target);
            }
        }

        // Receiver-dependent calls.
        for sid in self.indexed(&self.invokes_on, var) {
            for obj in delta.iter() {
                self.process_call(sid, ctx, obj)?;
            }
        }
        Ok(())
    }

    /// Resolves one receiver-dependent call against one receiver object.
    fn process_call(&mut self, sid: StmtId, caller_ctx: ContextId, recv: CsObjId) -> Result<()> {
        let program = self.program;
        let stmt = program.stmt(sid).expect("invoke statement should exist");
        let invoke = stmt.as_invoke().expect("call site should be an invoke");
        let cs_recv = self.csm.obj_of(recv);

        let callee = match invoke.kind {
            CallKind::Virtual | CallKind::Interface => {
                match self.heap.obj_type(cs_recv.obj) {
                    Type::Class(class) => program.dispatch(class, &invoke.target)?,
                    // Array receivers dispatch through java.lang.Object.
                    Type::Array(_) => {
                        let object = program.class_id(OBJECT).ok_or_else(|| {
                            Error::UnresolvedDispatch {
                                class: "java.lang.Object".to_string(),
                                method: program
                                    .subsignature(&invoke.target.name, &invoke.target.descriptor),
                            }
                        })?;
                        program.dispatch(object, &invoke.target)?
                    }
                    other => {
                        return Err(Error::UnresolvedDispatch {
                            class: program.type_name(&other),
                            method: program
                                .subsignature(&invoke.target.name, &invoke.target.descriptor),
                        });
                    }
                }
            }
            CallKind::Special => program.resolve_method(&invoke.target)?,
            // Static calls never reach receiver-driven resolution.
            CallKind::Static => return Ok(()),
        };

        let callee_method = program.method(callee).expect("resolved method should exist");
        if !callee_method.has_body() {
            log::warn!(
                target: "pta-solver",
                "call to method without body treated as no-op: {}.{}",
                program.class_name(callee_method.class),
                callee_method.name
            );
            return Ok(());
        }

        let cs_call_site = self.csm.call_site(sid, caller_ctx);
        let callee_ctx =
            self.selector
                .select_context(self.selection_cx(), cs_call_site, Some(recv), callee);
        let cs_callee = self.csm.method(callee, callee_ctx);

        // Bind the receiver into the callee's `this`.
        if let Some(this_var) = callee_method.this_var {
            let this_ptr = self.var_ptr(this_var, callee_ctx);
            self.worklist
                .push_entry(this_ptr, PointsToSet::singleton(recv));
        }

        self.worklist
            .push_call_edge(CallEdge::new(invoke.kind, cs_call_site, cs_callee));
        Ok(())
    }

    /// Drains one call edge: make the callee reachable, wire parameters and returns.
    fn process_call_edge(&mut self, edge: CallEdge) -> Result<()> {
        if !self.cg.add_edge(edge) {
            return Ok(());
        }
        self.add_reachable(edge.callee)?;

        let program = self.program;
        let cs_site = self.csm.call_site_of(edge.call_site);
        let stmt = program
            .stmt(cs_site.call_site)
            .expect("call-site statement should exist");
        let invoke = stmt.as_invoke().expect("call edge should start at an invoke");

        let cs_callee = self.csm.method_of(edge.callee);
        let callee = program
            .method(cs_callee.method)
            .expect("callee method should exist");

        for (&arg, &param) in invoke.args.iter().zip(callee.params.iter()) {
            let from = self.var_ptr(arg, cs_site.ctx);
            let to = self.var_ptr(param, cs_callee.ctx);
            self.add_pfg_edge(from, to);
        }

        if let Some(result) = invoke.result {
            let to = self.var_ptr(result, cs_site.ctx);
            for &ret in &callee.ret_vars {
                let from = self.var_ptr(ret, cs_callee.ctx);
                self.add_pfg_edge(from, to);
            }
        }
        Ok(())
    }

    /// Adds a flow edge, seeding the target with the source's current facts.
    ///
    /// The seeding is what keeps edge-triggered propagation complete: an edge
    /// created after its source already points somewhere must still deliver
    /// those objects.
    fn add_pfg_edge(&mut self, from: PointerId, to: PointerId) {
        if self.pfg.add_edge(from, to) {
            let snapshot = self.pfg.pts(from);
            if !snapshot.is_empty() {
                let snapshot = snapshot.clone();
                self.worklist.push_entry(to, snapshot);
            }
        }
    }

    /// Builds the per-variable statement indexes of a method, once.
    fn index_method(&mut self, method: crate::ir::MethodId) {
        if !self.indexed_methods.insert(method) {
            return;
        }
        let program = self.program;
        let Some(body) = program.method(method).and_then(|m| m.body.as_ref()) else {
            return;
        };

        for &sid in body {
            let stmt = program.stmt(sid).expect("body statement should exist");
            match &stmt.kind {
                StmtKind::StoreField { base, .. } => {
                    self.stores_on.entry(*base).or_default().push(sid);
                }
                StmtKind::LoadField { base, .. } => {
                    self.loads_on.entry(*base).or_default().push(sid);
                }
                StmtKind::StoreArray { array, .. } => {
                    self.array_stores_on.entry(*array).or_default().push(sid);
                }
                StmtKind::LoadArray { array, .. } => {
                    self.array_loads_on.entry(*array).or_default().push(sid);
                }
                StmtKind::Invoke(invoke) => {
                    if let Some(recv) = invoke.recv {
                        self.invokes_on.entry(recv).or_default().push(sid);
                    }
                }
                _ => {}
            }
        }
    }

    fn indexed(&self, index: &HashMap<VarId, Vec<StmtId>>, var: VarId) -> Vec<StmtId> {
        index.get(&var).cloned().unwrap_or_default()
    }

    fn var_ptr(&mut self, var: VarId, ctx: ContextId) -> PointerId {
        let cs_var = self.csm.var(var, ctx);
        self.pfg.var_ptr(cs_var)
    }

    fn is_array_obj(&self, obj: CsObjId) -> bool {
        let cs = self.csm.obj_of(obj);
        self.heap.obj_type(cs.obj).is_array()
    }

    fn selection_cx(&self) -> SelectionCx<'_> {
        SelectionCx {
            factory: &self.factory,
            csm: &self.csm,
            heap: &self.heap,
            program: self.program,
        }
    }
}
