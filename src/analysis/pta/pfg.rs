//! Pointer flow graph and points-to sets.
//!
//! Nodes of the pointer flow graph are abstract pointers: context-sensitive
//! variables, per-(object, field) instance-field slots, per-object array-index
//! slots, and per-field static slots. A directed edge `from -> to` means
//! "points-to facts flow from `from` to `to`"; the solver propagates only deltas
//! along these edges.
//!
//! The graph grows monotonically as code is discovered: nodes and edges are never
//! removed, points-to sets never shrink, and edge insertion is idempotent. These
//! are the invariants that make the edge-triggered fixpoint of the solver sound.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::analysis::pta::{CsObjId, CsVarId};
use crate::ir::FieldId;

/// Handle to a pointer node in the flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub(crate) u32);

impl PointerId {
    /// Returns the arena index of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ptr#{}", self.0)
    }
}

/// An abstract pointer.
///
/// The four kinds form a closed set; every rule of the analysis addresses its
/// sources and targets through exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pointer {
    /// A context-sensitive variable.
    Var(CsVarId),
    /// An instance field of a context-sensitive object.
    InstanceField(CsObjId, FieldId),
    /// The elements of a context-sensitive array object (index-insensitive).
    ArrayIndex(CsObjId),
    /// A static field.
    StaticField(FieldId),
}

/// A monotonically growing set of context-sensitive objects.
///
/// Points-to sets only ever grow; the single mutation is [`PointsToSet::add`],
/// and merging happens by iterating a delta. Shrinking a set would break the
/// edge-triggered propagation of the solver, so no removal API exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointsToSet {
    objs: HashSet<CsObjId>,
}

impl PointsToSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set containing a single object.
    #[must_use]
    pub fn singleton(obj: CsObjId) -> Self {
        let mut set = Self::new();
        set.add(obj);
        set
    }

    /// Adds an object; returns `true` if it was not present before.
    pub fn add(&mut self, obj: CsObjId) -> bool {
        self.objs.insert(obj)
    }

    /// Returns `true` if the object is in the set.
    #[must_use]
    pub fn contains(&self, obj: CsObjId) -> bool {
        self.objs.contains(&obj)
    }

    /// Returns the number of objects in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objs.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    /// Iterates over the objects in the set.
    pub fn iter(&self) -> impl Iterator<Item = CsObjId> + '_ {
        self.objs.iter().copied()
    }
}

impl FromIterator<CsObjId> for PointsToSet {
    fn from_iter<I: IntoIterator<Item = CsObjId>>(iter: I) -> Self {
        Self {
            objs: iter.into_iter().collect(),
        }
    }
}

/// One node of the pointer flow graph.
#[derive(Debug)]
struct PointerNode {
    /// The pointer this node stands for.
    pointer: Pointer,
    /// Objects this pointer may refer to.
    pts: PointsToSet,
    /// Flow targets of this pointer.
    succs: HashSet<PointerId>,
}

/// The pointer flow graph.
///
/// Nodes are created lazily and memoized by their defining [`Pointer`] key, so
/// repeated lookups return the same node. The graph is owned exclusively by the
/// solver while solving; afterwards it is read-only.
#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    nodes: Vec<PointerNode>,
    ids: HashMap<Pointer, PointerId>,
    edge_count: usize,
}

impl PointerFlowGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node for a pointer, creating it if needed.
    pub fn get_or_insert(&mut self, pointer: Pointer) -> PointerId {
        if let Some(&id) = self.ids.get(&pointer) {
            return id;
        }
        let id = PointerId(u32::try_from(self.nodes.len()).expect("pointer arena exceeds u32 range"));
        self.nodes.push(PointerNode {
            pointer,
            pts: PointsToSet::new(),
            succs: HashSet::new(),
        });
        self.ids.insert(pointer, id);
        id
    }

    /// Returns the node for a context-sensitive variable, creating it if needed.
    pub fn var_ptr(&mut self, var: CsVarId) -> PointerId {
        self.get_or_insert(Pointer::Var(var))
    }

    /// Returns the node for an instance field, creating it if needed.
    pub fn instance_field_ptr(&mut self, obj: CsObjId, field: FieldId) -> PointerId {
        self.get_or_insert(Pointer::InstanceField(obj, field))
    }

    /// Returns the node for an array's elements, creating it if needed.
    pub fn array_index_ptr(&mut self, obj: CsObjId) -> PointerId {
        self.get_or_insert(Pointer::ArrayIndex(obj))
    }

    /// Returns the node for a static field, creating it if needed.
    pub fn static_field_ptr(&mut self, field: FieldId) -> PointerId {
        self.get_or_insert(Pointer::StaticField(field))
    }

    /// Returns the node for a pointer without creating it.
    #[must_use]
    pub fn lookup(&self, pointer: Pointer) -> Option<PointerId> {
        self.ids.get(&pointer).copied()
    }

    /// Returns the pointer a node stands for.
    #[must_use]
    pub fn pointer(&self, id: PointerId) -> Pointer {
        self.nodes[id.index()].pointer
    }

    /// Adds a flow edge; returns `true` if the edge is new.
    ///
    /// Re-adding an existing edge is a no-op and returns `false`.
    pub fn add_edge(&mut self, from: PointerId, to: PointerId) -> bool {
        let added = self.nodes[from.index()].succs.insert(to);
        if added {
            self.edge_count += 1;
        }
        added
    }

    /// Iterates over the flow targets of a pointer.
    pub fn successors_of(&self, id: PointerId) -> impl Iterator<Item = PointerId> + '_ {
        self.nodes[id.index()].succs.iter().copied()
    }

    /// Returns the points-to set of a pointer.
    #[must_use]
    pub fn pts(&self, id: PointerId) -> &PointsToSet {
        &self.nodes[id.index()].pts
    }

    /// Returns the points-to set of a pointer for mutation by the solver.
    pub(crate) fn pts_mut(&mut self, id: PointerId) -> &mut PointsToSet {
        &mut self.nodes[id.index()].pts
    }

    /// Returns the number of pointer nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of flow edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Iterates over all pointer nodes.
    pub fn pointers(&self) -> impl Iterator<Item = (PointerId, Pointer)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (PointerId(index as u32), node.pointer))
    }
}
