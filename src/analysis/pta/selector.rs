//! Context selection strategies.
//!
//! A [`ContextSelector`] decides, at every discovered call edge, which context the
//! callee is analyzed under, and at every allocation, which heap context the fresh
//! object carries. The selector family is a closed set of policies over which
//! context elements are used:
//!
//! - [`ContextSelector::Insensitive`] - always the empty context
//! - [`ContextSelector::KCall`] - append the call site, keep the last `k`
//! - [`ContextSelector::KObj`] - append the receiver object, keep the last `k`
//! - [`ContextSelector::KType`] - append the receiver's container class
//! - [`ContextSelector::TwoCall`] / [`ContextSelector::TwoObj`] - fixed-length
//!   specializations of the common depth-2 configurations
//! - [`ContextSelector::Selective`] - delegate, but collapse unselected
//!   methods/objects to the empty context
//! - [`ContextSelector::Guided`] - per-method variant chosen by an external plan
//!
//! Selectors are configured from a [`Sensitivity`] descriptor string such as
//! `ci`, `2-obj`, or `1-call-0`; malformed descriptors are fatal configuration
//! errors raised before analysis starts.

use std::collections::{HashMap, HashSet};

use crate::{
    analysis::pta::{
        ContextElement, ContextFactory, ContextId, CsCallSiteId, CsManager, CsMethodId, CsObjId,
        HeapModel, Obj, ObjId,
    },
    ir::{MethodId, Program, StmtId},
    Result,
};

/// A parsed sensitivity descriptor.
///
/// The textual form is `ci` or `k-kind[-hk]` where `kind` is one of `call`,
/// `obj`, `type`; `k` limits method contexts and `hk` limits heap contexts
/// (defaulting to `k - 1`). The depth-2 descriptors without an explicit heap
/// limit map to the fixed-length specializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    /// Context-insensitive analysis.
    Insensitive,
    /// k-limited call-site sensitivity.
    KCall {
        /// Method-context limit.
        k: u32,
        /// Heap-context limit.
        hk: u32,
    },
    /// k-limited object sensitivity.
    KObj {
        /// Method-context limit.
        k: u32,
        /// Heap-context limit.
        hk: u32,
    },
    /// k-limited type sensitivity.
    KType {
        /// Method-context limit.
        k: u32,
        /// Heap-context limit.
        hk: u32,
    },
    /// Fixed-length 2-call-site sensitivity.
    TwoCall,
    /// Fixed-length 2-object sensitivity.
    TwoObj,
}

impl Sensitivity {
    /// Parses a sensitivity descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] for anything that is not `ci` or a
    /// well-formed `k-kind[-hk]` string. There is no silent fallback: a typo in
    /// the descriptor aborts analysis construction.
    pub fn parse(descriptor: &str) -> Result<Self> {
        if descriptor == "ci" {
            return Ok(Self::Insensitive);
        }

        let parts: Vec<&str> = descriptor.split('-').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(config_error!(
                "malformed sensitivity descriptor '{}', expected 'ci' or 'k-kind[-hk]'",
                descriptor
            ));
        }

        let k: u32 = parts[0].parse().map_err(|_| {
            config_error!(
                "malformed sensitivity descriptor '{}': '{}' is not a context limit",
                descriptor,
                parts[0]
            )
        })?;
        let hk = match parts.get(2) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
                config_error!(
                    "malformed sensitivity descriptor '{}': '{}' is not a heap-context limit",
                    descriptor,
                    raw
                )
            })?),
            None => None,
        };

        match parts[1] {
            "call" => Ok(match (k, hk) {
                (2, None) => Self::TwoCall,
                _ => Self::KCall {
                    k,
                    hk: hk.unwrap_or_else(|| k.saturating_sub(1)),
                },
            }),
            "obj" => Ok(match (k, hk) {
                (2, None) => Self::TwoObj,
                _ => Self::KObj {
                    k,
                    hk: hk.unwrap_or_else(|| k.saturating_sub(1)),
                },
            }),
            "type" => Ok(Self::KType {
                k,
                hk: hk.unwrap_or_else(|| k.saturating_sub(1)),
            }),
            kind => Err(config_error!(
                "unsupported sensitivity variant '{}' in descriptor '{}'",
                kind,
                descriptor
            )),
        }
    }
}

/// Per-method variant names accepted by guided selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidedVariant {
    /// Context-insensitive.
    Ci,
    /// 1-type sensitivity.
    OneType,
    /// 2-type sensitivity.
    TwoType,
    /// 2-object sensitivity.
    TwoObj,
}

impl GuidedVariant {
    /// Parses a variant name from a guidance plan.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] for unknown variant names; an invalid
    /// plan is a fatal configuration error, never a silent default.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "ci" => Ok(Self::Ci),
            "1-type" => Ok(Self::OneType),
            "2-type" => Ok(Self::TwoType),
            "2-obj" => Ok(Self::TwoObj),
            _ => Err(config_error!("unknown guided variant '{}'", name)),
        }
    }
}

/// Selection predicate for [`ContextSelector::Selective`].
///
/// Methods and allocation sites listed here receive context from the inner
/// selector; everything else collapses to the empty context. Objects that are
/// not site-allocated (constants, merged, mock) are never selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectivePolicy {
    /// Methods analyzed context-sensitively.
    pub methods: HashSet<MethodId>,
    /// Allocation sites whose objects carry heap contexts.
    pub alloc_sites: HashSet<StmtId>,
}

impl SelectivePolicy {
    /// Returns `true` if the callee should receive a context.
    #[must_use]
    pub fn selects_method(&self, method: MethodId) -> bool {
        self.methods.contains(&method)
    }

    /// Returns `true` if the object should carry a heap context.
    #[must_use]
    pub fn selects_obj(&self, heap: &HeapModel, obj: ObjId) -> bool {
        match heap.obj(obj) {
            Some(Obj::New { site, .. }) => self.alloc_sites.contains(site),
            _ => false,
        }
    }
}

/// Shared lookup state handed to the selector on every decision.
///
/// Bundles the canonicalization tables a policy may need: contexts, CS elements,
/// the heap model (for receiver object attributes), and the program (for
/// container classes).
#[derive(Clone, Copy)]
pub struct SelectionCx<'a> {
    /// Context interning factory.
    pub factory: &'a ContextFactory,
    /// CS element tables.
    pub csm: &'a CsManager,
    /// Abstract heap.
    pub heap: &'a HeapModel,
    /// Program model.
    pub program: &'a Program,
}

/// A context selection strategy.
///
/// See the [module documentation](self) for the policy catalog. Selection never
/// fails: every policy degrades to a coarser context when an input it would use
/// is unavailable (e.g. a receiver object without a resolvable container class
/// under type sensitivity).
#[derive(Debug, Clone, PartialEq)]
pub enum ContextSelector {
    /// Always the empty context.
    Insensitive,
    /// k-limited call-site sensitivity.
    KCall {
        /// Method-context limit.
        k: u32,
        /// Heap-context limit.
        hk: u32,
    },
    /// k-limited object sensitivity.
    KObj {
        /// Method-context limit.
        k: u32,
        /// Heap-context limit.
        hk: u32,
    },
    /// k-limited type sensitivity.
    KType {
        /// Method-context limit.
        k: u32,
        /// Heap-context limit.
        hk: u32,
    },
    /// Fixed-length 2-call-site sensitivity with a depth-1 heap context.
    TwoCall,
    /// Fixed-length 2-object sensitivity with a depth-1 heap context.
    TwoObj,
    /// Delegates to `inner`, collapsing unselected methods and objects.
    Selective {
        /// The wrapped selector.
        inner: Box<ContextSelector>,
        /// Which methods/objects stay context-sensitive.
        policy: SelectivePolicy,
    },
    /// Per-method variants chosen by an externally supplied plan.
    ///
    /// Methods absent from the plan are context-insensitive.
    Guided {
        /// Validated per-method plan.
        plan: HashMap<MethodId, GuidedVariant>,
    },
}

impl ContextSelector {
    /// Builds the selector matching a parsed [`Sensitivity`].
    #[must_use]
    pub fn from_sensitivity(sensitivity: Sensitivity) -> Self {
        match sensitivity {
            Sensitivity::Insensitive => Self::Insensitive,
            Sensitivity::KCall { k, hk } => Self::KCall { k, hk },
            Sensitivity::KObj { k, hk } => Self::KObj { k, hk },
            Sensitivity::KType { k, hk } => Self::KType { k, hk },
            Sensitivity::TwoCall => Self::TwoCall,
            Sensitivity::TwoObj => Self::TwoObj,
        }
    }

    /// Validates a textual guidance plan into a guided selector.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if any variant name is unknown. The whole
    /// plan is validated eagerly so that a bad entry fails analysis construction,
    /// not the first call into the offending method.
    pub fn guided(plan: &HashMap<MethodId, String>) -> Result<Self> {
        let mut validated = HashMap::with_capacity(plan.len());
        for (&method, name) in plan {
            validated.insert(method, GuidedVariant::from_name(name)?);
        }
        Ok(Self::Guided { plan: validated })
    }

    /// Selects the callee context for a call edge.
    ///
    /// `recv` is the receiver object for virtual/interface dispatch and `None`
    /// for static and special calls resolved without a receiver's points-to
    /// information.
    #[must_use]
    pub fn select_context(
        &self,
        cx: SelectionCx<'_>,
        call_site: CsCallSiteId,
        recv: Option<CsObjId>,
        callee: MethodId,
    ) -> ContextId {
        match self {
            Self::Insensitive => ContextId::EMPTY,
            Self::KCall { k, .. } => select_call(cx, call_site, *k),
            Self::KObj { k, .. } => select_obj(cx, call_site, recv, *k),
            Self::KType { k, .. } => select_type(cx, call_site, recv, *k),
            Self::TwoCall => select_call(cx, call_site, 2),
            Self::TwoObj => select_obj(cx, call_site, recv, 2),
            Self::Selective { inner, policy } => {
                if policy.selects_method(callee) {
                    inner.select_context(cx, call_site, recv, callee)
                } else {
                    ContextId::EMPTY
                }
            }
            Self::Guided { plan } => match plan.get(&callee).copied().unwrap_or(GuidedVariant::Ci)
            {
                GuidedVariant::Ci => ContextId::EMPTY,
                GuidedVariant::OneType => select_type(cx, call_site, recv, 1),
                GuidedVariant::TwoType => select_type(cx, call_site, recv, 2),
                GuidedVariant::TwoObj => select_obj(cx, call_site, recv, 2),
            },
        }
    }

    /// Selects the heap context for an object allocated in `method`.
    #[must_use]
    pub fn select_heap_context(
        &self,
        cx: SelectionCx<'_>,
        method: CsMethodId,
        obj: ObjId,
    ) -> ContextId {
        match self {
            Self::Insensitive => ContextId::EMPTY,
            Self::KCall { hk, .. } | Self::KObj { hk, .. } | Self::KType { hk, .. } => {
                heap_from_method(cx, method, *hk)
            }
            Self::TwoCall | Self::TwoObj => heap_from_method(cx, method, 1),
            Self::Selective { inner, policy } => {
                if policy.selects_obj(cx.heap, obj) {
                    inner.select_heap_context(cx, method, obj)
                } else {
                    ContextId::EMPTY
                }
            }
            Self::Guided { plan } => {
                let allocator = cx.csm.method_of(method).method;
                match plan.get(&allocator).copied().unwrap_or(GuidedVariant::Ci) {
                    GuidedVariant::Ci | GuidedVariant::OneType => ContextId::EMPTY,
                    GuidedVariant::TwoType | GuidedVariant::TwoObj => heap_from_method(cx, method, 1),
                }
            }
        }
    }
}

/// Call-site sensitivity: append the invoke statement to the caller's context.
fn select_call(cx: SelectionCx<'_>, call_site: CsCallSiteId, k: u32) -> ContextId {
    let cs = cx.csm.call_site_of(call_site);
    cx.factory
        .append(cs.ctx, ContextElement::CallSite(cs.call_site), k)
}

/// Object sensitivity: append the receiver object to its own heap context.
///
/// Static calls keep the caller's context unchanged.
fn select_obj(cx: SelectionCx<'_>, call_site: CsCallSiteId, recv: Option<CsObjId>, k: u32) -> ContextId {
    match recv {
        Some(recv) => {
            let cs_obj = cx.csm.obj_of(recv);
            cx.factory
                .append(cs_obj.ctx, ContextElement::Obj(cs_obj.obj), k)
        }
        None => cx.csm.call_site_of(call_site).ctx,
    }
}

/// Type sensitivity: append the receiver's container class to its heap context.
///
/// Falls back to a plain truncation when the container class is unresolvable,
/// and to the caller's context for static calls.
fn select_type(cx: SelectionCx<'_>, call_site: CsCallSiteId, recv: Option<CsObjId>, k: u32) -> ContextId {
    match recv {
        Some(recv) => {
            let cs_obj = cx.csm.obj_of(recv);
            match cx.heap.container_class(cx.program, cs_obj.obj) {
                Some(class) => cx
                    .factory
                    .append(cs_obj.ctx, ContextElement::Type(class), k),
                None => cx.factory.make_last_k(cs_obj.ctx, k),
            }
        }
        None => cx.csm.call_site_of(call_site).ctx,
    }
}

/// Heap context: the last `hk` elements of the allocating method's context.
fn heap_from_method(cx: SelectionCx<'_>, method: CsMethodId, hk: u32) -> ContextId {
    let cs = cx.csm.method_of(method);
    cx.factory.make_last_k(cs.ctx, hk)
}
