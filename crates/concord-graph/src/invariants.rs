//! Structural invariant checks.
//!
//! This is a diagnostic, not a hot path: it walks the whole structure and
//! is meant for tests and for debugging builds that want to fail loudly.

use crate::Key;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// A transcript-like structure whose causal order can be audited.
pub trait CausalOrder {
    type Id: Key;
    type Chain: Key;

    /// All ids, in the order they were added.
    fn ids(&self) -> Vec<Self::Id>;

    /// Chain (author) of a node, if present.
    fn chain_of(&self, id: &Self::Id) -> Option<Self::Chain>;

    /// Direct parents of a node.
    fn parents_of(&self, id: &Self::Id) -> Vec<Self::Id>;

    /// True iff `a` is `b` or a proper ancestor of `b`.
    fn le(&self, a: &Self::Id, b: &Self::Id) -> bool;
}

/// A broken structural invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation<I: fmt::Debug> {
    #[error("id listed twice: {0:?}")]
    DuplicateId(I),

    #[error("id listed but not present: {0:?}")]
    UnknownNode(I),

    #[error("{0:?} is not <= itself")]
    NotReflexive(I),

    #[error("parent {parent:?} of {id:?} was not added before it")]
    ParentNotEarlier { id: I, parent: I },

    #[error("parent {parent:?} of {id:?} is not ordered before it")]
    ParentNotBefore { id: I, parent: I },

    #[error("parents of {id:?} are not an antichain: {ancestor:?} precedes {descendant:?}")]
    NotAntichain { id: I, ancestor: I, descendant: I },

    #[error("{id:?} is not ordered after {previous:?} by the same author")]
    ChainOrder { id: I, previous: I },

    #[error("{id:?} has stale parent {parent:?}, already seen before {previous:?}")]
    Stale { id: I, parent: I, previous: I },
}

/// Verify per-author order, antichain parents, full visibility and freshness
/// for every node, in insertion order.
pub fn check_invariants<O>(order: &O) -> Result<(), InvariantViolation<O::Id>>
where
    O: CausalOrder + ?Sized,
{
    let mut seen: HashSet<O::Id> = HashSet::new();
    let mut last_by_chain: HashMap<O::Chain, O::Id> = HashMap::new();

    for id in order.ids() {
        if !seen.insert(id.clone()) {
            return Err(InvariantViolation::DuplicateId(id));
        }
        let chain = order
            .chain_of(&id)
            .ok_or_else(|| InvariantViolation::UnknownNode(id.clone()))?;
        if !order.le(&id, &id) {
            return Err(InvariantViolation::NotReflexive(id));
        }

        let parents = order.parents_of(&id);
        for parent in &parents {
            if *parent == id || !seen.contains(parent) {
                return Err(InvariantViolation::ParentNotEarlier {
                    id: id.clone(),
                    parent: parent.clone(),
                });
            }
            if !order.le(parent, &id) || order.le(&id, parent) {
                return Err(InvariantViolation::ParentNotBefore {
                    id: id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        for (i, a) in parents.iter().enumerate() {
            for b in &parents[i + 1..] {
                let pair = if order.le(a, b) {
                    Some((a, b))
                } else if order.le(b, a) {
                    Some((b, a))
                } else {
                    None
                };
                if let Some((ancestor, descendant)) = pair {
                    return Err(InvariantViolation::NotAntichain {
                        id: id.clone(),
                        ancestor: ancestor.clone(),
                        descendant: descendant.clone(),
                    });
                }
            }
        }

        if let Some(previous) = last_by_chain.get(&chain) {
            if !order.le(previous, &id) {
                return Err(InvariantViolation::ChainOrder {
                    id: id.clone(),
                    previous: previous.clone(),
                });
            }
            if let Some(stale) = parents
                .iter()
                .find(|p| *p != previous && order.le(p, previous))
            {
                return Err(InvariantViolation::Stale {
                    id: id.clone(),
                    parent: stale.clone(),
                    previous: previous.clone(),
                });
            }
        }
        last_by_chain.insert(chain, id);
    }

    Ok(())
}
