//! Errors raised while inserting into the graph.

use std::fmt;
use thiserror::Error;

/// Reasons a node is refused by [`CausalGraph::insert`](crate::CausalGraph::insert).
///
/// These describe malformed input from the network. The graph is left
/// untouched whenever one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError<I: fmt::Debug> {
    #[error("duplicate node: {0:?}")]
    Duplicate(I),

    #[error("missing parents: {0:?}")]
    MissingParents(Vec<I>),

    #[error("parents of {id:?} are not an antichain: {ancestor:?} precedes {descendant:?}")]
    NotAntichain { id: I, ancestor: I, descendant: I },

    #[error("{id:?} does not follow the previous node {previous:?} of its chain")]
    ChainOrder { id: I, previous: I },

    #[error("{id:?} has stale parent {parent:?}, already seen before {previous:?}")]
    Stale { id: I, parent: I, previous: I },

    #[error("node not found: {0:?}")]
    NotFound(I),
}
