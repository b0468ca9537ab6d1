//! # concord-graph
//!
//! Partial-order index for the causal transcript of a group conversation.
//!
//! This crate provides:
//! - A DAG over opaque node ids with parent and child links
//! - Per-chain total order (one chain per message author)
//! - Constant-depth reachability queries via chain clocks
//! - Worklist traversal of ancestors and descendants, without recursion
//! - A diagnostic invariant checker for transcript-like structures
//!
//! ## Reachability
//!
//! Every node belongs to exactly one chain, and nodes of the same chain are
//! totally ordered. Each node stores a [`ChainClock`]: the highest sequence
//! number it has seen from every chain in its causal history. Because chains
//! are totally ordered, `a <= b` holds exactly when `b`'s clock has seen
//! `a`'s position in `a`'s chain, so `le` never walks the graph.
//!
//! ## Example
//!
//! ```rust
//! use concord_graph::CausalGraph;
//!
//! let mut graph: CausalGraph<u32, &str> = CausalGraph::new();
//! graph.insert(0, "alice", []).unwrap();
//! graph.insert(1, "bob", [0]).unwrap();
//! graph.insert(2, "alice", [1]).unwrap();
//!
//! assert!(graph.le(&0, &2));
//! assert!(!graph.le(&2, &1));
//! assert_eq!(graph.heads(), vec![2]);
//! ```

mod clock;
mod error;
mod graph;
mod invariants;

pub use clock::ChainClock;
pub use error::GraphError;
pub use graph::CausalGraph;
pub use invariants::{check_invariants, CausalOrder, InvariantViolation};

use std::fmt;
use std::hash::Hash;

/// Bounds shared by node ids and chain keys.
///
/// Ids are opaque: they only need to be comparable, hashable and printable.
/// Nothing assumes they are monotonic.
pub trait Key: Clone + Eq + Hash + Ord + fmt::Debug {}

impl<T> Key for T where T: Clone + Eq + Hash + Ord + fmt::Debug {}
