//! Chain clocks for constant-depth reachability.
//!
//! A chain clock summarizes the causal history of a node by the highest
//! sequence number seen from each chain. This is exact (not an
//! approximation) as long as every chain is totally ordered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highest sequence number observed per chain.
///
/// Sequence numbers are 1-based; a chain that was never observed reads as 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "C: Serialize",
    deserialize = "C: Deserialize<'de> + Ord"
))]
pub struct ChainClock<C: Ord> {
    entries: BTreeMap<C, u64>,
}

impl<C: Ord + Clone> ChainClock<C> {
    /// Create an empty clock.
    pub fn new() -> Self {
        ChainClock {
            entries: BTreeMap::new(),
        }
    }

    /// Create a clock from entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (C, u64)>) -> Self {
        ChainClock {
            entries: entries.into_iter().filter(|(_, seq)| *seq > 0).collect(),
        }
    }

    /// Get the highest sequence seen from a chain.
    pub fn get(&self, chain: &C) -> u64 {
        self.entries.get(chain).copied().unwrap_or(0)
    }

    /// Record that `seq` of `chain` has been seen. Never moves backwards.
    pub fn observe(&mut self, chain: C, seq: u64) {
        if seq == 0 {
            return;
        }
        let entry = self.entries.entry(chain).or_insert(0);
        *entry = (*entry).max(seq);
    }

    /// Merge with another clock (component-wise max).
    pub fn merge(&mut self, other: &ChainClock<C>) {
        for (chain, &seq) in &other.entries {
            let current = self.entries.entry(chain.clone()).or_insert(0);
            *current = (*current).max(seq);
        }
    }

    /// Check if a specific `(chain, seq)` position is included.
    pub fn contains(&self, chain: &C, seq: u64) -> bool {
        self.get(chain) >= seq
    }

    /// Chains with at least one observed node.
    pub fn chains(&self) -> impl Iterator<Item = &C> {
        self.entries.keys()
    }

    /// Number of chains tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the clock is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Ord + Clone> Default for ChainClock<C> {
    fn default() -> Self {
        Self::new()
    }
}
