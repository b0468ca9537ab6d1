//! The causal graph: nodes, chains and reachability.
//!
//! Insertion is append-only. A node can only be inserted after all of its
//! parents, so the insertion order is always a topological order.

use crate::clock::ChainClock;
use crate::error::GraphError;
use crate::invariants::CausalOrder;
use crate::Key;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

#[derive(Clone, Debug)]
struct Node<I, C: Ord> {
    chain: C,
    /// 1-based position within the chain.
    seq: u64,
    /// Position in insertion order.
    position: usize,
    parents: Vec<I>,
    children: Vec<I>,
    clock: ChainClock<C>,
}

/// Append-only DAG with per-chain total order.
#[derive(Clone, Debug)]
pub struct CausalGraph<I, C: Ord> {
    /// All nodes indexed by id.
    nodes: HashMap<I, Node<I, C>>,

    /// Ids in insertion order.
    order: Vec<I>,

    /// Per-chain ids, oldest first.
    chains: HashMap<C, Vec<I>>,

    /// Current heads (nodes without children).
    heads: HashSet<I>,
}

impl<I: Key, C: Key> Default for CausalGraph<I, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Key, C: Key> CausalGraph<I, C> {
    /// Create a new empty graph.
    pub fn new() -> Self {
        CausalGraph {
            nodes: HashMap::new(),
            order: Vec::new(),
            chains: HashMap::new(),
            heads: HashSet::new(),
        }
    }

    /// Validate a candidate node without inserting it.
    ///
    /// Returns the sorted, deduplicated parent list and the clock the node
    /// would carry.
    fn validate(
        &self,
        id: &I,
        chain: &C,
        parents: Vec<I>,
    ) -> Result<(Vec<I>, ChainClock<C>), GraphError<I>> {
        if self.nodes.contains_key(id) {
            return Err(GraphError::Duplicate(id.clone()));
        }

        let mut parents = parents;
        parents.sort();
        parents.dedup();

        let missing: Vec<I> = parents
            .iter()
            .filter(|p| !self.nodes.contains_key(p))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(GraphError::MissingParents(missing));
        }

        let mut clock = ChainClock::new();
        for parent in &parents {
            clock.merge(&self.nodes[parent].clock);
        }

        if let Some(previous) = self.chain_last(chain) {
            let prev = &self.nodes[previous];
            if !clock.contains(chain, prev.seq) {
                return Err(GraphError::ChainOrder {
                    id: id.clone(),
                    previous: previous.clone(),
                });
            }
            // Nothing strictly before our own previous node may be named again.
            if let Some(stale) = parents
                .iter()
                .find(|p| *p != previous && self.le(p, previous))
            {
                return Err(GraphError::Stale {
                    id: id.clone(),
                    parent: stale.clone(),
                    previous: previous.clone(),
                });
            }
        }

        if let Some((ancestor, descendant)) = self.antichain_violation(&parents) {
            return Err(GraphError::NotAntichain {
                id: id.clone(),
                ancestor,
                descendant,
            });
        }

        let seq = self.chain(chain).len() as u64 + 1;
        clock.observe(chain.clone(), seq);
        Ok((parents, clock))
    }

    /// Insert a node.
    ///
    /// Checks run in this order, and the first failure is returned without
    /// modifying the graph: duplicate id, missing parents, chain order (the
    /// chain's previous node must be an ancestor), freshness (no parent may
    /// strictly precede the chain's previous node), antichain parents.
    pub fn insert(
        &mut self,
        id: I,
        chain: C,
        parents: impl IntoIterator<Item = I>,
    ) -> Result<(), GraphError<I>> {
        let (parents, clock) = self.validate(&id, &chain, parents.into_iter().collect())?;

        for parent in &parents {
            self.heads.remove(parent);
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.push(id.clone());
            }
        }
        self.heads.insert(id.clone());

        let seq = clock.get(&chain);
        let chain_ids = self.chains.entry(chain.clone()).or_default();
        chain_ids.push(id.clone());
        debug_assert_eq!(chain_ids.len() as u64, seq);

        let node = Node {
            chain,
            seq,
            position: self.order.len(),
            parents,
            children: Vec::new(),
            clock,
        };
        self.order.push(id.clone());
        self.nodes.insert(id, node);
        Ok(())
    }

    /// True iff `a` is `b` or a proper ancestor of `b`.
    pub fn le(&self, a: &I, b: &I) -> bool {
        match (self.nodes.get(a), self.nodes.get(b)) {
            (Some(na), Some(nb)) => nb.clock.contains(&na.chain, na.seq),
            _ => false,
        }
    }

    /// True iff `a` is a proper ancestor of `b`.
    pub fn lt(&self, a: &I, b: &I) -> bool {
        a != b && self.le(a, b)
    }

    /// True iff no element of `ids` is an ancestor of another.
    pub fn is_antichain<'a>(&self, ids: impl IntoIterator<Item = &'a I>) -> bool
    where
        I: 'a,
    {
        let ids: Vec<I> = ids.into_iter().cloned().collect();
        self.antichain_violation(&ids).is_none()
    }

    fn antichain_violation(&self, ids: &[I]) -> Option<(I, I)> {
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                if a == b {
                    continue;
                }
                if self.le(a, b) {
                    return Some((a.clone(), b.clone()));
                }
                if self.le(b, a) {
                    return Some((b.clone(), a.clone()));
                }
            }
        }
        None
    }

    /// Breadth-first walk over `from` and their ancestors.
    ///
    /// Each node is visited at most once. When `visit` returns `false` the
    /// walk does not continue into that node's parents.
    pub fn walk_ancestors<'a, F>(&self, from: impl IntoIterator<Item = &'a I>, mut visit: F)
    where
        I: 'a,
        F: FnMut(&I) -> bool,
    {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<I> = from.into_iter().cloned().collect();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            if visit(&current) {
                queue.extend(node.parents.iter().cloned());
            }
        }
    }

    /// All proper ancestors of a node.
    pub fn ancestors(&self, id: &I) -> HashSet<I> {
        self.closure(id, |node| &node.parents)
    }

    /// All proper descendants of a node.
    pub fn descendants(&self, id: &I) -> HashSet<I> {
        self.closure(id, |node| &node.children)
    }

    fn closure<F>(&self, id: &I, next: F) -> HashSet<I>
    where
        F: Fn(&Node<I, C>) -> &Vec<I>,
    {
        let mut result = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(node) = self.nodes.get(id) {
            queue.extend(next(node).iter().cloned());
        }

        while let Some(current) = queue.pop_front() {
            if result.insert(current.clone()) {
                if let Some(node) = self.nodes.get(&current) {
                    queue.extend(next(node).iter().cloned());
                }
            }
        }

        result
    }

    /// Chains present in the causal history of `frontier` (inclusive).
    pub fn chains_seen<'a>(
        &self,
        frontier: impl IntoIterator<Item = &'a I>,
    ) -> Result<BTreeSet<C>, GraphError<I>>
    where
        I: 'a,
    {
        let mut chains = BTreeSet::new();
        for id in frontier {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| GraphError::NotFound(id.clone()))?;
            chains.extend(node.clock.chains().cloned());
        }
        Ok(chains)
    }

    /// Check if a node exists.
    pub fn contains(&self, id: &I) -> bool {
        self.nodes.contains_key(id)
    }

    /// Direct parents of a node.
    pub fn parents(&self, id: &I) -> Option<&[I]> {
        self.nodes.get(id).map(|n| n.parents.as_slice())
    }

    /// Direct children of a node, in insertion order.
    pub fn children(&self, id: &I) -> Option<&[I]> {
        self.nodes.get(id).map(|n| n.children.as_slice())
    }

    /// Chain a node belongs to.
    pub fn chain_of(&self, id: &I) -> Option<&C> {
        self.nodes.get(id).map(|n| &n.chain)
    }

    /// All nodes of a chain, oldest first.
    pub fn chain(&self, chain: &C) -> &[I] {
        self.chains.get(chain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Latest node of a chain.
    pub fn chain_last(&self, chain: &C) -> Option<&I> {
        self.chains.get(chain).and_then(|ids| ids.last())
    }

    /// Position of a node in insertion order.
    pub fn position(&self, id: &I) -> Option<usize> {
        self.nodes.get(id).map(|n| n.position)
    }

    /// All ids in insertion order.
    pub fn ids(&self) -> &[I] {
        &self.order
    }

    /// Current heads (nodes without children), sorted.
    pub fn heads(&self) -> Vec<I> {
        let mut heads: Vec<_> = self.heads.iter().cloned().collect();
        heads.sort();
        heads
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<I: Key, C: Key> CausalOrder for CausalGraph<I, C> {
    type Id = I;
    type Chain = C;

    fn ids(&self) -> Vec<I> {
        self.order.clone()
    }

    fn chain_of(&self, id: &I) -> Option<C> {
        CausalGraph::chain_of(self, id).cloned()
    }

    fn parents_of(&self, id: &I) -> Vec<I> {
        self.parents(id).map(<[I]>::to_vec).unwrap_or_default()
    }

    fn le(&self, a: &I, b: &I) -> bool {
        CausalGraph::le(self, a, b)
    }
}
