//! The causal transcript: messages, their order, and who still owes an
//! acknowledgment for each one.

use crate::error::{TranscriptError, TranscriptViolation};
use crate::message::Message;
use concord_graph::{CausalGraph, CausalOrder, GraphError, InvariantViolation, Key};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Transcript behaviour switches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Run the full invariant check after every accepted message and panic
    /// on a breach. Quadratic; for tests and debugging builds.
    pub verify_invariants: bool,
}

/// A causally ordered, append-only message history.
///
/// A recipient `r` acknowledges message `m` with its first message `n` such
/// that a parent path from `n` reaches `m` through messages that were all
/// sent to `r`. That message is `suc_ruid(m, r)`. Once every recipient has
/// acknowledged `m`, `m` is fully acknowledged and leaves [`unacked`].
///
/// [`unacked`]: Transcript::unacked
#[derive(Debug)]
pub struct Transcript<I: Ord, U: Ord> {
    graph: CausalGraph<I, U>,
    messages: HashMap<I, Message<I, U>>,
    /// Recipients that have not yet acknowledged each message.
    unackby: HashMap<I, BTreeSet<U>>,
    /// First acknowledging message, per message and recipient.
    successors: HashMap<I, HashMap<U, I>>,
    /// Messages with outstanding acknowledgments, keyed by insertion position.
    unacked: BTreeMap<usize, I>,
    authors: BTreeSet<U>,
    config: TranscriptConfig,
}

impl<I: Key, U: Key> Default for Transcript<I, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Key, U: Key> Transcript<I, U> {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::with_config(TranscriptConfig::default())
    }

    pub fn with_config(config: TranscriptConfig) -> Self {
        Transcript {
            graph: CausalGraph::new(),
            messages: HashMap::new(),
            unackby: HashMap::new(),
            successors: HashMap::new(),
            unacked: BTreeMap::new(),
            authors: BTreeSet::new(),
            config,
        }
    }

    /// Accept a message.
    ///
    /// Checks, in order: the author is not a recipient, every parent is
    /// present, every parent was visible to the author, then the graph
    /// checks (duplicate id, chain order, freshness, antichain). Nothing
    /// changes unless every check passes.
    ///
    /// Returns the messages that became fully acknowledged, in insertion
    /// order.
    pub fn add(&mut self, msg: Message<I, U>) -> Result<Vec<I>, TranscriptError<I, U>> {
        if let Err(err) = self.validate(&msg) {
            tracing::info!(id = ?msg.id, author = ?msg.author, error = %err, "rejected message");
            return Err(err);
        }

        let position = self.graph.len();
        if let Err(err) =
            self.graph
                .insert(msg.id.clone(), msg.author.clone(), msg.parents.iter().cloned())
        {
            tracing::info!(id = ?msg.id, author = ?msg.author, error = %err, "rejected message");
            return Err(err.into());
        }

        let id = msg.id.clone();
        let author = msg.author.clone();
        self.authors.insert(author.clone());
        if !msg.recipients.is_empty() {
            self.unacked.insert(position, id.clone());
        }
        self.unackby.insert(id.clone(), msg.recipients.clone());
        let acked = self.acknowledge(&id, &author, &msg.parents);
        self.messages.insert(id.clone(), msg);

        tracing::debug!(id = ?id, author = ?author, acked = acked.len(), "added message");

        if self.config.verify_invariants {
            if let Err(violation) = self.check_invariants() {
                panic!("transcript invariant broken after adding {:?}: {}", id, violation);
            }
        }
        Ok(acked)
    }

    fn validate(&self, msg: &Message<I, U>) -> Result<(), TranscriptError<I, U>> {
        if msg.recipients.contains(&msg.author) {
            return Err(TranscriptError::AuthorIsRecipient {
                id: msg.id.clone(),
                author: msg.author.clone(),
            });
        }
        if self.messages.contains_key(&msg.id) {
            return Err(GraphError::Duplicate(msg.id.clone()).into());
        }

        let missing: Vec<I> = msg
            .parents
            .iter()
            .filter(|p| !self.messages.contains_key(*p))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(GraphError::MissingParents(missing).into());
        }

        for parent in &msg.parents {
            let visible = self
                .messages
                .get(parent)
                .map_or(false, |p| p.is_visible_to(&msg.author));
            if !visible {
                return Err(TranscriptError::NotVisible {
                    id: msg.id.clone(),
                    parent: parent.clone(),
                    author: msg.author.clone(),
                });
            }
        }
        Ok(())
    }

    /// Record `id` by `author` as acknowledging everything it newly reaches.
    ///
    /// The walk stops at the author's own messages, at messages not sent to
    /// the author, and at messages the author had already acknowledged:
    /// everything behind those is either not acknowledgeable through this
    /// path or was acknowledged earlier.
    fn acknowledge(&mut self, id: &I, author: &U, parents: &BTreeSet<I>) -> Vec<I> {
        let graph = &self.graph;
        let messages = &self.messages;
        let unackby = &mut self.unackby;
        let successors = &mut self.successors;
        let unacked = &mut self.unacked;
        let mut fully_acked = Vec::new();

        graph.walk_ancestors(parents, |x| {
            let Some(msg) = messages.get(x) else {
                return false;
            };
            if msg.author == *author || !msg.recipients.contains(author) {
                return false;
            }
            let succ = successors.entry(x.clone()).or_default();
            if succ.contains_key(author) {
                return false;
            }
            succ.insert(author.clone(), id.clone());

            if let Some(pending) = unackby.get_mut(x) {
                pending.remove(author);
                if pending.is_empty() {
                    if let Some(pos) = graph.position(x) {
                        unacked.remove(&pos);
                    }
                    fully_acked.push(x.clone());
                }
            }
            true
        });

        fully_acked.sort_by_key(|x| graph.position(x));
        fully_acked
    }

    /// Recipients of `id` that have not acknowledged it yet.
    pub fn unackby(&self, id: &I) -> Option<&BTreeSet<U>> {
        self.unackby.get(id)
    }

    /// Messages not yet fully acknowledged, in insertion order.
    pub fn unacked(&self) -> Vec<I> {
        self.unacked.values().cloned().collect()
    }

    /// The message by which `member` first acknowledged `id`.
    pub fn suc_ruid(&self, id: &I, member: &U) -> Option<&I> {
        self.successors.get(id).and_then(|s| s.get(member))
    }

    /// Every member that has authored a message.
    pub fn all_authors(&self) -> &BTreeSet<U> {
        &self.authors
    }

    /// Authors present anywhere in the causal history of `frontier`.
    pub fn merge_members<'a>(
        &self,
        frontier: impl IntoIterator<Item = &'a I>,
    ) -> Result<BTreeSet<U>, TranscriptError<I, U>>
    where
        I: 'a,
    {
        Ok(self.graph.chains_seen(frontier)?)
    }

    /// True iff `a` is `b` or happened before it.
    pub fn le(&self, a: &I, b: &I) -> bool {
        self.graph.le(a, b)
    }

    pub fn get(&self, id: &I) -> Option<&Message<I, U>> {
        self.messages.get(id)
    }

    pub fn contains(&self, id: &I) -> bool {
        self.messages.contains_key(id)
    }

    /// Message ids in insertion order.
    pub fn ids(&self) -> &[I] {
        self.graph.ids()
    }

    /// Latest message by `author`.
    pub fn last_by(&self, author: &U) -> Option<&I> {
        self.graph.chain_last(author)
    }

    /// Messages nothing has replied to yet, sorted.
    pub fn heads(&self) -> Vec<I> {
        self.graph.heads()
    }

    /// The underlying partial-order index.
    pub fn graph(&self) -> &CausalGraph<I, U> {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Audit the whole transcript.
    ///
    /// Checks the causal structure, then acknowledgment bookkeeping: every
    /// pending member is a recipient, a recipient is pending exactly when
    /// it has no successor, every successor is a later message by that
    /// recipient, and `unacked`/`all_authors` agree with the messages.
    pub fn check_invariants(&self) -> Result<(), TranscriptViolation<I, U>> {
        concord_graph::check_invariants(self)?;

        let mut expected_unacked = Vec::new();
        let mut expected_authors = BTreeSet::new();
        for id in self.graph.ids() {
            let Some(msg) = self.messages.get(id) else {
                return Err(InvariantViolation::UnknownNode(id.clone()).into());
            };
            expected_authors.insert(msg.author.clone());

            let pending = self.unackby.get(id).cloned().unwrap_or_default();
            if let Some(member) = pending.iter().find(|m| !msg.recipients.contains(*m)) {
                return Err(TranscriptViolation::NotARecipient {
                    id: id.clone(),
                    member: member.clone(),
                });
            }
            for member in &msg.recipients {
                let successor = self.suc_ruid(id, member);
                if pending.contains(member) == successor.is_some() {
                    return Err(TranscriptViolation::AckMismatch {
                        id: id.clone(),
                        member: member.clone(),
                    });
                }
                if let Some(successor) = successor {
                    let by_member = self.graph.chain_of(successor) == Some(member);
                    if !by_member || !self.graph.lt(id, successor) {
                        return Err(TranscriptViolation::BadSuccessor {
                            id: id.clone(),
                            member: member.clone(),
                            successor: successor.clone(),
                        });
                    }
                }
            }
            if !pending.is_empty() {
                expected_unacked.push(id.clone());
            }
        }

        let actual = self.unacked();
        if actual != expected_unacked {
            return Err(TranscriptViolation::Unacked {
                expected: expected_unacked,
                actual,
            });
        }
        if self.authors != expected_authors {
            return Err(TranscriptViolation::Authors {
                expected: expected_authors,
                actual: self.authors.clone(),
            });
        }
        Ok(())
    }
}

impl<I: Key, U: Key> CausalOrder for Transcript<I, U> {
    type Id = I;
    type Chain = U;

    fn ids(&self) -> Vec<I> {
        self.graph.ids().to_vec()
    }

    fn chain_of(&self, id: &I) -> Option<U> {
        self.messages.get(id).map(|m| m.author.clone())
    }

    fn parents_of(&self, id: &I) -> Vec<I> {
        self.messages
            .get(id)
            .map(|m| m.parents.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn le(&self, a: &I, b: &I) -> bool {
        self.graph.le(a, b)
    }
}
