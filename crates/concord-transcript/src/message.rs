//! Message values accepted by the transcript.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A decoded message, as far as ordering is concerned.
///
/// `recipients` are the members that received the message at the transport
/// layer; the author is never one of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "I: Serialize, U: Serialize",
    deserialize = "I: Deserialize<'de> + Ord, U: Deserialize<'de> + Ord"
))]
pub struct Message<I: Ord, U: Ord> {
    pub id: I,
    pub author: U,
    pub parents: BTreeSet<I>,
    pub recipients: BTreeSet<U>,
}

impl<I: Ord, U: Ord + Clone> Message<I, U> {
    pub fn new(
        id: I,
        author: U,
        parents: impl IntoIterator<Item = I>,
        recipients: impl IntoIterator<Item = U>,
    ) -> Self {
        Message {
            id,
            author,
            parents: parents.into_iter().collect(),
            recipients: recipients.into_iter().collect(),
        }
    }

    /// Whether `member` wrote or received this message.
    pub fn is_visible_to(&self, member: &U) -> bool {
        self.author == *member || self.recipients.contains(member)
    }
}
