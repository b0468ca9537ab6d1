//! Error types for the transcript.

use concord_graph::{GraphError, InvariantViolation};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Why a message was refused.
///
/// All of these come from the wire (a buggy or hostile peer), never from
/// local misuse. The transcript is unchanged whenever one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError<I: fmt::Debug, U: fmt::Debug> {
    #[error("{0}")]
    Graph(GraphError<I>),

    #[error("author {author:?} of {id:?} is listed as a recipient")]
    AuthorIsRecipient { id: I, author: U },

    #[error("parent {parent:?} of {id:?} was never sent to its author {author:?}")]
    NotVisible { id: I, parent: I, author: U },
}

impl<I: fmt::Debug, U: fmt::Debug> From<GraphError<I>> for TranscriptError<I, U> {
    fn from(err: GraphError<I>) -> Self {
        TranscriptError::Graph(err)
    }
}

/// A broken transcript invariant, found by
/// [`Transcript::check_invariants`](crate::Transcript::check_invariants).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptViolation<I: fmt::Debug, U: fmt::Debug> {
    #[error("{0}")]
    Structure(InvariantViolation<I>),

    #[error("unackby({id:?}) contains {member:?}, who is not a recipient")]
    NotARecipient { id: I, member: U },

    #[error("{member:?} has a successor of {id:?} but is still waiting in unackby, or the reverse")]
    AckMismatch { id: I, member: U },

    #[error("suc_ruId({id:?}, {member:?}) = {successor:?} is not a later message by that member")]
    BadSuccessor { id: I, member: U, successor: I },

    #[error("unacked() is {actual:?}, expected {expected:?}")]
    Unacked { expected: Vec<I>, actual: Vec<I> },

    #[error("allAuthors() is {actual:?}, expected {expected:?}")]
    Authors {
        expected: BTreeSet<U>,
        actual: BTreeSet<U>,
    },
}

impl<I: fmt::Debug, U: fmt::Debug> From<InvariantViolation<I>> for TranscriptViolation<I, U> {
    fn from(err: InvariantViolation<I>) -> Self {
        TranscriptViolation::Structure(err)
    }
}
