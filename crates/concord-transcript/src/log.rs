//! A transcript that announces what happens to it.

use crate::error::TranscriptError;
use crate::message::Message;
use crate::transcript::Transcript;
use concord_events::{FaultChannel, Observable, SubscriberError, SubscriptionId};
use concord_graph::Key;

/// Something that happened to a [`MessageLog`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranscriptEvent<I, U> {
    /// A message was accepted.
    Added { id: I, author: U },
    /// Every recipient has now acknowledged this message.
    FullyAcked { id: I },
    /// A message was refused; the transcript is unchanged.
    Rejected { id: I, reason: String },
}

/// Wraps a [`Transcript`] and publishes a [`TranscriptEvent`] for every
/// accepted, acknowledged or refused message.
///
/// For each accepted message, `Added` is published first, then one
/// `FullyAcked` per newly acknowledged message in insertion order.
#[derive(Debug)]
pub struct MessageLog<I: Key, U: Key> {
    transcript: Transcript<I, U>,
    events: Observable<TranscriptEvent<I, U>>,
}

impl<I: Key, U: Key> MessageLog<I, U> {
    pub fn new(transcript: Transcript<I, U>, faults: FaultChannel) -> Self {
        MessageLog {
            transcript,
            events: Observable::new("transcript", faults),
        }
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&TranscriptEvent<I, U>) -> Result<(), SubscriberError> + Send + 'static,
    {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Add a message to the transcript and announce the outcome.
    pub fn add(&mut self, msg: Message<I, U>) -> Result<Vec<I>, TranscriptError<I, U>> {
        let id = msg.id.clone();
        let author = msg.author.clone();
        match self.transcript.add(msg) {
            Ok(acked) => {
                self.publish(TranscriptEvent::Added { id, author });
                for acked_id in &acked {
                    self.publish(TranscriptEvent::FullyAcked {
                        id: acked_id.clone(),
                    });
                }
                Ok(acked)
            }
            Err(err) => {
                self.publish(TranscriptEvent::Rejected {
                    id,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn publish(&mut self, event: TranscriptEvent<I, U>) {
        if let Err(err) = self.events.publish(&event) {
            tracing::debug!(error = %err, "transcript event not delivered");
        }
    }

    pub fn transcript(&self) -> &Transcript<I, U> {
        &self.transcript
    }

    pub fn into_inner(self) -> Transcript<I, U> {
        self.transcript
    }
}
