//! # concord-transcript
//!
//! Causal transcript for a multi-party conversation.
//!
//! Every message names its author, the latest messages its author had seen
//! (its parents) and the members it was sent to. The transcript accepts a
//! message only if it extends the history consistently, and tracks which
//! recipients have acknowledged each message by replying after it.
//!
//! - [`Transcript`]: validation, causal queries and acknowledgment tracking
//! - [`MessageLog`]: a transcript that publishes [`TranscriptEvent`]s
//!
//! ## Example
//!
//! ```rust
//! use concord_transcript::{Message, Transcript};
//!
//! let mut transcript: Transcript<u32, &str> = Transcript::new();
//! transcript.add(Message::new(0, "alice", [], ["bob", "carol"])).unwrap();
//! transcript.add(Message::new(1, "bob", [0], ["alice", "carol"])).unwrap();
//!
//! // Bob has replied to message 0; Carol has not.
//! assert_eq!(transcript.unackby(&0).unwrap().len(), 1);
//!
//! let acked = transcript.add(Message::new(2, "carol", [1], ["alice", "bob"])).unwrap();
//! assert_eq!(acked, vec![0]);
//! assert_eq!(transcript.unacked(), vec![1, 2]);
//! ```

mod error;
mod log;
mod message;
mod transcript;

pub use error::{TranscriptError, TranscriptViolation};
pub use log::{MessageLog, TranscriptEvent};
pub use message::Message;
pub use transcript::{Transcript, TranscriptConfig};

pub use concord_graph::{CausalOrder, GraphError, Key};
