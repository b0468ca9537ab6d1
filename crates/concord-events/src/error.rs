//! Error types for event delivery.

use thiserror::Error;

/// Errors returned to a publisher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("published to {source_name} with no subscriber: {item}")]
    NoSubscribers { source_name: String, item: String },
}

/// Failure reported by a subscriber callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SubscriberError(pub String);

impl From<String> for SubscriberError {
    fn from(msg: String) -> Self {
        SubscriberError(msg)
    }
}

impl From<&str> for SubscriberError {
    fn from(msg: &str) -> Self {
        SubscriberError(msg.to_string())
    }
}
