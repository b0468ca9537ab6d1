//! Fault reporting for failed subscribers.

use crate::observable::SubscriptionId;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A subscriber callback returned an error while handling an item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriberFailure {
    /// Name of the observable that published the item.
    pub source: String,
    /// The subscription that failed.
    pub subscription: SubscriptionId,
    /// Debug rendering of the item.
    pub item: String,
    /// The subscriber's error message.
    pub error: String,
}

/// Handle returned by [`FaultChannel::on_failure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaultHandlerId(u64);

type FaultHandler = Arc<dyn Fn(&SubscriberFailure) + Send + Sync>;

/// Cloneable, thread-safe sink for subscriber failures.
///
/// Clones share the same handlers. Every failure is logged at `warn`
/// regardless of how many handlers are installed.
#[derive(Clone, Default)]
pub struct FaultChannel {
    handlers: Arc<RwLock<Vec<(FaultHandlerId, FaultHandler)>>>,
    next_id: Arc<AtomicU64>,
}

impl FaultChannel {
    /// Create a channel with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handler called for every reported failure.
    pub fn on_failure<F>(&self, handler: F) -> FaultHandlerId
    where
        F: Fn(&SubscriberFailure) + Send + Sync + 'static,
    {
        let id = FaultHandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns whether it was installed.
    pub fn remove(&self, id: FaultHandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(hid, _)| *hid != id);
        handlers.len() != before
    }

    /// Report a failure to every handler.
    pub fn report(&self, failure: SubscriberFailure) {
        tracing::warn!(
            source = %failure.source,
            subscription = ?failure.subscription,
            item = %failure.item,
            error = %failure.error,
            "subscriber failed"
        );
        // Handlers may install or remove handlers themselves.
        let handlers: Vec<FaultHandler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(&failure);
        }
    }

    /// Number of installed handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl fmt::Debug for FaultChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultChannel")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
