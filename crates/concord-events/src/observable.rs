//! Observable: synchronous fan-out to subscribers.

use crate::error::{EventError, SubscriberError};
use crate::fault::{FaultChannel, SubscriberFailure};
use std::collections::BTreeMap;
use std::fmt;

/// Identifies one subscription on one observable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        SubscriptionId(raw)
    }
}

type Callback<T> = Box<dyn FnMut(&T) -> Result<(), SubscriberError> + Send>;

struct Subscriber<T> {
    callback: Callback<T>,
    once: bool,
}

/// A named source of items of type `T`.
pub struct Observable<T> {
    name: String,
    subscribers: BTreeMap<SubscriptionId, Subscriber<T>>,
    next_id: u64,
    require_subscribers: bool,
    faults: FaultChannel,
}

impl<T: fmt::Debug> Observable<T> {
    /// Create an observable reporting subscriber failures to `faults`.
    pub fn new(name: impl Into<String>, faults: FaultChannel) -> Self {
        Observable {
            name: name.into(),
            subscribers: BTreeMap::new(),
            next_id: 0,
            require_subscribers: false,
            faults,
        }
    }

    /// Make [`publish`](Self::publish) fail when nobody is subscribed.
    pub fn requiring_subscribers(mut self) -> Self {
        self.require_subscribers = true;
        self
    }

    /// Name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn add(&mut self, callback: Callback<T>, once: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.insert(id, Subscriber { callback, once });
        id
    }

    /// Subscribe to every future item.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&T) -> Result<(), SubscriberError> + Send + 'static,
    {
        self.add(Box::new(callback), false)
    }

    /// Subscribe to the next item only.
    pub fn subscribe_once<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&T) -> Result<(), SubscriberError> + Send + 'static,
    {
        self.add(Box::new(callback), true)
    }

    /// Cancel a subscription. Returns whether it was active.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Deliver `item` to every subscriber, in subscription order.
    ///
    /// Returns the number of subscribers that handled it without error.
    /// Failed subscribers stay subscribed (unless they were one-shot).
    pub fn publish(&mut self, item: &T) -> Result<usize, EventError> {
        if self.require_subscribers && self.subscribers.is_empty() {
            return Err(EventError::NoSubscribers {
                source_name: self.name.clone(),
                item: format!("{:?}", item),
            });
        }

        let mut delivered = 0;
        let mut finished = Vec::new();
        for (id, sub) in self.subscribers.iter_mut() {
            if sub.once {
                finished.push(*id);
            }
            match (sub.callback)(item) {
                Ok(()) => delivered += 1,
                Err(err) => self.faults.report(SubscriberFailure {
                    source: self.name.clone(),
                    subscription: *id,
                    item: format!("{:?}", item),
                    error: err.to_string(),
                }),
            }
        }
        for id in finished {
            self.subscribers.remove(&id);
        }
        Ok(delivered)
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Check if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.len())
            .field("require_subscribers", &self.require_subscribers)
            .finish()
    }
}
