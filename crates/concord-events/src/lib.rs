//! # concord-events
//!
//! Synchronous publish/subscribe used to carry notifications out of the
//! ordering engines.
//!
//! - [`Observable`] delivers items to subscribers in subscription order.
//! - A subscriber that fails never disturbs the publisher or the other
//!   subscribers; the failure goes to the [`FaultChannel`] the observable was
//!   built with.
//! - There is no process-wide channel. An application that wants one creates
//!   a single [`FaultChannel`] and clones it into every observable.
//!
//! ## Example
//!
//! ```rust
//! use concord_events::{FaultChannel, Observable};
//!
//! let faults = FaultChannel::new();
//! let mut added: Observable<u32> = Observable::new("added", faults.clone());
//!
//! added.subscribe(|id| {
//!     if *id == 0 {
//!         return Err("zero is not a message".into());
//!     }
//!     Ok(())
//! });
//!
//! assert_eq!(added.publish(&7).unwrap(), 1);
//! assert_eq!(added.publish(&0).unwrap(), 0);
//! ```

mod error;
mod fault;
mod observable;

pub use error::{EventError, SubscriberError};
pub use fault::{FaultChannel, FaultHandlerId, SubscriberFailure};
pub use observable::{Observable, SubscriptionId};
