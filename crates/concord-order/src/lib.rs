//! # concord-order
//!
//! Total order on membership operations for a group conversation.
//!
//! Members propose membership changes concurrently; the relay delivers the
//! proposals in some order, and the first one that extends the current
//! chain tip wins. Every accepted packet is bound into a SHA-256 hash
//! chain, so members that were shown different orders can find out by
//! comparing hashes.
//!
//! - [`ServerOrder`]: the accept/reject state machine
//! - [`OperationSummary`] / [`GreetingSummary`]: what ordering needs to
//!   know about a packet
//! - [`ChainHash`]: rolling chain hashes
//!
//! ## Example
//!
//! ```rust
//! use concord_order::{GreetingMetadata, GreetingSummary, PacketId, ServerOrder};
//! use std::collections::BTreeSet;
//!
//! let mut order: ServerOrder<&str> = ServerOrder::new();
//! order.sync_new();
//!
//! let metadata = GreetingMetadata {
//!     prev_pf: order.prev_pf().unwrap().clone(),
//!     prev_ch: *order.prev_ch().unwrap(),
//! };
//! let members: BTreeSet<&str> = ["alice", "bob"].into_iter().collect();
//! let pi = GreetingSummary::initial(PacketId::from("pi"), metadata, members.clone(), 1);
//! order.try_op_packet(&"alice", &pi, &members, |_, _| {}, |_, _| {}).unwrap();
//! assert!(order.has_ongoing_op());
//!
//! let pf = GreetingSummary::final_packet(PacketId::from("pf"), PacketId::from("pi"), members.clone(), 2);
//! order.try_op_packet(&"alice", &pf, &members, |_, _| {}, |_, _| {}).unwrap();
//! assert!(!order.has_ongoing_op());
//! assert_eq!(order.chain_hashes().len(), 3);
//! ```

mod error;
mod hash;
mod packet;
mod server_order;

pub use error::Rejection;
pub use hash::ChainHash;
pub use packet::{GreetingMetadata, GreetingSummary, OperationSummary, PacketId};
pub use server_order::{ServerOrder, ServerOrderConfig, GENESIS_PACKET_TYPE};
