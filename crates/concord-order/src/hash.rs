//! Rolling chain hashes over accepted packets.
//!
//! Each hash commits to the previous hash, the packet id and the packet
//! type, so two members that accepted the same packets in the same order
//! hold the same hash, and any divergence stays visible from then on.

use crate::packet::PacketId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 chain hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ChainHash([u8; 32]);

impl ChainHash {
    /// Create a hash from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        ChainHash(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash of the first packet of a brand-new chain (empty previous hash).
    pub fn genesis(packet: &PacketId, packet_type: u8) -> Self {
        link(&[], packet, packet_type)
    }

    /// Hash of the chain after accepting `packet` on top of this one.
    pub fn next(&self, packet: &PacketId, packet_type: u8) -> Self {
        link(&self.0, packet, packet_type)
    }

    /// Convert to hex string for display.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Truncated display (first 8 chars).
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainHash({}...)", self.short())
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// `SHA256(prev ‖ packet ‖ [packet_type])`.
fn link(prev: &[u8], packet: &PacketId, packet_type: u8) -> ChainHash {
    let mut hasher = Sha256::new();
    hasher.update(prev);
    hasher.update(packet.as_bytes());
    hasher.update([packet_type]);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    ChainHash(bytes)
}
