//! Packet ids and operation summaries.

use crate::hash::ChainHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque packet identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PacketId(Vec<u8>);

impl PacketId {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        PacketId(bytes.into())
    }

    /// A fresh random 32-byte id, used to seed a new chain.
    pub fn random() -> Self {
        PacketId(rand::random::<[u8; 32]>().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl From<&str> for PacketId {
    fn from(s: &str) -> Self {
        PacketId(s.as_bytes().to_vec())
    }
}

impl fmt::Debug for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        if hex.len() > 16 {
            write!(f, "PacketId({}...)", &hex[..16])
        } else {
            write!(f, "PacketId({})", hex)
        }
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// What an initial packet claims to extend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingMetadata {
    /// Final packet of the operation this one follows.
    pub prev_pf: PacketId,
    /// Chain hash at that final packet.
    pub prev_ch: ChainHash,
}

/// The parts of a membership-operation packet that ordering depends on.
pub trait OperationSummary<U> {
    fn packet_id(&self) -> &PacketId;

    /// Proposes an operation; carries [`metadata`](Self::metadata).
    fn is_initial(&self) -> bool;

    /// Completes the pending operation named by [`prev_pi`](Self::prev_pi).
    fn is_final(&self) -> bool;

    fn packet_type(&self) -> u8;

    /// Target membership of the operation.
    fn members(&self) -> &BTreeSet<U>;

    /// Initial packet this one completes. A packet that is both initial and
    /// final names itself.
    fn prev_pi(&self) -> Option<&PacketId>;

    fn metadata(&self) -> Option<&GreetingMetadata>;
}

/// Summary of a greeting packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "U: Serialize",
    deserialize = "U: Deserialize<'de> + Ord"
))]
pub struct GreetingSummary<U: Ord> {
    pub p_id: PacketId,
    pub members: BTreeSet<U>,
    pub metadata: Option<GreetingMetadata>,
    pub prev_pi: Option<PacketId>,
    pub packet_type: u8,
}

impl<U: Ord> GreetingSummary<U> {
    /// An initial packet proposing `members`.
    pub fn initial(
        p_id: PacketId,
        metadata: GreetingMetadata,
        members: impl IntoIterator<Item = U>,
        packet_type: u8,
    ) -> Self {
        GreetingSummary {
            p_id,
            members: members.into_iter().collect(),
            metadata: Some(metadata),
            prev_pi: None,
            packet_type,
        }
    }

    /// A final packet completing the operation started by `prev_pi`.
    pub fn final_packet(
        p_id: PacketId,
        prev_pi: PacketId,
        members: impl IntoIterator<Item = U>,
        packet_type: u8,
    ) -> Self {
        GreetingSummary {
            p_id,
            members: members.into_iter().collect(),
            metadata: None,
            prev_pi: Some(prev_pi),
            packet_type,
        }
    }

    /// An operation that starts and completes in a single packet.
    pub fn solo(
        p_id: PacketId,
        metadata: GreetingMetadata,
        members: impl IntoIterator<Item = U>,
        packet_type: u8,
    ) -> Self {
        GreetingSummary {
            prev_pi: Some(p_id.clone()),
            p_id,
            members: members.into_iter().collect(),
            metadata: Some(metadata),
            packet_type,
        }
    }
}

impl<U: Ord> OperationSummary<U> for GreetingSummary<U> {
    fn packet_id(&self) -> &PacketId {
        &self.p_id
    }

    fn is_initial(&self) -> bool {
        self.metadata.is_some()
    }

    fn is_final(&self) -> bool {
        self.prev_pi.is_some()
    }

    fn packet_type(&self) -> u8 {
        self.packet_type
    }

    fn members(&self) -> &BTreeSet<U> {
        &self.members
    }

    fn prev_pi(&self) -> Option<&PacketId> {
        self.prev_pi.as_ref()
    }

    fn metadata(&self) -> Option<&GreetingMetadata> {
        self.metadata.as_ref()
    }
}
