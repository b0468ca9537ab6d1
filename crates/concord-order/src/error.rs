//! Rejection reasons for membership packets.

use crate::hash::ChainHash;
use crate::packet::PacketId;
use thiserror::Error;

/// Why a packet was not accepted into the server order.
///
/// These are ordinary outcomes of late, duplicated or hostile network
/// input. The chain is unchanged whenever one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("packet {packet:?} was not echoed to {missing} of its members")]
    NotEchoed { packet: PacketId, missing: usize },

    #[error("packet {packet:?} arrived before the server order was synced")]
    NotSynced { packet: PacketId },

    #[error("packet {packet:?} does not include us")]
    NotForUs { packet: PacketId },

    #[error("packet {packet:?} extends {prev_pf:?}, which an earlier proposal already claimed")]
    CompetingGenesis { packet: PacketId, prev_pf: PacketId },

    #[error("duplicate packet {packet:?}")]
    DuplicatePacket { packet: PacketId },

    #[error("initial packet {packet:?} while operation {pending:?} is pending")]
    OperationPending { packet: PacketId, pending: PacketId },

    #[error("initial packet {packet:?} extends {prev_pf:?}, not the last final packet {expected:?}")]
    StaleInitial {
        packet: PacketId,
        prev_pf: PacketId,
        expected: PacketId,
    },

    #[error("final packet {packet:?} with no pending operation")]
    NoPendingOperation { packet: PacketId },

    #[error("final packet {packet:?} completes {prev_pi:?}, not the pending operation {expected:?}")]
    StaleFinal {
        packet: PacketId,
        prev_pi: Option<PacketId>,
        expected: PacketId,
    },

    #[error("unknown packet {packet:?}")]
    UnknownPacket { packet: PacketId },

    #[error("chain hash at {packet:?} is {ours:?}, but {claimed:?} was claimed")]
    ChainHashMismatch {
        packet: PacketId,
        ours: ChainHash,
        claimed: ChainHash,
    },
}

impl Rejection {
    /// The packet the rejection is about.
    pub fn packet(&self) -> &PacketId {
        match self {
            Rejection::NotEchoed { packet, .. }
            | Rejection::NotSynced { packet }
            | Rejection::NotForUs { packet }
            | Rejection::CompetingGenesis { packet, .. }
            | Rejection::DuplicatePacket { packet }
            | Rejection::OperationPending { packet, .. }
            | Rejection::StaleInitial { packet, .. }
            | Rejection::NoPendingOperation { packet }
            | Rejection::StaleFinal { packet, .. }
            | Rejection::UnknownPacket { packet }
            | Rejection::ChainHashMismatch { packet, .. } => packet,
        }
    }
}
