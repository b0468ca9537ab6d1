//! Total order on membership operations, using the relay to break ties.
//!
//! Every operation is a pair of packets: an initial packet proposing a
//! membership change on top of the last completed operation, and a final
//! packet completing it. At most one operation is pending at a time, and
//! whichever proposal the relay delivers first wins. Every accepted packet
//! extends a hash chain that members compare to detect a relay showing
//! them different histories.

use crate::error::Rejection;
use crate::hash::ChainHash;
use crate::packet::{GreetingMetadata, OperationSummary, PacketId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Packet type hashed into the genesis link of a chain made by `sync_new`.
pub const GENESIS_PACKET_TYPE: u8 = 0xFF;

/// Server order settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOrderConfig {
    pub genesis_packet_type: u8,
}

impl Default for ServerOrderConfig {
    fn default() -> Self {
        Self {
            genesis_packet_type: GENESIS_PACKET_TYPE,
        }
    }
}

/// Accepted history since the synced baseline.
///
/// `packet_id`, `chain_hash` and `chain_unacked` have one entry per packet.
/// `op_initial`, `op_metadata` and `op_metadata_authenticated` have one
/// entry per operation and are one longer than `op_final` while an
/// operation is pending. Index 0 of every sequence is the baseline.
#[derive(Clone, Debug)]
struct Chain<U> {
    packet_id: Vec<PacketId>,
    chain_hash: Vec<ChainHash>,
    chain_unacked: Vec<BTreeSet<U>>,
    op_initial: Vec<Option<PacketId>>,
    op_metadata: Vec<Option<GreetingMetadata>>,
    op_metadata_authenticated: Vec<bool>,
    op_final: Vec<PacketId>,
    accepted: HashSet<PacketId>,
}

impl<U: Clone + Ord> Chain<U> {
    fn genesis(prev_pf: PacketId, prev_ch: ChainHash) -> Self {
        Chain {
            packet_id: vec![prev_pf.clone()],
            chain_hash: vec![prev_ch],
            chain_unacked: vec![BTreeSet::new()],
            op_initial: vec![None],
            op_metadata: vec![None],
            op_metadata_authenticated: vec![true],
            op_final: vec![prev_pf.clone()],
            accepted: HashSet::from([prev_pf]),
        }
    }

    fn prev_ch(&self) -> &ChainHash {
        &self.chain_hash[self.chain_hash.len() - 1]
    }

    fn prev_pf(&self) -> &PacketId {
        &self.op_final[self.op_final.len() - 1]
    }

    fn has_ongoing_op(&self) -> bool {
        self.op_initial.len() > self.op_final.len()
    }

    fn pending_initial(&self) -> Option<&PacketId> {
        if self.has_ongoing_op() {
            self.op_initial.last().and_then(Option::as_ref)
        } else {
            None
        }
    }

    /// Check a packet against this chain without changing it.
    ///
    /// For a packet that is both initial and final, the final half is
    /// checked as if the initial half had already been accepted.
    fn check(
        &self,
        packet: &PacketId,
        prev_pf: Option<&PacketId>,
        prev_pi: Option<&PacketId>,
        is_final: bool,
    ) -> Result<(), Rejection> {
        if self.accepted.contains(packet) {
            return Err(Rejection::DuplicatePacket {
                packet: packet.clone(),
            });
        }

        let mut pending = self.pending_initial().cloned();
        if let Some(prev_pf) = prev_pf {
            if let Some(pending) = pending {
                return Err(Rejection::OperationPending {
                    packet: packet.clone(),
                    pending,
                });
            }
            if prev_pf != self.prev_pf() {
                return Err(Rejection::StaleInitial {
                    packet: packet.clone(),
                    prev_pf: prev_pf.clone(),
                    expected: self.prev_pf().clone(),
                });
            }
            pending = Some(packet.clone());
        }

        if is_final {
            let Some(expected) = pending else {
                return Err(Rejection::NoPendingOperation {
                    packet: packet.clone(),
                });
            };
            if prev_pi != Some(&expected) {
                return Err(Rejection::StaleFinal {
                    packet: packet.clone(),
                    prev_pi: prev_pi.cloned(),
                    expected,
                });
            }
        }
        Ok(())
    }

    fn append(
        &mut self,
        packet: &PacketId,
        metadata: Option<&GreetingMetadata>,
        is_final: bool,
        packet_type: u8,
        unacked: BTreeSet<U>,
    ) {
        if let Some(metadata) = metadata {
            self.op_initial.push(Some(packet.clone()));
            self.op_metadata.push(Some(metadata.clone()));
            self.op_metadata_authenticated.push(false);
        }
        if is_final {
            self.op_final.push(packet.clone());
        }

        let hash = self.prev_ch().next(packet, packet_type);
        self.packet_id.push(packet.clone());
        self.chain_hash.push(hash);
        self.chain_unacked.push(unacked);
        self.accepted.insert(packet.clone());

        assert_eq!(self.packet_id.len(), self.chain_hash.len());
        assert_eq!(self.packet_id.len(), self.chain_unacked.len());
        assert_eq!(self.op_initial.len(), self.op_metadata.len());
        assert_eq!(self.op_initial.len(), self.op_metadata_authenticated.len());
    }

    fn initial_after(&self, prev_pf: &PacketId) -> Option<usize> {
        let i = self.op_final.iter().position(|pf| pf == prev_pf)?;
        (i + 1 < self.op_initial.len()).then_some(i + 1)
    }
}

#[derive(Clone, Debug)]
enum SyncState<U> {
    /// Genesis candidates we refused, so a competing proposal for the same
    /// baseline is never adopted later.
    Unsynced { seen_prev_pf: HashSet<PacketId> },
    Synced(Chain<U>),
}

/// Hash-chained total order over membership operations.
///
/// Not internally synchronized: one instance belongs to one session, and
/// its callbacks must not call back into it.
#[derive(Clone, Debug)]
pub struct ServerOrder<U> {
    state: SyncState<U>,
    config: ServerOrderConfig,
}

impl<U: Clone + Ord + fmt::Debug> Default for ServerOrder<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: Clone + Ord + fmt::Debug> ServerOrder<U> {
    /// Create an unsynced server order.
    pub fn new() -> Self {
        Self::with_config(ServerOrderConfig::default())
    }

    pub fn with_config(config: ServerOrderConfig) -> Self {
        ServerOrder {
            state: SyncState::Unsynced {
                seen_prev_pf: HashSet::new(),
            },
            config,
        }
    }

    /// Forget everything. Call this after leaving the channel.
    pub fn clear(&mut self) {
        tracing::debug!("server order cleared");
        self.state = SyncState::Unsynced {
            seen_prev_pf: HashSet::new(),
        };
    }

    /// Start a brand-new chain from a random baseline packet id.
    ///
    /// Returns the baseline id.
    pub fn sync_new(&mut self) -> PacketId {
        let p_id = PacketId::random();
        let ch = ChainHash::genesis(&p_id, self.config.genesis_packet_type);
        self.sync_with_prev(p_id.clone(), ch);
        p_id
    }

    /// Adopt someone else's claimed chain tip as our baseline.
    pub fn sync_with_prev(&mut self, prev_pf: PacketId, prev_ch: ChainHash) {
        tracing::info!(prev_pf = %prev_pf, prev_ch = %prev_ch.short(), "server order synced");
        self.state = SyncState::Synced(Chain::genesis(prev_pf, prev_ch));
    }

    fn chain(&self) -> Option<&Chain<U>> {
        match &self.state {
            SyncState::Synced(chain) => Some(chain),
            SyncState::Unsynced { .. } => None,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.chain().is_some()
    }

    /// Chain hash at the last accepted packet.
    pub fn prev_ch(&self) -> Option<&ChainHash> {
        self.chain().map(Chain::prev_ch)
    }

    /// Final packet of the latest completed operation.
    pub fn prev_pf(&self) -> Option<&PacketId> {
        self.chain().map(Chain::prev_pf)
    }

    /// Whether an operation has started but not completed.
    pub fn has_ongoing_op(&self) -> bool {
        self.chain().map_or(false, Chain::has_ongoing_op)
    }

    /// Number of packets in the chain, baseline included. Zero while unsynced.
    pub fn chain_len(&self) -> usize {
        self.chain().map_or(0, |c| c.packet_id.len())
    }

    pub fn chain_hashes(&self) -> &[ChainHash] {
        self.chain().map(|c| c.chain_hash.as_slice()).unwrap_or(&[])
    }

    pub fn packet_ids(&self) -> &[PacketId] {
        self.chain().map(|c| c.packet_id.as_slice()).unwrap_or(&[])
    }

    /// Try to accept an initial packet, a final packet, or both at once.
    ///
    /// `transport_recipients` are the members that were in the channel when
    /// the packet arrived, owner included. On acceptance `post_accept_initial`
    /// is called with `(pI, prev_pF)` and then `post_accept_final` with
    /// `(pF, prev_pI)`, for whichever halves the packet has.
    ///
    /// # Panics
    ///
    /// If `op` is neither initial nor final, or is initial without metadata.
    pub fn try_op_packet<O, FI, FF>(
        &mut self,
        owner: &U,
        op: &O,
        transport_recipients: &BTreeSet<U>,
        post_accept_initial: FI,
        post_accept_final: FF,
    ) -> Result<(), Rejection>
    where
        O: OperationSummary<U>,
        FI: FnOnce(&PacketId, &PacketId),
        FF: FnOnce(&PacketId, &PacketId),
    {
        let packet = op.packet_id();
        assert!(
            op.is_initial() || op.is_final(),
            "packet {:?} is neither initial nor final",
            packet
        );
        let metadata = if op.is_initial() {
            match op.metadata() {
                Some(metadata) => Some(metadata),
                None => panic!("initial packet {:?} carries no metadata", packet),
            }
        } else {
            None
        };

        let result = self.accept(owner, op, metadata, transport_recipients);
        match &result {
            Ok(()) => {
                if let Some(metadata) = metadata {
                    tracing::info!(packet = %packet, prev_pf = %metadata.prev_pf, "accepted initial packet");
                    post_accept_initial(packet, &metadata.prev_pf);
                }
                if let Some(prev_pi) = op.prev_pi().filter(|_| op.is_final()) {
                    tracing::info!(packet = %packet, prev_pi = %prev_pi, "accepted final packet");
                    post_accept_final(packet, prev_pi);
                }
                assert_eq!(
                    self.has_ongoing_op(),
                    op.prev_pi().is_none(),
                    "pending state disagrees with packet {:?}",
                    packet
                );
            }
            Err(rejection) => {
                tracing::info!(packet = %packet, reason = %rejection, "rejected packet");
            }
        }
        result
    }

    fn accept<O: OperationSummary<U>>(
        &mut self,
        owner: &U,
        op: &O,
        metadata: Option<&GreetingMetadata>,
        transport_recipients: &BTreeSet<U>,
    ) -> Result<(), Rejection> {
        let packet = op.packet_id();
        if metadata.is_some() {
            let missing = op.members().difference(transport_recipients).count();
            if missing > 0 {
                return Err(Rejection::NotEchoed {
                    packet: packet.clone(),
                    missing,
                });
            }
        }

        let prev_pf = metadata.map(|m| &m.prev_pf);
        let prev_pi = op.prev_pi();
        let is_final = op.is_final();
        let unacked: BTreeSet<U> = transport_recipients
            .iter()
            .filter(|member| *member != owner)
            .cloned()
            .collect();

        match &mut self.state {
            SyncState::Synced(chain) => {
                chain.check(packet, prev_pf, prev_pi, is_final)?;
                chain.append(packet, metadata, is_final, op.packet_type(), unacked);
                Ok(())
            }
            SyncState::Unsynced { seen_prev_pf } => {
                let Some(metadata) = metadata else {
                    return Err(Rejection::NotSynced {
                        packet: packet.clone(),
                    });
                };
                if !op.members().contains(owner) {
                    seen_prev_pf.insert(metadata.prev_pf.clone());
                    return Err(Rejection::NotForUs {
                        packet: packet.clone(),
                    });
                }
                if seen_prev_pf.contains(&metadata.prev_pf) {
                    return Err(Rejection::CompetingGenesis {
                        packet: packet.clone(),
                        prev_pf: metadata.prev_pf.clone(),
                    });
                }

                let mut chain = Chain::genesis(metadata.prev_pf.clone(), metadata.prev_ch);
                if let Err(rejection) = chain.check(packet, prev_pf, prev_pi, is_final) {
                    seen_prev_pf.insert(metadata.prev_pf.clone());
                    return Err(rejection);
                }
                tracing::info!(prev_pf = %metadata.prev_pf, packet = %packet, "server order synced from proposal");
                chain.append(packet, Some(metadata), is_final, op.packet_type(), unacked);
                self.state = SyncState::Synced(chain);
                Ok(())
            }
        }
    }

    /// Mark the metadata of the operation that followed final packet
    /// `prev_pf` as authenticated.
    pub fn set_metadata_authenticated(&mut self, prev_pf: &PacketId) -> Result<(), Rejection> {
        let SyncState::Synced(chain) = &mut self.state else {
            return Err(Rejection::NotSynced {
                packet: prev_pf.clone(),
            });
        };
        let i = chain
            .initial_after(prev_pf)
            .ok_or_else(|| Rejection::UnknownPacket {
                packet: prev_pf.clone(),
            })?;
        chain.op_metadata_authenticated[i] = true;
        Ok(())
    }

    /// Metadata of the operation that followed final packet `prev_pf`.
    pub fn metadata_for(&self, prev_pf: &PacketId) -> Option<&GreetingMetadata> {
        let chain = self.chain()?;
        chain.op_metadata[chain.initial_after(prev_pf)?].as_ref()
    }

    pub fn is_metadata_authenticated(&self, prev_pf: &PacketId) -> Option<bool> {
        let chain = self.chain()?;
        Some(chain.op_metadata_authenticated[chain.initial_after(prev_pf)?])
    }

    /// Record `member`'s claim of the chain hash at `packet`.
    ///
    /// A matching claim confirms that packet and everything before it, since
    /// a chain hash commits to its whole prefix.
    pub fn confirm_chain_hash(
        &mut self,
        member: &U,
        packet: &PacketId,
        claimed: &ChainHash,
    ) -> Result<(), Rejection> {
        let SyncState::Synced(chain) = &mut self.state else {
            return Err(Rejection::NotSynced {
                packet: packet.clone(),
            });
        };
        let i = chain
            .packet_id
            .iter()
            .position(|p| p == packet)
            .ok_or_else(|| Rejection::UnknownPacket {
                packet: packet.clone(),
            })?;

        let ours = chain.chain_hash[i];
        if ours != *claimed {
            tracing::warn!(
                member = ?member,
                packet = %packet,
                ours = %ours.short(),
                claimed = %claimed.short(),
                "chain hash divergence"
            );
            return Err(Rejection::ChainHashMismatch {
                packet: packet.clone(),
                ours,
                claimed: *claimed,
            });
        }
        for unacked in &mut chain.chain_unacked[..=i] {
            unacked.remove(member);
        }
        Ok(())
    }

    /// Packets some member has not yet confirmed, with those members.
    pub fn unacked_packets(&self) -> Vec<(&PacketId, &BTreeSet<U>)> {
        let Some(chain) = self.chain() else {
            return Vec::new();
        };
        chain
            .packet_id
            .iter()
            .zip(&chain.chain_unacked)
            .filter(|(_, unacked)| !unacked.is_empty())
            .collect()
    }
}
