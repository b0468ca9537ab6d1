use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Estimated network behaviour shared by all sessions of one user.
///
/// The defaults are rough 95th-percentile guesses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowControl {
    /// Time to broadcast (half a round trip) to every member.
    pub broadcast_latency_ms: u64,
    /// Time within which every recipient should have replied to a message.
    pub full_ack_interval_ms: u64,
    /// Messages that may be in transit on the wire at once.
    pub asynchronity: usize,
}

impl FlowControl {
    pub fn with_broadcast_latency(broadcast_latency_ms: u64) -> Self {
        FlowControl {
            broadcast_latency_ms,
            full_ack_interval_ms: 16_000 + 2 * broadcast_latency_ms,
            asynchronity: 4,
        }
    }

    pub fn broadcast_latency(&self) -> Duration {
        Duration::from_millis(self.broadcast_latency_ms)
    }

    pub fn full_ack_interval(&self) -> Duration {
        Duration::from_millis(self.full_ack_interval_ms)
    }
}

impl Default for FlowControl {
    fn default() -> Self {
        Self::with_broadcast_latency(5_000)
    }
}

/// Shape of one stress run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressConfig {
    pub sessions: usize,
    pub members_per_session: usize,
    pub messages_per_session: usize,
    /// A membership operation is proposed every this many messages.
    pub op_interval: usize,
    /// Fixed seed for reproducible runs; random when `None`.
    pub seed: Option<u64>,
    pub flow: FlowControl,
    /// Check transcript invariants after every message.
    pub verify_invariants: bool,
}

impl Default for StressConfig {
    fn default() -> Self {
        StressConfig {
            sessions: 4,
            members_per_session: 5,
            messages_per_session: 400,
            op_interval: 50,
            seed: None,
            flow: FlowControl::default(),
            verify_invariants: false,
        }
    }
}
