//! Send/receive correlation and duplicate suppression
//!
//! Tracks in-flight probes (sequence → send time) and the set of sequence
//! numbers already credited as received. A sequence resolves at most once;
//! later arrivals of the same number are duplicates and touch nothing.
//!
//! The pending map is bounded: entries older than [`PENDING_HORIZON_NS`]
//! are dropped on a periodic sweep. An evicted probe can no longer yield
//! an RTT sample, but its sequence stays eligible for duplicate
//! suppression through the received set. The received set itself grows
//! for the run's lifetime: suppression has to hold run-long, and a run
//! is bounded by its configured duration.

use std::collections::{HashMap, HashSet};

use tracing::trace;

/// How long an unresolved probe stays pending, in nanoseconds
///
/// Six times the ten-second sliding-window horizon: a reply this old can
/// no longer influence the windowed statistics.
pub const PENDING_HORIZON_NS: u64 = 60_000_000_000;

/// Outcome of correlating one received probe datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Sequence already credited; drop without touching any counter
    Duplicate,
    /// Fresh sequence with no pending send record (entry consumed,
    /// evicted, or a wrap collision); credited for duplicate suppression
    /// only
    Unmatched,
    /// Fresh sequence matched to its send record
    Resolved { rtt_ns: u64 },
}

/// Correlates echoed probes back to their send times
#[derive(Debug, Default)]
pub struct CorrelationStore {
    /// seq → send_time_ns for probes sent but not yet resolved
    pending: HashMap<u32, u64>,
    /// Sequences already credited as received
    received: HashSet<u32>,
    /// Pending entries dropped by the staleness sweep
    evicted: u64,
}

impl CorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully sent probe
    pub fn record_sent(&mut self, seq: u32, send_time_ns: u64) {
        self.pending.insert(seq, send_time_ns);
    }

    /// Whether a sequence has already been credited as received
    pub fn is_received(&self, seq: u32) -> bool {
        self.received.contains(&seq)
    }

    /// Correlate a received probe at `recv_time_ns`
    pub fn resolve(&mut self, seq: u32, recv_time_ns: u64) -> Resolution {
        if !self.received.insert(seq) {
            return Resolution::Duplicate;
        }
        match self.pending.remove(&seq) {
            Some(send_ns) => Resolution::Resolved {
                rtt_ns: recv_time_ns.saturating_sub(send_ns),
            },
            None => Resolution::Unmatched,
        }
    }

    /// Drop pending entries older than the horizon
    ///
    /// Returns the number of entries evicted. Called from the session on
    /// the report cadence, not on the per-packet hot path.
    pub fn evict_stale(&mut self, now_ns: u64) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|_, send_ns| now_ns.saturating_sub(*send_ns) < PENDING_HORIZON_NS);
        let evicted = before - self.pending.len();
        if evicted > 0 {
            self.evicted += evicted as u64;
            trace!(evicted, pending = self.pending.len(), "stale_pending_evicted");
        }
        evicted
    }

    /// Number of probes currently awaiting an echo
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of distinct sequences credited as received
    pub fn received_len(&self) -> usize {
        self.received.len()
    }

    /// Total pending entries dropped by staleness sweeps
    pub fn evicted_total(&self) -> u64 {
        self.evicted
    }
}
