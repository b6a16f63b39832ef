//! Periodic aggregate reporting
//!
//! The summary timer is independent of send pacing: summaries fire on
//! their own fixed interval whether or not any sample arrived since the
//! last one, and neither timer ever blocks the other (both are polled
//! from the same loop).

pub mod csv;

use std::time::{Duration, Instant};

use crate::metrics::codec::CodecProfile;
use crate::metrics::jitter::JitterEstimator;
use crate::metrics::mos;

/// Whole-run counters and means feeding the periodic summary
#[derive(Debug, Clone)]
pub struct RunningTotals {
    sent: u64,
    received: u64,
    rtt_sum_ms: f64,
    oneway_sum_ms: f64,
    min_rtt_ms: f64,
    max_rtt_ms: f64,
}

impl RunningTotals {
    pub fn new() -> Self {
        Self {
            sent: 0,
            received: 0,
            rtt_sum_ms: 0.0,
            oneway_sum_ms: 0.0,
            min_rtt_ms: f64::MAX,
            max_rtt_ms: 0.0,
        }
    }

    /// Count one probe actually put on the wire
    pub fn record_sent(&mut self) {
        self.sent += 1;
    }

    /// Count one resolved echo and fold its delays into the run means
    pub fn record_resolved(&mut self, rtt_ms: f64, oneway_ms: f64) {
        self.received += 1;
        self.rtt_sum_ms += rtt_ms;
        self.oneway_sum_ms += oneway_ms;
        self.min_rtt_ms = self.min_rtt_ms.min(rtt_ms);
        self.max_rtt_ms = self.max_rtt_ms.max(rtt_ms);
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    /// Whole-run loss: sent vs received totals since start
    pub fn cumulative_loss_pct(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        100.0 * (self.sent - self.received) as f64 / self.sent as f64
    }

    /// Mean RTT over the whole run (0.0 before the first sample)
    pub fn mean_rtt_ms(&self) -> f64 {
        if self.received == 0 {
            return 0.0;
        }
        self.rtt_sum_ms / self.received as f64
    }

    /// Mean one-way delay over the whole run (0.0 before the first sample)
    pub fn mean_oneway_ms(&self) -> f64 {
        if self.received == 0 {
            return 0.0;
        }
        self.oneway_sum_ms / self.received as f64
    }

    pub fn min_rtt_ms(&self) -> Option<f64> {
        (self.received > 0).then_some(self.min_rtt_ms)
    }

    pub fn max_rtt_ms(&self) -> Option<f64> {
        (self.received > 0).then_some(self.max_rtt_ms)
    }
}

impl Default for RunningTotals {
    fn default() -> Self {
        Self::new()
    }
}

/// Emits the aggregate console summary on a fixed cadence
#[derive(Debug)]
pub struct Reporter {
    interval: Duration,
    next_report: Instant,
}

impl Reporter {
    /// First summary fires one full interval after construction
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_report: Instant::now() + interval,
        }
    }

    /// Emit a summary line if the report deadline has passed
    ///
    /// The summary MOS is computed from the current window loss and the
    /// whole-run mean one-way delay; unlike per-sample export it is not
    /// warm-up gated, matching its role as a coarse operator readout.
    /// Returns whether a summary was emitted.
    pub fn maybe_report(
        &mut self,
        now: Instant,
        totals: &RunningTotals,
        window_loss_pct: f64,
        jitter: &JitterEstimator,
        codec: CodecProfile,
        burst_r: f64,
    ) -> bool {
        if now < self.next_report {
            return false;
        }
        let est = mos::estimate(totals.mean_oneway_ms(), window_loss_pct, codec, burst_r);
        println!(
            "[stats] sent={} recv={} loss_total={:.2}% loss_win={:.2}% \
             rtt_avg={:.2}ms owd_avg~={:.2}ms jitter={:.2}ms mos~{:.2}",
            totals.sent(),
            totals.received(),
            totals.cumulative_loss_pct(),
            window_loss_pct,
            totals.mean_rtt_ms(),
            totals.mean_oneway_ms(),
            jitter.jitter_ms(),
            est.mos,
        );
        self.next_report += self.interval;
        true
    }
}
