//! Sliding-window packet loss tracking
//!
//! A bounded FIFO of the most recently *sent* sequence numbers. Loss is
//! computed only over entries currently resident in the window, giving an
//! estimate local to recent traffic rather than the whole run, which is
//! the figure that matters when judging a live call. A separate cumulative
//! sent/received tally lives in the reporter's running totals.

use std::collections::VecDeque;

/// Minimum window capacity regardless of probe rate
const MIN_WINDOW: usize = 100;

/// Bounded FIFO of the most recently sent sequence numbers
#[derive(Debug)]
pub struct SlidingWindow {
    seqs: VecDeque<u32>,
    capacity: usize,
}

impl SlidingWindow {
    /// Window sized for a probe rate: `max(pps * 10, 100)`, roughly ten
    /// seconds of traffic
    pub fn for_rate(pps: u32) -> Self {
        Self::with_capacity((pps as usize * 10).max(MIN_WINDOW))
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seqs: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    /// Record a sent sequence number, evicting the oldest on overflow
    pub fn record_sent(&mut self, seq: u32) {
        if self.seqs.len() >= self.capacity {
            self.seqs.pop_front();
        }
        self.seqs.push_back(seq);
    }

    /// Percentage of resident sent sequences not yet confirmed received
    ///
    /// Scans the window against the caller's received predicate; 0.0 for
    /// an empty window.
    pub fn loss_pct<F>(&self, is_received: F) -> f64
    where
        F: Fn(u32) -> bool,
    {
        if self.seqs.is_empty() {
            return 0.0;
        }
        let received = self.seqs.iter().filter(|&&s| is_received(s)).count();
        100.0 * (self.seqs.len() - received) as f64 / self.seqs.len() as f64
    }
}
