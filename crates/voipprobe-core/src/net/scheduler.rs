//! Probe pacing with absolute-deadline accumulation
//!
//! The next send instant is computed by adding a fixed interval to the
//! previous *scheduled* instant rather than to "now", so transient loop
//! delays do not cause rate drift. Only sustained overload makes the
//! schedule fall behind, and the backlog drains one probe per loop
//! iteration once load subsides.

use std::time::{Duration, Instant};

/// Paces probe emission at a target packets-per-second rate
#[derive(Debug)]
pub struct ProbeScheduler {
    /// Fixed inter-packet interval (1 / pps)
    interval: Duration,
    /// Next scheduled send instant
    next_send: Instant,
    /// Sequence number the next probe will carry, wraps at 2^32
    seq: u32,
}

impl ProbeScheduler {
    /// Create a scheduler for the given rate; rates below 1 pps are
    /// clamped to 1
    pub fn new(pps: u32) -> Self {
        Self::starting_at(pps, 0)
    }

    /// Create a scheduler whose first probe carries `first_seq`
    pub fn starting_at(pps: u32, first_seq: u32) -> Self {
        let pps = pps.max(1);
        Self {
            interval: Duration::from_secs_f64(1.0 / pps as f64),
            next_send: Instant::now(),
            seq: first_seq,
        }
    }

    /// Fixed inter-packet interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sequence number the next emitted probe will carry
    pub fn next_seq(&self) -> u32 {
        self.seq
    }

    /// Emit at most one probe if its deadline has been reached
    ///
    /// Returns the sequence number to send. The counter advances
    /// unconditionally once a deadline fires; whether the send actually
    /// succeeds is the caller's business, a failed send simply becomes a
    /// sequence number that was never on the wire.
    pub fn poll(&mut self, now: Instant) -> Option<u32> {
        if now < self.next_send {
            return None;
        }
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        self.next_send += self.interval;
        Some(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_due_before_deadline() {
        let mut sched = ProbeScheduler::new(10);
        let start = Instant::now();
        // First deadline is "now" at construction, so the first poll fires
        assert_eq!(sched.poll(start), Some(0));
        // Second deadline is one interval after the first scheduled
        // instant; a poll a millisecond later is too early
        assert!(sched.poll(start + Duration::from_millis(1)).is_none());
    }

    #[test]
    fn test_absolute_deadline_accumulation() {
        let mut sched = ProbeScheduler::new(10);
        let t0 = Instant::now() + Duration::from_secs(1);

        // Poll far past several deadlines: the backlog drains one probe
        // per poll because deadlines accumulate from the schedule, not
        // from the poll time.
        assert_eq!(sched.poll(t0), Some(0));
        assert_eq!(sched.poll(t0), Some(1));
        assert_eq!(sched.poll(t0), Some(2));
    }

    #[test]
    fn test_rate_does_not_drift_after_stall() {
        let mut sched = ProbeScheduler::new(100); // 10ms interval
        let t0 = Instant::now() + Duration::from_secs(1);

        // Drain the backlog accumulated since construction; afterwards
        // the schedule sits strictly ahead of t0
        while sched.poll(t0).is_some() {}

        // A 35ms stall owes three or four probes depending on where the
        // next deadline landed inside the current interval, never more
        let late = t0 + Duration::from_millis(35);
        let mut fired = 0;
        while sched.poll(late).is_some() {
            fired += 1;
        }
        assert!((3..=4).contains(&fired), "fired {} probes", fired);
    }

    #[test]
    fn test_sequence_wraps_at_u32_max() {
        let mut sched = ProbeScheduler::starting_at(1000, u32::MAX - 1);
        let t0 = Instant::now() + Duration::from_secs(1);

        assert_eq!(sched.poll(t0), Some(u32::MAX - 1));
        assert_eq!(sched.poll(t0), Some(u32::MAX));
        assert_eq!(sched.poll(t0), Some(0));
        assert_eq!(sched.poll(t0), Some(1));
    }

    #[test]
    fn test_zero_rate_clamped() {
        let sched = ProbeScheduler::new(0);
        assert_eq!(sched.interval(), Duration::from_secs(1));
    }
}
