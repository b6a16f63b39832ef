//! Network side of the probe
//!
//! This module contains everything that touches the wire:
//! - Probe datagram wire format ([`packet`])
//! - Absolute-deadline packet pacing ([`scheduler`])
//! - Send/receive correlation and duplicate suppression ([`correlation`])
//! - The single-loop measurement session ([`session`])
//! - The stateless echo responder ([`responder`])

pub mod correlation;
pub mod packet;
pub mod responder;
pub mod scheduler;
pub mod session;

use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds since the Unix epoch from the system wall clock
///
/// Returns 0 if the clock reads before the epoch, which only happens on a
/// badly misconfigured host; every consumer treats 0 as "no usable time".
pub fn unix_now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
