//! Quality metrics derived from resolved probes
//!
//! - RFC 3550 interarrival jitter ([`jitter`])
//! - Sliding-window packet loss ([`loss`])
//! - Codec impairment profiles ([`codec`])
//! - ITU-T E-model MOS estimation ([`mos`])

pub mod codec;
pub mod jitter;
pub mod loss;
pub mod mos;
