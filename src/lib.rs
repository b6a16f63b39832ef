//! Voipprobe - active UDP voice-quality probe
//!
//! This library re-exports the measurement engine from `voipprobe-core`:
//! packet pacing, send/receive correlation, RTT/one-way delay, RFC 3550
//! jitter, sliding-window loss, and ITU-T E-model MOS estimation.

pub use voipprobe_core::{config, error, metrics, net, report};

pub use voipprobe_core::{
    CodecProfile, JitterEstimator, MosEstimate, ProbeConfig, ProbeError, ProbeSession, Responder,
    SessionState, SessionSummary, SlidingWindow,
};
pub use voipprobe_core::{DEFAULT_PORT, DEFAULT_PPS, VERSION};
