//! Voipprobe Core - UDP probe engine, quality metrics, and reporting
//!
//! This library provides the measurement engine for estimating voice-call
//! quality over an arbitrary UDP path. It sends timestamped, sequenced
//! datagrams to a stateless echo responder and derives round-trip time,
//! one-way delay, RFC 3550 jitter, sliding-window packet loss, and an
//! ITU-T E-model MOS estimate from the returned traffic.

pub mod config;
pub mod error;
pub mod metrics;
pub mod net;
pub mod report;

pub use config::ProbeConfig;
pub use error::ProbeError;
pub use metrics::codec::CodecProfile;
pub use metrics::jitter::JitterEstimator;
pub use metrics::loss::SlidingWindow;
pub use metrics::mos::MosEstimate;
pub use net::responder::Responder;
pub use net::session::{ProbeSession, SessionState, SessionSummary};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default UDP port for both probe and responder modes
pub const DEFAULT_PORT: u16 = 5005;

/// Default probe rate in packets per second
pub const DEFAULT_PPS: u32 = 50;
