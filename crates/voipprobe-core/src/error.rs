//! Error types for probe setup and teardown
//!
//! Transport failures inside the running measurement loop are logged and
//! skipped; lost probes are the measured phenomenon, not a fault. Only
//! socket setup and CSV sink I/O propagate as errors.

use thiserror::Error;

/// Errors surfaced outside the measurement loop
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("failed to reach target {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("socket configuration failed: {0}")]
    Socket(#[source] std::io::Error),

    #[error("failed to open CSV sink {path}: {source}")]
    CsvOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV sink I/O failed: {0}")]
    Csv(#[from] std::io::Error),
}
