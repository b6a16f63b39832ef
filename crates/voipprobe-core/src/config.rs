//! Probe run configuration
//!
//! Every knob for a measurement run. Loadable from a JSON file with CLI
//! overrides applied on top; a missing or malformed file falls back to
//! defaults rather than aborting.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{DEFAULT_PORT, DEFAULT_PPS};

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_pps() -> u32 {
    DEFAULT_PPS
}

fn default_codec() -> String {
    "g711".to_string()
}

fn default_burst_r() -> f64 {
    1.0
}

fn default_warmup_secs() -> u64 {
    3
}

fn default_report_interval_secs() -> u64 {
    5
}

fn default_timeout_ms() -> u64 {
    200
}

/// Configuration for one probe run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Target host running the echo responder
    #[serde(default = "default_host")]
    pub host: String,
    /// Target UDP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Target probe rate in packets per second
    #[serde(default = "default_pps")]
    pub pps: u32,
    /// Run duration in seconds (None = run until interrupted)
    #[serde(default)]
    pub duration_secs: Option<u64>,
    /// CSV export path (None = console reporting only)
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
    /// Codec name for E-model impairment lookup
    #[serde(default = "default_codec")]
    pub codec: String,
    /// E-model burst ratio (1.0 = random loss)
    #[serde(default = "default_burst_r")]
    pub burst_r: f64,
    /// Seconds before MOS estimates are considered trustworthy
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,
    /// Seconds between aggregate console summaries
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
    /// Receive poll timeout in milliseconds (bounds one loop iteration)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            pps: default_pps(),
            duration_secs: None,
            csv_path: None,
            codec: default_codec(),
            burst_r: default_burst_r(),
            warmup_secs: default_warmup_secs(),
            report_interval_secs: default_report_interval_secs(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ProbeConfig {
    /// Load config from a JSON file, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded config from disk");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
