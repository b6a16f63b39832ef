//! RFC 3550 interarrival jitter estimation
//!
//! Keeps an exponentially weighted mean absolute deviation of the delta
//! between consecutive transit times, with the 1/16 gain from RFC 3550
//! §6.4.1. A transit time carries whatever clock offset exists between
//! the two endpoints; the offset cancels because only the difference
//! between consecutive transits enters the filter.

/// Gain divisor from RFC 3550 §6.4.1
const JITTER_GAIN: f64 = 16.0;

/// Exponentially smoothed jitter estimate in milliseconds
#[derive(Debug, Default)]
pub struct JitterEstimator {
    jitter_ms: f64,
    last_transit_ms: Option<f64>,
}

impl JitterEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transit-time observation in milliseconds
    ///
    /// The first observation only seeds the filter; from the second
    /// onwards the estimate moves by `(|delta| - J) / 16`. Returns the
    /// updated estimate.
    pub fn update(&mut self, transit_ms: f64) -> f64 {
        if let Some(last) = self.last_transit_ms {
            let delta = (transit_ms - last).abs();
            self.jitter_ms += (delta - self.jitter_ms) / JITTER_GAIN;
        }
        self.last_transit_ms = Some(transit_ms);
        self.jitter_ms
    }

    /// Current jitter estimate in milliseconds (0.0 until the second
    /// observation)
    pub fn jitter_ms(&self) -> f64 {
        self.jitter_ms
    }
}
