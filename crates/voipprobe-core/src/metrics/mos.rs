//! ITU-T E-model MOS estimation (reduced form)
//!
//! Converts one-way delay and packet loss into a transmission rating
//! (R-factor) and a Mean Opinion Score on the 1.0–4.5 scale, using the
//! delay impairment and effective equipment impairment terms of ITU-T
//! G.107. The one-way delay fed in upstream is approximated as RTT/2:
//! true asymmetric-path delay cannot be measured without clock
//! synchronization between the endpoints, so the symmetric-path
//! assumption is a documented simplification, not something this
//! estimator tries to correct.

use super::codec::CodecProfile;

/// Delay threshold in ms above which the steeper impairment term engages
const DELAY_KNEE_MS: f64 = 177.3;

/// Base transmission rating with zero impairments
const R_BASE: f64 = 94.2;

/// E-model outputs for one estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosEstimate {
    /// Mean Opinion Score, clamped to [1.0, 4.5]
    pub mos: f64,
    /// Transmission rating factor R
    pub r_factor: f64,
    /// Delay impairment Id
    pub id: f64,
    /// Effective equipment impairment Ie_eff
    pub ie_eff: f64,
}

/// Compute the reduced-form E-model estimate
///
/// `delay_ms` and `loss_pct` are clamped to be non-negative before use.
/// `burst_r` is the burst ratio: 1.0 models random loss, larger values
/// model bursty loss.
pub fn estimate(delay_ms: f64, loss_pct: f64, codec: CodecProfile, burst_r: f64) -> MosEstimate {
    let d = delay_ms.max(0.0);
    let p = loss_pct.max(0.0);

    let id = 0.024 * d + 0.11 * (d - DELAY_KNEE_MS) * hstep(d - DELAY_KNEE_MS);

    let ie_eff = if p > 0.0 {
        codec.ie + (95.0 - codec.ie) * p / (p / codec.bpl + burst_r)
    } else {
        codec.ie
    };

    let r = R_BASE - id - ie_eff;

    let mos = if r <= 0.0 {
        1.0
    } else if r >= 100.0 {
        4.5
    } else {
        (1.0 + 0.035 * r + r * (r - 60.0) * (100.0 - r) * 7e-6).clamp(1.0, 4.5)
    };

    MosEstimate {
        mos,
        r_factor: r,
        id,
        ie_eff,
    }
}

fn hstep(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::codec::profile_for;
    use approx::assert_relative_eq;

    #[test]
    fn test_clean_g711_fixed_point() {
        let est = estimate(0.0, 0.0, profile_for("g711"), 1.0);
        assert_eq!(est.id, 0.0);
        assert_eq!(est.ie_eff, 0.0);
        assert_relative_eq!(est.r_factor, 94.2, epsilon = 1e-9);
        // Cubic branch, not the >= 100 clamp
        assert_relative_eq!(est.mos, 4.4278, epsilon = 1e-3);
    }

    #[test]
    fn test_delayed_g711_fixed_point() {
        let est = estimate(150.0, 0.0, profile_for("g711"), 1.0);
        assert_relative_eq!(est.id, 3.6, epsilon = 1e-9);
        assert_relative_eq!(est.r_factor, 90.6, epsilon = 1e-9);
        assert_relative_eq!(est.mos, 4.3534, epsilon = 1e-3);
    }

    #[test]
    fn test_lossy_g729_hits_floor() {
        let est = estimate(50.0, 5.0, profile_for("g729"), 1.0);
        // Ie_eff ≈ 343.5 drives R far below zero
        assert!(est.ie_eff > 300.0);
        assert!(est.r_factor < 0.0);
        assert_eq!(est.mos, 1.0);
    }

    #[test]
    fn test_delay_knee_engages_above_threshold() {
        let below = estimate(177.3, 0.0, profile_for("g711"), 1.0);
        let above = estimate(177.4, 0.0, profile_for("g711"), 1.0);
        assert_relative_eq!(below.id, 0.024 * 177.3, epsilon = 1e-9);
        assert!(above.id > 0.024 * 177.4);
    }

    #[test]
    fn test_mos_non_increasing_in_delay() {
        let codec = profile_for("g711");
        let mut last = f64::INFINITY;
        for d in (0..500).map(|i| i as f64) {
            let mos = estimate(d, 0.0, codec, 1.0).mos;
            assert!(mos <= last + 1e-12, "MOS rose from {} at d={}", last, d);
            last = mos;
        }
    }

    #[test]
    fn test_mos_non_increasing_in_loss() {
        let codec = profile_for("opus");
        let mut last = f64::INFINITY;
        for p in (0..200).map(|i| i as f64 * 0.25) {
            let mos = estimate(80.0, p, codec, 1.0).mos;
            assert!(mos <= last + 1e-12, "MOS rose from {} at p={}", last, p);
            last = mos;
        }
    }

    #[test]
    fn test_mos_always_in_range() {
        for &(d, p) in &[
            (0.0, 0.0),
            (10_000.0, 0.0),
            (0.0, 100.0),
            (500.0, 50.0),
            (-5.0, -5.0), // clamped to zero
        ] {
            for name in ["g711", "g729", "opus"] {
                let est = estimate(d, p, profile_for(name), 1.0);
                assert!(est.mos >= 1.0 && est.mos <= 4.5, "MOS {} out of range", est.mos);
            }
        }
    }

    #[test]
    fn test_burst_ratio_softens_loss_impairment() {
        let codec = profile_for("g729");
        let random = estimate(50.0, 2.0, codec, 1.0);
        let bursty = estimate(50.0, 2.0, codec, 2.0);
        assert!(bursty.ie_eff < random.ie_eff);
        assert!(bursty.mos >= random.mos);
    }
}
