//! Codec impairment profiles for the E-model
//!
//! Maps a codec name to its equipment-impairment factor (Ie) and
//! packet-loss robustness factor (Bpl). Unknown names fall back to the
//! g711 profile so a probe keeps running with a mistyped codec; the
//! fallback is surfaced as a warning rather than an error.

use tracing::warn;

/// E-model impairment constants for one codec
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecProfile {
    /// Equipment impairment factor Ie
    pub ie: f64,
    /// Packet-loss robustness factor Bpl
    pub bpl: f64,
}

/// Known codec profiles, keyed by lowercase name
pub const CODEC_PROFILES: &[(&str, CodecProfile)] = &[
    ("g711", CodecProfile { ie: 0.0, bpl: 25.0 }),
    ("g729", CodecProfile { ie: 11.0, bpl: 19.0 }),
    ("opus", CodecProfile { ie: 5.0, bpl: 14.0 }),
];

/// Look up a codec profile by name (case-insensitive)
pub fn profile_for(name: &str) -> CodecProfile {
    let lower = name.to_ascii_lowercase();
    match CODEC_PROFILES.iter().find(|(n, _)| *n == lower) {
        Some((_, profile)) => *profile,
        None => {
            warn!(codec = %name, "Unknown codec, falling back to g711 profile");
            CODEC_PROFILES[0].1
        }
    }
}

/// Names of all known codecs, for `--list-codecs`
pub fn codec_names() -> impl Iterator<Item = &'static str> {
    CODEC_PROFILES.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_profiles() {
        assert_eq!(profile_for("g711"), CodecProfile { ie: 0.0, bpl: 25.0 });
        assert_eq!(profile_for("g729"), CodecProfile { ie: 11.0, bpl: 19.0 });
        assert_eq!(profile_for("opus"), CodecProfile { ie: 5.0, bpl: 14.0 });
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(profile_for("G711"), profile_for("g711"));
        assert_eq!(profile_for("Opus"), profile_for("opus"));
    }

    #[test]
    fn test_unknown_codec_falls_back_to_g711() {
        assert_eq!(profile_for("ilbc"), profile_for("g711"));
        assert_eq!(profile_for(""), profile_for("g711"));
    }

    #[test]
    fn test_names_enumeration() {
        let names: Vec<_> = codec_names().collect();
        assert_eq!(names, vec!["g711", "g729", "opus"]);
    }
}
