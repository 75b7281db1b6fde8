//! LC-MS feature identifiers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A feature identifier, split into m/z and retention time when it follows
/// one of the usual naming schemes (`101.05_1.2`, `101.05@1.2`, `101.05/1.2`,
/// XCMS-style `M101T72`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureId {
    /// The identifier as it appears in the input.
    pub raw: String,
    /// Mass-to-charge ratio, if the identifier encodes one.
    pub mz: Option<f64>,
    /// Retention time, if the identifier encodes one.
    pub rt: Option<f64>,
}

fn composite_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<mz>\d+(?:\.\d+)?)\s*[_@/]\s*(?P<rt>\d+(?:\.\d+)?)\s*(?:min|s)?$")
            .expect("valid m/z-RT pattern")
    })
}

fn xcms_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^M(?P<mz>\d+(?:\.\d+)?)T(?P<rt>\d+(?:\.\d+)?)$").expect("valid XCMS pattern")
    })
}

impl FeatureId {
    /// Parse an identifier. Unrecognised identifiers keep `mz` and `rt` empty.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let caps = composite_pattern()
            .captures(trimmed)
            .or_else(|| xcms_pattern().captures(trimmed));

        let (mz, rt) = match caps {
            Some(c) => (
                c.name("mz").and_then(|m| m.as_str().parse().ok()),
                c.name("rt").and_then(|m| m.as_str().parse().ok()),
            ),
            None => (None, None),
        };

        Self {
            raw: raw.to_string(),
            mz,
            rt,
        }
    }

    /// Whether both m/z and retention time were recovered.
    pub fn is_composite(&self) -> bool {
        self.mz.is_some() && self.rt.is_some()
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
