//! Entry-time signal strength labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Strength label attached to an entry by the (external) labelling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Strong,
    Medium,
    Weak,
}

/// A text label that is not one of `strong`, `medium`, `weak`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown signal strength label '{0}' (expected strong, medium or weak)")]
pub struct UnknownStrength(pub String);

impl SignalStrength {
    /// Label used for entries that carry no strength label.
    pub const FALLBACK: SignalStrength = SignalStrength::Medium;

    pub const ALL: [SignalStrength; 3] = [
        SignalStrength::Strong,
        SignalStrength::Medium,
        SignalStrength::Weak,
    ];

    /// Resolve an optional per-entry label. Missing labels take [`Self::FALLBACK`].
    pub fn resolve(label: Option<SignalStrength>) -> SignalStrength {
        match label {
            Some(strength) => strength,
            None => Self::FALLBACK,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStrength::Strong => "strong",
            SignalStrength::Medium => "medium",
            SignalStrength::Weak => "weak",
        }
    }
}

impl FromStr for SignalStrength {
    type Err = UnknownStrength;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strong" => Ok(SignalStrength::Strong),
            "medium" => Ok(SignalStrength::Medium),
            "weak" => Ok(SignalStrength::Weak),
            _ => Err(UnknownStrength(s.to_string())),
        }
    }
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
