//! Exit-rule specifications and their lookup tables.
//!
//! - [`ExitRule`]: one validated rule (stop, target, holding limit, trailing)
//! - [`StrengthRules`]: strong/medium/weak table used by strength routing
//! - [`RuleRegistry`]: keyed mapping with fail-loud lookup

pub mod registry;
pub mod rule;
pub mod strength;

pub use registry::{RuleKey, RuleRegistry};
pub use rule::{ExitRule, ExitRuleBuilder, ExitRuleConfig, TrailingStop};
pub use strength::StrengthRules;

use crate::domain::UnknownStrength;

/// Errors raised while building or looking up exit rules.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExitRuleError {
    #[error("exit rule name must not be empty")]
    EmptyName,
    #[error("exit rule '{rule}': {field} must be a finite non-negative ATR multiple, got {value}")]
    InvalidDistance {
        rule: String,
        field: &'static str,
        value: f64,
    },
    #[error("exit rule '{rule}': max_holding_bars must be >= 1")]
    ZeroHoldingLimit { rule: String },
    #[error("unknown exit rule preset: {0}")]
    UnknownPreset(String),
    #[error("no strength rule preset for symbol: {0}")]
    UnknownSymbol(String),
    #[error("no exit rule registered for key: {0}")]
    MissingRule(String),
    #[error(transparent)]
    UnknownStrength(#[from] UnknownStrength),
}
