//! Per-strength exit-rule table.
//!
//! Strong signals get wider stops and later trailing, weak signals get tight
//! stops and fast time-outs. Dispatch is an exhaustive match over
//! [`SignalStrength`]; the only silent default is the documented Medium
//! fallback for unlabeled entries.

use serde::{Deserialize, Serialize};

use super::{ExitRule, ExitRuleError};
use crate::domain::SignalStrength;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthRules {
    pub strong: ExitRule,
    pub medium: ExitRule,
    pub weak: ExitRule,
}

impl StrengthRules {
    /// Instruments with a built-in 4h table.
    pub const SYMBOLS: [&'static str; 3] = ["BTCUSD", "ETHUSD", "XAUUSD"];

    pub fn new(strong: ExitRule, medium: ExitRule, weak: ExitRule) -> Self {
        Self {
            strong,
            medium,
            weak,
        }
    }

    pub fn for_strength(&self, strength: SignalStrength) -> &ExitRule {
        match strength {
            SignalStrength::Strong => &self.strong,
            SignalStrength::Medium => &self.medium,
            SignalStrength::Weak => &self.weak,
        }
    }

    /// Rule for an entry's label; unlabeled entries take the Medium rule.
    pub fn for_entry(&self, label: Option<SignalStrength>) -> (&ExitRule, SignalStrength) {
        let strength = match label {
            Some(strength) => strength,
            None => {
                tracing::debug!(fallback = %SignalStrength::FALLBACK, "entry has no strength label");
                SignalStrength::FALLBACK
            }
        };
        (self.for_strength(strength), strength)
    }

    /// Lookup by text key. Unknown keys are an error, never a default.
    pub fn lookup(&self, key: &str) -> Result<&ExitRule, ExitRuleError> {
        let strength: SignalStrength = key.parse()?;
        Ok(self.for_strength(strength))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalStrength, &ExitRule)> {
        SignalStrength::ALL
            .into_iter()
            .map(move |s| (s, self.for_strength(s)))
    }

    /// Built-in 4h table for an instrument.
    pub fn preset(symbol: &str) -> Result<StrengthRules, ExitRuleError> {
        match symbol.to_ascii_uppercase().as_str() {
            "BTCUSD" => Self::trailing_crypto("BTC4H"),
            "ETHUSD" => Self::trailing_crypto("ETH4H"),
            "XAUUSD" => Ok(Self::new(
                ExitRule::builder("XAU4H_STRONG_Static_SL5_NoTP_max30")
                    .stop_loss_atr(5.0)
                    .max_holding_bars(30)
                    .build()?,
                ExitRule::builder("XAU4H_MEDIUM_Static_SL4_TP3_max20")
                    .stop_loss_atr(4.0)
                    .take_profit_atr(3.0)
                    .max_holding_bars(20)
                    .build()?,
                ExitRule::builder("XAU4H_WEAK_Static_SL2_TP1.5_max15")
                    .stop_loss_atr(2.0)
                    .take_profit_atr(1.5)
                    .max_holding_bars(15)
                    .build()?,
            )),
            _ => Err(ExitRuleError::UnknownSymbol(symbol.to_string())),
        }
    }

    // Crypto tables share parameters and differ only in rule names.
    fn trailing_crypto(prefix: &str) -> Result<StrengthRules, ExitRuleError> {
        Ok(Self::new(
            ExitRule::builder(format!("{prefix}_STRONG_Trail_T3_L1.5_SL4"))
                .stop_loss_atr(4.0)
                .max_holding_bars(30)
                .trailing(3.0, 1.5)
                .build()?,
            ExitRule::builder(format!("{prefix}_MEDIUM_Trail_T2_L1_SL3"))
                .stop_loss_atr(3.0)
                .max_holding_bars(20)
                .trailing(2.0, 1.0)
                .build()?,
            ExitRule::builder(format!("{prefix}_WEAK_Static_SL2_TP1.5_max15"))
                .stop_loss_atr(2.0)
                .take_profit_atr(1.5)
                .max_holding_bars(15)
                .build()?,
        ))
    }
}
