//! ExitRule: one validated exit-rule specification.
//!
//! All distances are ATR multiples measured from the entry price using the ATR
//! captured at entry. `None` disables a component: no stop, no target, no
//! holding limit, no trailing.

use serde::{Deserialize, Serialize};

use super::ExitRuleError;

/// Trailing stop with activation.
///
/// Once close-based PnL reaches `trigger_atr`, the stop ratchets up to
/// `pnl_atr - lock_atr` and never loosens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    pub trigger_atr: f64,
    pub lock_atr: f64,
}

/// Immutable, validated exit-rule specification.
///
/// Construct through [`ExitRule::builder`], [`ExitRule::preset`] or serde; all
/// three paths run the same validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExitRuleConfig", into = "ExitRuleConfig")]
pub struct ExitRule {
    name: String,
    stop_loss_atr: Option<f64>,
    take_profit_atr: Option<f64>,
    max_holding_bars: Option<usize>,
    trailing: Option<TrailingStop>,
}

/// Serialized shape of an [`ExitRule`]. Missing fields mean "disabled".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRuleConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_atr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_atr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_holding_bars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing: Option<TrailingStop>,
}

impl TryFrom<ExitRuleConfig> for ExitRule {
    type Error = ExitRuleError;

    fn try_from(config: ExitRuleConfig) -> Result<Self, Self::Error> {
        let mut builder = ExitRule::builder(config.name);
        builder.stop_loss_atr = config.stop_loss_atr;
        builder.take_profit_atr = config.take_profit_atr;
        builder.max_holding_bars = config.max_holding_bars;
        builder.trailing = config.trailing;
        builder.build()
    }
}

impl From<ExitRule> for ExitRuleConfig {
    fn from(rule: ExitRule) -> Self {
        Self {
            name: rule.name,
            stop_loss_atr: rule.stop_loss_atr,
            take_profit_atr: rule.take_profit_atr,
            max_holding_bars: rule.max_holding_bars,
            trailing: rule.trailing,
        }
    }
}

/// Builder for [`ExitRule`]. Validation happens in [`ExitRuleBuilder::build`].
#[derive(Debug, Clone)]
pub struct ExitRuleBuilder {
    name: String,
    stop_loss_atr: Option<f64>,
    take_profit_atr: Option<f64>,
    max_holding_bars: Option<usize>,
    trailing: Option<TrailingStop>,
}

impl ExitRuleBuilder {
    pub fn stop_loss_atr(mut self, atr_mult: f64) -> Self {
        self.stop_loss_atr = Some(atr_mult);
        self
    }

    pub fn take_profit_atr(mut self, atr_mult: f64) -> Self {
        self.take_profit_atr = Some(atr_mult);
        self
    }

    pub fn max_holding_bars(mut self, bars: usize) -> Self {
        self.max_holding_bars = Some(bars);
        self
    }

    pub fn trailing(mut self, trigger_atr: f64, lock_atr: f64) -> Self {
        self.trailing = Some(TrailingStop {
            trigger_atr,
            lock_atr,
        });
        self
    }

    pub fn build(self) -> Result<ExitRule, ExitRuleError> {
        if self.name.trim().is_empty() {
            return Err(ExitRuleError::EmptyName);
        }

        let check = |field: &'static str, value: Option<f64>| match value {
            Some(v) if !v.is_finite() || v < 0.0 => Err(ExitRuleError::InvalidDistance {
                rule: self.name.clone(),
                field,
                value: v,
            }),
            _ => Ok(()),
        };
        check("stop_loss_atr", self.stop_loss_atr)?;
        check("take_profit_atr", self.take_profit_atr)?;
        if let Some(trailing) = &self.trailing {
            check("trailing.trigger_atr", Some(trailing.trigger_atr))?;
            check("trailing.lock_atr", Some(trailing.lock_atr))?;
        }
        if self.max_holding_bars == Some(0) {
            return Err(ExitRuleError::ZeroHoldingLimit { rule: self.name });
        }

        Ok(ExitRule {
            name: self.name,
            stop_loss_atr: self.stop_loss_atr,
            take_profit_atr: self.take_profit_atr,
            max_holding_bars: self.max_holding_bars,
            trailing: self.trailing,
        })
    }
}

impl ExitRule {
    /// Names accepted by [`ExitRule::preset`].
    pub const PRESETS: [&'static str; 5] = [
        "pure_baseline",
        "static_sl5_notp_max30",
        "trail_t3_l1p5_sl4",
        "trail_t2_l1_sl3",
        "static_sl4_tp5_max30",
    ];

    /// Start a rule with every component disabled.
    pub fn builder(name: impl Into<String>) -> ExitRuleBuilder {
        ExitRuleBuilder {
            name: name.into(),
            stop_loss_atr: None,
            take_profit_atr: None,
            max_holding_bars: None,
            trailing: None,
        }
    }

    /// Named research preset. Unknown names are an error.
    pub fn preset(name: &str) -> Result<ExitRule, ExitRuleError> {
        let builder = match name {
            // Wide stop, no target, no holding limit.
            "pure_baseline" => ExitRule::builder(name).stop_loss_atr(5.0),
            "static_sl5_notp_max30" => ExitRule::builder(name)
                .stop_loss_atr(5.0)
                .max_holding_bars(30),
            "trail_t3_l1p5_sl4" => ExitRule::builder(name)
                .stop_loss_atr(4.0)
                .max_holding_bars(30)
                .trailing(3.0, 1.5),
            "trail_t2_l1_sl3" => ExitRule::builder(name)
                .stop_loss_atr(3.0)
                .max_holding_bars(30)
                .trailing(2.0, 1.0),
            "static_sl4_tp5_max30" => ExitRule::builder(name)
                .stop_loss_atr(4.0)
                .take_profit_atr(5.0)
                .max_holding_bars(30),
            other => return Err(ExitRuleError::UnknownPreset(other.to_string())),
        };
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop_loss_atr(&self) -> Option<f64> {
        self.stop_loss_atr
    }

    pub fn take_profit_atr(&self) -> Option<f64> {
        self.take_profit_atr
    }

    pub fn max_holding_bars(&self) -> Option<usize> {
        self.max_holding_bars
    }

    pub fn trailing(&self) -> Option<&TrailingStop> {
        self.trailing.as_ref()
    }

    /// True when `bars_held` has reached the holding limit.
    pub fn time_limit_reached(&self, bars_held: usize) -> bool {
        self.max_holding_bars.is_some_and(|max| bars_held >= max)
    }

    /// Same rule under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Result<ExitRule, ExitRuleError> {
        let mut config = ExitRuleConfig::from(self.clone());
        config.name = name.into();
        ExitRule::try_from(config)
    }
}
