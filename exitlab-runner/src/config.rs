//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! bar_size = "4h"
//! transaction_cost = 0.0007
//! presets = ["trail_t2_l1_sl3"]
//!
//! [[exit_rules]]
//! name = "tight"
//! stop_loss_atr = 1.5
//! max_holding_bars = 12
//!
//! [strength]
//! preset = "BTCUSD"
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use exitlab_core::engine::{SimConfig, SimulationError, DEFAULT_INITIAL_EQUITY, DEFAULT_TRANSACTION_COST};
use exitlab_core::exit_rules::{ExitRule, ExitRuleError, RuleKey, RuleRegistry, StrengthRules};
use exitlab_core::indicators::DEFAULT_ATR_WINDOW;
use exitlab_core::path::PathConfig;

use crate::bar_size::BarSize;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(String),
    #[error(transparent)]
    Rule(#[from] ExitRuleError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("atr_window must be >= 1")]
    ZeroAtrWindow,
    #[error("no exit rules configured")]
    NoRules,
    #[error("duplicate exit rule name: {0}")]
    DuplicateRule(String),
    #[error("strength table has no preset and no '{0}' rule")]
    IncompleteStrength(&'static str),
}

/// Per-strength rule table: a symbol preset, explicit rules, or a preset with
/// individual levels overridden.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrengthTableConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong: Option<ExitRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<ExitRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weak: Option<ExitRule>,
}

impl StrengthTableConfig {
    pub fn resolve(&self) -> Result<StrengthRules, ConfigError> {
        let base = self.preset.as_deref().map(StrengthRules::preset).transpose()?;
        let pick = |explicit: &Option<ExitRule>,
                    from_preset: Option<&ExitRule>,
                    level: &'static str| {
            explicit
                .clone()
                .or_else(|| from_preset.cloned())
                .ok_or(ConfigError::IncompleteStrength(level))
        };
        Ok(StrengthRules::new(
            pick(&self.strong, base.as_ref().map(|b| &b.strong), "strong")?,
            pick(&self.medium, base.as_ref().map(|b| &b.medium), "medium")?,
            pick(&self.weak, base.as_ref().map(|b| &b.weak), "weak")?,
        ))
    }
}

/// Everything needed to reproduce a run, minus the market data itself.
///
/// Field order matters for TOML output: plain values before tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub bar_size: BarSize,
    #[serde(default = "default_transaction_cost")]
    pub transaction_cost: f64,
    #[serde(default = "default_initial_equity")]
    pub initial_equity: f64,
    #[serde(default = "default_atr_window")]
    pub atr_window: usize,
    /// Named rules from [`ExitRule::PRESETS`], run before `exit_rules`.
    #[serde(default)]
    pub presets: Vec<String>,
    #[serde(default)]
    pub exit_rules: Vec<ExitRule>,
    #[serde(default)]
    pub path: PathConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<StrengthTableConfig>,
}

fn default_transaction_cost() -> f64 {
    DEFAULT_TRANSACTION_COST
}

fn default_initial_equity() -> f64 {
    DEFAULT_INITIAL_EQUITY
}

fn default_atr_window() -> usize {
    DEFAULT_ATR_WINDOW
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            bar_size: BarSize::default(),
            transaction_cost: DEFAULT_TRANSACTION_COST,
            initial_equity: DEFAULT_INITIAL_EQUITY,
            atr_window: DEFAULT_ATR_WINDOW,
            presets: Vec::new(),
            exit_rules: Vec::new(),
            path: PathConfig::default(),
            strength: None,
        }
    }
}

impl BacktestConfig {
    /// Parse and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sim_config().validate()?;
        if self.atr_window == 0 {
            return Err(ConfigError::ZeroAtrWindow);
        }
        self.resolve_rules()?;
        if let Some(table) = &self.strength {
            table.resolve()?;
        }
        Ok(())
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig::new(self.transaction_cost, self.initial_equity)
    }

    /// Presets followed by explicit rules. Names must be unique.
    pub fn resolve_rules(&self) -> Result<Vec<ExitRule>, ConfigError> {
        let mut rules = self
            .presets
            .iter()
            .map(|name| ExitRule::preset(name))
            .collect::<Result<Vec<_>, _>>()?;
        rules.extend(self.exit_rules.iter().cloned());

        let mut seen = BTreeSet::new();
        for rule in &rules {
            if !seen.insert(rule.name()) {
                return Err(ConfigError::DuplicateRule(rule.name().to_string()));
            }
        }
        Ok(rules)
    }

    /// Registry for a run: the first resolved rule under [`RuleKey::Default`],
    /// plus the strength table when one is configured.
    pub fn registry(&self) -> Result<RuleRegistry, ConfigError> {
        let mut registry = match &self.strength {
            Some(table) => RuleRegistry::from(table.resolve()?),
            None => RuleRegistry::new(),
        };
        if let Some(first) = self.resolve_rules()?.into_iter().next() {
            registry.insert(RuleKey::Default, first);
        }
        if registry.is_empty() {
            return Err(ConfigError::NoRules);
        }
        Ok(registry)
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs over the same data share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        hash_json(self)
    }

    /// RunId of one rule evaluated under this configuration.
    pub fn rule_run_id(&self, rule: &ExitRule) -> Result<RunId, ConfigError> {
        hash_json(&(self, rule))
    }
}

fn hash_json<T: Serialize + ?Sized>(value: &T) -> Result<RunId, ConfigError> {
    let json = serde_json::to_string(value).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}
