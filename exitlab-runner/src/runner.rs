//! Backtest runner: wires together configuration, engine, replay, and statistics.
//!
//! [`Runner`] prepares the ATR series once and then runs any number of exit
//! rules over the same data:
//! - `run_rule()`: one rule through the bar walk.
//! - `run_all()`: every configured rule, in configuration order.
//! - `run_dynamic()`: strength-routed bar walk using the configured table.
//! - `replay()`: record trade paths once, replay every configured rule.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use exitlab_core::domain::{Bar, SignalStrength};
use exitlab_core::engine::{simulate, simulate_dynamic, SimulationError, SimulationInput, SimulationResult};
use exitlab_core::exit_rules::{ExitRule, ExitRuleError, RuleKey};
use exitlab_core::indicators::{rolling_atr, IndicatorError};
use exitlab_core::path::{record_trade_paths, replay_all, replay_by_strength, TradePath};

use crate::bar_size::BarSize;
use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::metrics::PerformanceStats;
use crate::replay_summary::ReplaySummary;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("indicator error: {0}")]
    Indicator(#[from] IndicatorError),
    #[error("exit rule error: {0}")]
    Rule(#[from] ExitRuleError),
    #[error("dynamic run needs strength labels on the market data")]
    MissingStrengthLabels,
}

/// Market data for one instrument, aligned per bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub bars: Vec<Bar>,
    /// Entry signal, already shifted so that `signal[t]` is known at bar t's open.
    pub signal: Vec<bool>,
    /// Precomputed ATR. Computed from `bars` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<Vec<Option<SignalStrength>>>,
}

impl MarketData {
    pub fn new(bars: Vec<Bar>, signal: Vec<bool>) -> Self {
        Self {
            bars,
            signal,
            atr: None,
            strength: None,
        }
    }

    pub fn with_atr(mut self, atr: Vec<f64>) -> Self {
        self.atr = Some(atr);
        self
    }

    pub fn with_strength(mut self, labels: Vec<Option<SignalStrength>>) -> Self {
        self.strength = Some(labels);
        self
    }
}

/// Complete result of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub run_id: RunId,
    /// Rule name, or the strength rule names joined with `/` for dynamic runs.
    pub rule_name: String,
    pub bar_size: BarSize,
    pub stats: PerformanceStats,
    pub simulation: SimulationResult,
}

/// A configuration bound to one data set.
#[derive(Debug, Clone)]
pub struct Runner<'a> {
    config: &'a BacktestConfig,
    data: &'a MarketData,
    atr: Cow<'a, [f64]>,
}

impl<'a> Runner<'a> {
    /// Validate the configuration and prepare ATR.
    pub fn new(config: &'a BacktestConfig, data: &'a MarketData) -> Result<Self, RunError> {
        config.validate()?;
        let atr = match &data.atr {
            Some(atr) => Cow::Borrowed(atr.as_slice()),
            None => {
                tracing::debug!(window = config.atr_window, bars = data.bars.len(), "computing ATR");
                Cow::Owned(rolling_atr(&data.bars, config.atr_window)?)
            }
        };
        Ok(Self { config, data, atr })
    }

    pub fn config(&self) -> &BacktestConfig {
        self.config
    }

    pub fn atr(&self) -> &[f64] {
        &self.atr
    }

    fn input(&self) -> SimulationInput<'_> {
        SimulationInput::new(&self.data.bars, &self.atr, &self.data.signal)
    }

    fn labels(&self) -> Result<&[Option<SignalStrength>], RunError> {
        self.data
            .strength
            .as_deref()
            .ok_or(RunError::MissingStrengthLabels)
    }

    /// Run one rule through the bar walk.
    pub fn run_rule(&self, rule: &ExitRule) -> Result<BacktestResult, RunError> {
        let simulation = simulate(&self.input(), rule, &self.config.sim_config())?;
        let stats = PerformanceStats::compute(&simulation, self.config.bar_size);
        tracing::info!(
            rule = rule.name(),
            trades = stats.trade_count,
            total_return = stats.total_return,
            "run complete"
        );
        Ok(BacktestResult {
            run_id: self.config.rule_run_id(rule)?,
            rule_name: rule.name().to_string(),
            bar_size: self.config.bar_size,
            stats,
            simulation,
        })
    }

    /// Every configured rule, in configuration order.
    pub fn run_all(&self) -> Result<Vec<BacktestResult>, RunError> {
        self.config
            .resolve_rules()?
            .iter()
            .map(|rule| self.run_rule(rule))
            .collect()
    }

    /// The registry's default rule.
    pub fn run_default(&self) -> Result<BacktestResult, RunError> {
        let registry = self.config.registry()?;
        self.run_rule(registry.get(RuleKey::Default)?)
    }

    /// Strength-routed run. Needs a strength table and per-bar labels.
    pub fn run_dynamic(&self) -> Result<BacktestResult, RunError> {
        let rules = self.config.registry()?.strength_rules()?;
        let labels = self.labels()?;
        let simulation = simulate_dynamic(&self.input(), labels, &rules, &self.config.sim_config())?;
        let stats = PerformanceStats::compute(&simulation, self.config.bar_size);
        let rule_name = rules
            .iter()
            .map(|(_, rule)| rule.name())
            .collect::<Vec<_>>()
            .join("/");
        tracing::info!(rules = %rule_name, trades = stats.trade_count, "dynamic run complete");
        Ok(BacktestResult {
            run_id: self.config.run_id()?,
            rule_name,
            bar_size: self.config.bar_size,
            stats,
            simulation,
        })
    }

    /// Record trade paths with the configured recorder settings.
    pub fn record_paths(&self) -> Result<Vec<TradePath>, RunError> {
        let paths = record_trade_paths(&self.input(), self.data.strength.as_deref(), &self.config.path)?;
        tracing::debug!(paths = paths.len(), "trade paths recorded");
        Ok(paths)
    }

    /// Replay every configured rule over one set of recorded paths; a strength
    /// table, if configured, adds one routed summary at the end.
    pub fn replay(&self) -> Result<Vec<ReplaySummary>, RunError> {
        let paths = self.record_paths()?;
        let mut summaries = self
            .config
            .resolve_rules()?
            .iter()
            .map(|rule| ReplaySummary::from_outcomes(&replay_all(&paths, rule)))
            .collect::<Vec<_>>();
        if let Some(table) = &self.config.strength {
            let routed = replay_by_strength(&paths, &table.resolve()?);
            summaries.push(ReplaySummary::from_outcomes(&routed));
        }
        Ok(summaries)
    }
}

/// One-shot convenience: every configured rule over `data`.
pub fn run_backtest(config: &BacktestConfig, data: &MarketData) -> Result<Vec<BacktestResult>, RunError> {
    Runner::new(config, data)?.run_all()
}

/// One-shot convenience: strength-routed run over `data`.
pub fn run_dynamic_backtest(config: &BacktestConfig, data: &MarketData) -> Result<BacktestResult, RunError> {
    Runner::new(config, data)?.run_dynamic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use exitlab_core::synthetic::{random_signals, random_strength_labels, random_walk_bars, WalkParams};

    fn market(n: usize) -> MarketData {
        MarketData::new(random_walk_bars(n, 11, &WalkParams::default()), random_signals(n, 12, 0.05))
    }

    fn config() -> BacktestConfig {
        BacktestConfig {
            presets: vec!["pure_baseline".into(), "trail_t2_l1_sl3".into()],
            ..Default::default()
        }
    }

    #[test]
    fn atr_is_computed_when_absent() {
        let data = market(50);
        let cfg = config();
        let runner = Runner::new(&cfg, &data).unwrap();
        assert_eq!(runner.atr(), rolling_atr(&data.bars, 10).unwrap().as_slice());
    }

    #[test]
    fn supplied_atr_is_used_as_is() {
        let data = market(30).with_atr(vec![1.0; 30]);
        let cfg = config();
        let runner = Runner::new(&cfg, &data).unwrap();
        assert!(runner.atr().iter().all(|&a| a == 1.0));
    }

    #[test]
    fn run_all_follows_config_order() {
        let data = market(300);
        let results = run_backtest(&config(), &data).unwrap();
        let names: Vec<_> = results.iter().map(|r| r.rule_name.as_str()).collect();
        assert_eq!(names, vec!["pure_baseline", "trail_t2_l1_sl3"]);
        assert_ne!(results[0].run_id, results[1].run_id);
        assert_eq!(results[0].simulation.bar_count(), 300);
    }

    #[test]
    fn dynamic_requires_labels() {
        let data = market(100);
        let cfg = BacktestConfig {
            strength: Some(crate::config::StrengthTableConfig {
                preset: Some("ETHUSD".into()),
                ..Default::default()
            }),
            ..config()
        };
        assert!(matches!(
            run_dynamic_backtest(&cfg, &data),
            Err(RunError::MissingStrengthLabels)
        ));

        let labelled = data.with_strength(random_strength_labels(100, 3));
        let result = run_dynamic_backtest(&cfg, &labelled).unwrap();
        assert!(result.rule_name.starts_with("ETH4H_STRONG"));
        assert!(result.simulation.trades.iter().all(|t| t.strength.is_some()));
    }

    #[test]
    fn dynamic_without_table_is_a_rule_error() {
        let data = market(60).with_strength(vec![None; 60]);
        assert!(matches!(
            run_dynamic_backtest(&config(), &data),
            Err(RunError::Rule(ExitRuleError::MissingRule(_)))
        ));
    }

    #[test]
    fn mismatched_signal_fails_before_walking() {
        let mut data = market(40);
        data.signal.pop();
        assert!(matches!(
            run_backtest(&config(), &data),
            Err(RunError::Simulation(SimulationError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn replay_yields_one_summary_per_rule() {
        let data = market(400);
        let cfg = config();
        let summaries = Runner::new(&cfg, &data).unwrap().replay().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].rule_name.as_deref(), Some("pure_baseline"));
        assert_eq!(summaries[0].trade_count, summaries[1].trade_count);
    }
}
