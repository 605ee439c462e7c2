//! Parameter sweep over exit-rule grids.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashMap;

use exitlab_core::exit_rules::{ExitRule, TrailingStop};

use crate::config::BacktestConfig;
use crate::runner::{BacktestResult, MarketData, Runner};

/// Exit-rule parameter grid. `None` entries disable that component.
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    pub stop_loss_atr: Vec<Option<f64>>,
    pub take_profit_atr: Vec<Option<f64>>,
    pub max_holding_bars: Vec<Option<usize>>,
    pub trailing: Vec<Option<TrailingStop>>,
}

impl ParamGrid {
    /// Stops 2–5 ATR, targets off/3/5 ATR, holding off/15/30 bars, trailing off.
    pub fn static_default() -> Self {
        Self {
            stop_loss_atr: vec![Some(2.0), Some(3.0), Some(4.0), Some(5.0)],
            take_profit_atr: vec![None, Some(3.0), Some(5.0)],
            max_holding_bars: vec![None, Some(15), Some(30)],
            trailing: vec![None],
        }
    }

    /// Returns the total number of rules in this grid. Empty axes count as a
    /// single disabled value.
    pub fn size(&self) -> usize {
        axis_len(&self.stop_loss_atr)
            * axis_len(&self.take_profit_atr)
            * axis_len(&self.max_holding_bars)
            * axis_len(&self.trailing)
    }

    /// Every rule in the grid, stop-loss axis outermost.
    pub fn generate_rules(&self) -> Result<Vec<ExitRule>> {
        let mut rules = Vec::with_capacity(self.size());
        for &sl in &axis(&self.stop_loss_atr) {
            for &tp in &axis(&self.take_profit_atr) {
                for &max in &axis(&self.max_holding_bars) {
                    for &trail in &axis(&self.trailing) {
                        let name = rule_name(sl, tp, max, trail);
                        let mut builder = ExitRule::builder(name.clone());
                        if let Some(sl) = sl {
                            builder = builder.stop_loss_atr(sl);
                        }
                        if let Some(tp) = tp {
                            builder = builder.take_profit_atr(tp);
                        }
                        if let Some(max) = max {
                            builder = builder.max_holding_bars(max);
                        }
                        if let Some(t) = trail {
                            builder = builder.trailing(t.trigger_atr, t.lock_atr);
                        }
                        rules.push(builder.build().with_context(|| format!("grid rule {name}"))?);
                    }
                }
            }
        }
        Ok(rules)
    }
}

fn axis_len<T>(values: &[Option<T>]) -> usize {
    values.len().max(1)
}

fn axis<T: Copy>(values: &[Option<T>]) -> Vec<Option<T>> {
    if values.is_empty() {
        vec![None]
    } else {
        values.to_vec()
    }
}

fn rule_name(
    sl: Option<f64>,
    tp: Option<f64>,
    max: Option<usize>,
    trail: Option<TrailingStop>,
) -> String {
    let mut parts = Vec::new();
    if let Some(t) = trail {
        parts.push(format!("trail_t{}_l{}", t.trigger_atr, t.lock_atr));
    }
    parts.push(sl.map_or("nosl".into(), |v| format!("sl{v}")));
    parts.push(tp.map_or("notp".into(), |v| format!("tp{v}")));
    parts.push(max.map_or("nomax".into(), |v| format!("max{v}")));
    parts.join("_")
}

/// Parameter sweep executor.
///
/// Runs one full simulation per grid rule, optionally in parallel. Results
/// come back in grid order either way.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn sweep(
        &self,
        grid: &ParamGrid,
        config: &BacktestConfig,
        data: &MarketData,
    ) -> Result<SweepResults> {
        self.sweep_with_progress(grid, config, data, |_, _, _| {})
    }

    /// Executes a sweep with progress reporting.
    ///
    /// The callback is invoked after each backtest completes with:
    /// - Grid index (0-based)
    /// - Total number of rules
    /// - The completed result
    pub fn sweep_with_progress<F>(
        &self,
        grid: &ParamGrid,
        config: &BacktestConfig,
        data: &MarketData,
        progress_callback: F,
    ) -> Result<SweepResults>
    where
        F: Fn(usize, usize, &BacktestResult) + Send + Sync,
    {
        let rules = grid.generate_rules()?;
        let runner = Runner::new(config, data).context("preparing sweep runner")?;
        let total = rules.len();
        tracing::info!(total, parallel = self.parallel, "starting sweep");

        let run_one = |(idx, rule): (usize, &ExitRule)| -> Result<BacktestResult> {
            let result = runner
                .run_rule(rule)
                .with_context(|| format!("sweep rule {}", rule.name()))?;
            progress_callback(idx, total, &result);
            Ok(result)
        };

        let results: Vec<BacktestResult> = if self.parallel {
            rules
                .par_iter()
                .enumerate()
                .map(run_one)
                .collect::<Result<Vec<_>>>()?
        } else {
            rules
                .iter()
                .enumerate()
                .map(run_one)
                .collect::<Result<Vec<_>>>()?
        };

        Ok(SweepResults::new(results))
    }
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(results: Vec<BacktestResult>) -> Self {
        let by_run_id = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();

        Self {
            results,
            by_run_id,
        }
    }

    /// Returns all results as a slice.
    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Gets a result by RunId.
    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.by_run_id.get(run_id).map(|&i| &self.results[i])
    }

    /// Results sorted descending by a [`to_metric_map`] key. Results missing
    /// the key sort last.
    ///
    /// [`to_metric_map`]: crate::metrics::PerformanceStats::to_metric_map
    pub fn sorted_by(&self, metric: &str) -> Vec<&BacktestResult> {
        let mut keyed: Vec<(f64, &BacktestResult)> = self
            .results
            .iter()
            .map(|r| {
                let value = r
                    .stats
                    .to_metric_map()
                    .get(metric)
                    .copied()
                    .filter(|v| !v.is_nan())
                    .unwrap_or(f64::NEG_INFINITY);
                (value, r)
            })
            .collect();
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
        keyed.into_iter().map(|(_, r)| r).collect()
    }

    pub fn top_n(&self, metric: &str, n: usize) -> Vec<&BacktestResult> {
        self.sorted_by(metric).into_iter().take(n).collect()
    }

    /// Highest Sharpe ratio.
    pub fn best(&self) -> Option<&BacktestResult> {
        self.sorted_by("sharpe").into_iter().next()
    }
}
