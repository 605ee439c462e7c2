//! Performance statistics: pure functions over an equity curve and a trade ledger.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar out.
//! Empty inputs produce neutral zeros, never NaN.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exitlab_core::domain::{ExitReason, SignalStrength, TradeRecord};
use exitlab_core::engine::SimulationResult;

use crate::bar_size::{BarSize, DAYS_PER_YEAR};

const SECONDS_PER_YEAR: f64 = DAYS_PER_YEAR * 86_400.0;

/// Per-strength slice of the trade ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthBreakdown {
    pub strength: SignalStrength,
    pub trade_count: usize,
    pub win_rate: f64,
    pub avg_net_pnl_pct: f64,
}

/// Aggregate statistics for a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe: f64,
    /// Non-positive fraction, e.g. -0.15 for a 15% drawdown.
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub win_rate: f64,
    /// `f64::INFINITY` when there are winners and no losers.
    pub profit_factor: f64,
    pub avg_net_pnl_pct: f64,
    pub avg_winner_pct: f64,
    pub avg_loser_pct: f64,
    pub trailing_activation_rate: f64,
    pub exit_counts: BTreeMap<ExitReason, usize>,
    /// Empty unless at least one trade carries a strength label.
    pub by_strength: Vec<StrengthBreakdown>,
}

impl PerformanceStats {
    pub fn compute(result: &SimulationResult, bar_size: BarSize) -> Self {
        Self::compute_from_parts(
            result.initial_equity,
            &result.equity_curve,
            &result.timestamps,
            &result.trades,
            bar_size,
        )
    }

    /// Statistics from raw slices. `timestamps` must align with `equity_curve`.
    pub fn compute_from_parts(
        initial_equity: f64,
        equity_curve: &[f64],
        timestamps: &[DateTime<Utc>],
        trades: &[TradeRecord],
        bar_size: BarSize,
    ) -> Self {
        let final_equity = equity_curve.last().copied().unwrap_or(initial_equity);
        let annualized_return = annualized_return(
            initial_equity,
            final_equity,
            timestamps.first().zip(timestamps.last()),
        );
        let annualized_volatility = annualized_volatility(equity_curve, bar_size);

        Self {
            total_return: total_return(initial_equity, final_equity),
            annualized_return,
            annualized_volatility,
            sharpe: sharpe_ratio(annualized_return, annualized_volatility),
            max_drawdown: max_drawdown(equity_curve),
            trade_count: trades.len(),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            avg_net_pnl_pct: mean_f64(&net_pnls(trades.iter())),
            avg_winner_pct: mean_f64(&net_pnls(trades.iter().filter(|t| t.is_winner()))),
            avg_loser_pct: mean_f64(&net_pnls(trades.iter().filter(|t| !t.is_winner()))),
            trailing_activation_rate: trailing_activation_rate(trades),
            exit_counts: exit_counts(trades),
            by_strength: strength_breakdown(trades),
        }
    }

    /// Flat `name → value` view, for tabular export and sweep comparison.
    pub fn to_metric_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("total_return".into(), self.total_return);
        map.insert("annualized_return".into(), self.annualized_return);
        map.insert("annualized_volatility".into(), self.annualized_volatility);
        map.insert("sharpe".into(), self.sharpe);
        map.insert("max_drawdown".into(), self.max_drawdown);
        map.insert("trade_count".into(), self.trade_count as f64);
        map.insert("win_rate".into(), self.win_rate);
        map.insert("profit_factor".into(), self.profit_factor);
        map.insert("avg_net_pnl_pct".into(), self.avg_net_pnl_pct);
        map.insert("avg_winner_pct".into(), self.avg_winner_pct);
        map.insert("avg_loser_pct".into(), self.avg_loser_pct);
        map.insert("trailing_activation_rate".into(), self.trailing_activation_rate);
        for (reason, count) in &self.exit_counts {
            map.insert(format!("exits.{}", reason.as_str()), *count as f64);
        }
        for slice in &self.by_strength {
            let key = slice.strength.as_str();
            map.insert(format!("{key}.trade_count"), slice.trade_count as f64);
            map.insert(format!("{key}.win_rate"), slice.win_rate);
            map.insert(format!("{key}.avg_net_pnl_pct"), slice.avg_net_pnl_pct);
        }
        map
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: final / initial − 1.
pub fn total_return(initial_equity: f64, final_equity: f64) -> f64 {
    if initial_equity <= 0.0 {
        return 0.0;
    }
    final_equity / initial_equity - 1.0
}

/// Geometric annual growth over the elapsed wall-clock span.
///
/// Uses timestamps rather than bar count so gaps in the data do not stretch
/// or compress the year. Returns 0.0 for a zero-length span.
pub fn annualized_return(
    initial_equity: f64,
    final_equity: f64,
    span: Option<(&DateTime<Utc>, &DateTime<Utc>)>,
) -> f64 {
    let Some((first, last)) = span else {
        return 0.0;
    };
    let years = (*last - *first).num_seconds() as f64 / SECONDS_PER_YEAR;
    if years <= 0.0 || initial_equity <= 0.0 {
        return 0.0;
    }
    let growth = final_equity / initial_equity;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(1.0 / years) - 1.0
}

/// Sample std of bar-to-bar equity returns, scaled by sqrt(bars per year).
pub fn annualized_volatility(equity_curve: &[f64], bar_size: BarSize) -> f64 {
    std_dev(&bar_returns(equity_curve)) * bar_size.bars_per_year().sqrt()
}

/// Annualized return over annualized volatility; 0.0 when volatility is zero.
pub fn sharpe_ratio(annualized_return: f64, annualized_volatility: f64) -> f64 {
    if annualized_volatility < 1e-15 {
        return 0.0;
    }
    annualized_return / annualized_volatility
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Win rate: fraction of trades with positive net pnl.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Sum of winning net pnl over the absolute sum of the rest.
///
/// Infinite when nothing lost and something won; 0.0 with no trades.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.is_winner())
        .map(|t| t.net_pnl_pct)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| !t.is_winner())
        .map(|t| t.net_pnl_pct.abs())
        .sum();

    if gross_loss < 1e-15 {
        return if gross_profit > 0.0 { f64::INFINITY } else { 0.0 };
    }
    gross_profit / gross_loss
}

/// Fraction of trades whose trailing stop engaged.
pub fn trailing_activation_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let activated = trades.iter().filter(|t| t.trailing_activated).count();
    activated as f64 / trades.len() as f64
}

/// Count per exit reason. Every reason is present, zero or not.
pub fn exit_counts(trades: &[TradeRecord]) -> BTreeMap<ExitReason, usize> {
    let mut counts: BTreeMap<ExitReason, usize> =
        ExitReason::ALL.iter().map(|&r| (r, 0)).collect();
    for trade in trades {
        *counts.entry(trade.exit_reason).or_default() += 1;
    }
    counts
}

pub fn strength_breakdown(trades: &[TradeRecord]) -> Vec<StrengthBreakdown> {
    if trades.iter().all(|t| t.strength.is_none()) {
        return Vec::new();
    }
    SignalStrength::ALL
        .iter()
        .map(|&strength| {
            let slice: Vec<f64> = net_pnls(trades.iter().filter(|t| t.strength == Some(strength)));
            let winners = slice.iter().filter(|&&p| p > 0.0).count();
            StrengthBreakdown {
                strength,
                trade_count: slice.len(),
                win_rate: if slice.is_empty() {
                    0.0
                } else {
                    winners as f64 / slice.len() as f64
                },
                avg_net_pnl_pct: mean_f64(&slice),
            }
        })
        .collect()
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Bar-to-bar fractional change of an equity curve.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

fn net_pnls<'a>(trades: impl Iterator<Item = &'a TradeRecord>) -> Vec<f64> {
    trades.map(|t| t.net_pnl_pct).collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1); 0.0 below two values.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
