//! Per-trade exit-rule replay over recorded paths.
//!
//! Applies an [`ExitRule`] to a recorded [`TradePath`] without touching
//! prices: trailing update, then stop/trailing → take profit → time limit,
//! all on the recorded close-based `pnl_atr`. Excursions are measured over the
//! whole recorded path so the outcome shows what was left on the table.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::recorder::TradePath;
use crate::domain::{SignalStrength, TrailingState};
use crate::exit_rules::{ExitRule, StrengthRules};

/// Why a replayed trade ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplayExitReason {
    StopLoss,
    TrailingStop,
    TakeProfit,
    TimeLimit,
    /// No condition fired before the recorded path ran out.
    RanToEnd,
}

impl ReplayExitReason {
    pub const ALL: [ReplayExitReason; 5] = [
        ReplayExitReason::StopLoss,
        ReplayExitReason::TrailingStop,
        ReplayExitReason::TakeProfit,
        ReplayExitReason::TimeLimit,
        ReplayExitReason::RanToEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplayExitReason::StopLoss => "stop_loss",
            ReplayExitReason::TrailingStop => "trailing_stop",
            ReplayExitReason::TakeProfit => "take_profit",
            ReplayExitReason::TimeLimit => "time_limit",
            ReplayExitReason::RanToEnd => "ran_to_end",
        }
    }
}

impl fmt::Display for ReplayExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayOutcome {
    pub trade_id: usize,
    pub rule_name: String,
    pub strength: Option<SignalStrength>,
    /// Step the replayed exit happened on (0 for an empty path).
    pub exit_step: usize,
    /// Realized return at the exit step.
    pub pnl: f64,
    pub pnl_atr: f64,
    pub mfe: f64,
    pub mae: f64,
    pub mfe_atr: f64,
    pub mae_atr: f64,
    /// `pnl / mfe`, or 0 when `mfe <= 0`.
    pub capture_ratio: f64,
    pub reason: ReplayExitReason,
}

/// Replay one rule over one recorded path.
pub fn replay_exit_rule(path: &TradePath, rule: &ExitRule) -> ReplayOutcome {
    let (mfe, mae, mfe_atr, mae_atr) = excursions(path);

    let mut trailing = TrailingState::new(rule.stop_loss_atr());
    let mut exit = None;
    for s in &path.steps {
        trailing.observe(s.pnl_atr, rule.trailing());

        let reason = if s.pnl_atr <= trailing.current_sl_atr() {
            Some(if trailing.is_active() {
                ReplayExitReason::TrailingStop
            } else {
                ReplayExitReason::StopLoss
            })
        } else if rule.take_profit_atr().is_some_and(|tp| s.pnl_atr >= tp) {
            Some(ReplayExitReason::TakeProfit)
        } else if rule.time_limit_reached(s.step) {
            Some(ReplayExitReason::TimeLimit)
        } else {
            None
        };

        if let Some(reason) = reason {
            exit = Some((s, reason));
            break;
        }
    }

    let (exit_step, pnl, pnl_atr, reason) = match (exit, path.steps.last()) {
        (Some((s, reason)), _) => (s.step, s.pnl, s.pnl_atr, reason),
        (None, Some(last)) => (last.step, last.pnl, last.pnl_atr, ReplayExitReason::RanToEnd),
        (None, None) => (0, 0.0, 0.0, ReplayExitReason::RanToEnd),
    };

    ReplayOutcome {
        trade_id: path.trade_id,
        rule_name: rule.name().to_string(),
        strength: path.strength,
        exit_step,
        pnl,
        pnl_atr,
        mfe,
        mae,
        mfe_atr,
        mae_atr,
        capture_ratio: if mfe > 0.0 { pnl / mfe } else { 0.0 },
        reason,
    }
}

/// Replay one rule across every path, in path order.
pub fn replay_all(paths: &[TradePath], rule: &ExitRule) -> Vec<ReplayOutcome> {
    paths.iter().map(|p| replay_exit_rule(p, rule)).collect()
}

/// Replay each path under the rule for its entry strength label.
pub fn replay_by_strength(paths: &[TradePath], rules: &StrengthRules) -> Vec<ReplayOutcome> {
    paths
        .iter()
        .map(|p| {
            let (rule, strength) = rules.for_entry(p.strength);
            let mut outcome = replay_exit_rule(p, rule);
            outcome.strength = Some(strength);
            outcome
        })
        .collect()
}

// (mfe, mae, mfe_atr, mae_atr) over the full path; zeros when empty.
fn excursions(path: &TradePath) -> (f64, f64, f64, f64) {
    if path.steps.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    path.steps.iter().fold(
        (
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
        ),
        |(mfe, mae, mfe_atr, mae_atr), s| {
            (
                mfe.max(s.pnl),
                mae.min(s.pnl),
                mfe_atr.max(s.pnl_atr),
                mae_atr.min(s.pnl_atr),
            )
        },
    )
}
