//! Aggregate view of a batch of replayed exit outcomes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use exitlab_core::path::{ReplayExitReason, ReplayOutcome};

use crate::metrics::{mean_f64, median, std_dev};

/// MAE (in ATR) below which a trade counts as a tail loss.
pub const TAIL_LOSS_MAE_ATR: f64 = -2.0;

/// Capture-ratio thresholds reported by [`ReplaySummary`].
pub const CAPTURE_THRESHOLDS: [f64; 3] = [0.3, 0.5, 0.7];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub rule_name: Option<String>,
    pub trade_count: usize,
    pub win_rate: f64,
    pub mean_pnl: f64,
    pub median_pnl: f64,
    pub std_pnl: f64,
    pub mean_mfe: f64,
    pub mean_mae: f64,
    pub mean_capture: f64,
    pub median_capture: f64,
    /// Fraction of trades with capture ratio above each of [`CAPTURE_THRESHOLDS`].
    pub capture_above: [f64; 3],
    pub mean_holding_steps: f64,
    pub median_holding_steps: f64,
    pub tail_loss_rate: f64,
    pub exit_counts: BTreeMap<ReplayExitReason, usize>,
}

impl ReplaySummary {
    pub fn from_outcomes(outcomes: &[ReplayOutcome]) -> Self {
        let pnl: Vec<f64> = outcomes.iter().map(|o| o.pnl).collect();
        let capture: Vec<f64> = outcomes.iter().map(|o| o.capture_ratio).collect();
        let holding: Vec<f64> = outcomes.iter().map(|o| o.exit_step as f64).collect();

        let mut exit_counts: BTreeMap<ReplayExitReason, usize> =
            ReplayExitReason::ALL.iter().map(|&r| (r, 0)).collect();
        for outcome in outcomes {
            *exit_counts.entry(outcome.reason).or_default() += 1;
        }

        // A summary names its rule only when every outcome shares it.
        let rule_name = outcomes.first().map(|o| o.rule_name.clone()).filter(|name| {
            outcomes.iter().all(|o| &o.rule_name == name)
        });

        Self {
            rule_name,
            trade_count: outcomes.len(),
            win_rate: fraction(outcomes, |o| o.pnl > 0.0),
            mean_pnl: mean_f64(&pnl),
            median_pnl: median(&pnl),
            std_pnl: std_dev(&pnl),
            mean_mfe: mean_f64(&outcomes.iter().map(|o| o.mfe).collect::<Vec<_>>()),
            mean_mae: mean_f64(&outcomes.iter().map(|o| o.mae).collect::<Vec<_>>()),
            mean_capture: mean_f64(&capture),
            median_capture: median(&capture),
            capture_above: CAPTURE_THRESHOLDS
                .map(|threshold| fraction(outcomes, |o| o.capture_ratio > threshold)),
            mean_holding_steps: mean_f64(&holding),
            median_holding_steps: median(&holding),
            tail_loss_rate: fraction(outcomes, |o| o.mae_atr < TAIL_LOSS_MAE_ATR),
            exit_counts,
        }
    }
}

fn fraction(outcomes: &[ReplayOutcome], pred: impl Fn(&ReplayOutcome) -> bool) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    outcomes.iter().filter(|o| pred(o)).count() as f64 / outcomes.len() as f64
}
