//! Strength-routed bar walk.
//!
//! Same state machine as [`simulate`](super::simulate); only the rule bound at
//! entry differs, chosen from a [`StrengthRules`] table by the entry bar's
//! label. Unlabeled entries use the Medium rule.

use chrono::{DateTime, Utc};

use super::input::{check_len, SimulationError, SimulationInput};
use super::simulator::{run_bar_walk, RuleSelector};
use super::state::{SimConfig, SimulationResult};
use crate::domain::{Bar, SignalStrength};
use crate::exit_rules::{ExitRule, StrengthRules};

/// Selector that routes each entry through a strength table.
#[derive(Debug, Clone, Copy)]
pub struct StrengthRouted<'a> {
    labels: &'a [Option<SignalStrength>],
    rules: &'a StrengthRules,
}

impl<'a> StrengthRouted<'a> {
    pub fn new(labels: &'a [Option<SignalStrength>], rules: &'a StrengthRules) -> Self {
        Self { labels, rules }
    }
}

impl RuleSelector for StrengthRouted<'_> {
    fn select(&self, bar_index: usize) -> (&ExitRule, Option<SignalStrength>) {
        let label = self.labels.get(bar_index).copied().flatten();
        let (rule, strength) = self.rules.for_entry(label);
        (rule, Some(strength))
    }
}

/// Run the bar walk with per-entry rules chosen by strength label.
///
/// `labels` is aligned one-to-one with bars; only entries on labelled bars are
/// routed by label, the rest take the Medium fallback.
pub fn simulate_dynamic(
    input: &SimulationInput<'_>,
    labels: &[Option<SignalStrength>],
    rules: &StrengthRules,
    config: &SimConfig,
) -> Result<SimulationResult, SimulationError> {
    check_len("strength_labels", input.len(), labels.len())?;
    run_bar_walk(input, &StrengthRouted::new(labels, rules), config)
}

/// Spread (entry time, label) pairs onto a per-bar label series.
///
/// Labels whose timestamp matches no bar are dropped with a debug log.
pub fn align_strength_labels(
    bars: &[Bar],
    entries: &[(DateTime<Utc>, SignalStrength)],
) -> Vec<Option<SignalStrength>> {
    let mut labels = vec![None; bars.len()];
    for &(time, strength) in entries {
        match bars.binary_search_by(|bar| bar.timestamp.cmp(&time)) {
            Ok(index) => labels[index] = Some(strength),
            Err(_) => tracing::debug!(%time, %strength, "strength label matches no bar"),
        }
    }
    labels
}
