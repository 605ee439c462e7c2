//! Single-position bar walk: the heart of the engine.
//!
//! Per bar `t`, in order:
//! 1. If open: update excursions and trailing state from `close[t]`, then
//!    evaluate exits (see [`super::exits`]). A close realizes PnL into equity.
//! 2. If flat, no exit happened on this bar, `signal[t]` is set and ATR[t] is
//!    usable: open at `open[t]` with the rule chosen by the selector.
//! 3. Record realized equity for bar `t`.
//!
//! A position still open after the last bar is closed at the final close
//! with [`ExitReason::EndOfData`].

use chrono::{DateTime, Utc};

use super::exits::{evaluate_exit, ExitDecision};
use super::input::{SimulationError, SimulationInput};
use super::state::{SimConfig, SimulationResult};
use crate::domain::{ExitReason, OpenPosition, PositionState, SignalStrength, TradeRecord};
use crate::exit_rules::ExitRule;

/// Chooses the exit rule bound to a new position.
pub trait RuleSelector {
    /// Rule and strength label for an entry at `bar_index`.
    fn select(&self, bar_index: usize) -> (&ExitRule, Option<SignalStrength>);
}

impl RuleSelector for ExitRule {
    fn select(&self, _bar_index: usize) -> (&ExitRule, Option<SignalStrength>) {
        (self, None)
    }
}

/// Run the bar walk with one global exit rule.
pub fn simulate(
    input: &SimulationInput<'_>,
    rule: &ExitRule,
    config: &SimConfig,
) -> Result<SimulationResult, SimulationError> {
    run_bar_walk(input, rule, config)
}

/// Run the bar walk, asking `selector` for the rule at every entry.
pub fn run_bar_walk<S: RuleSelector + ?Sized>(
    input: &SimulationInput<'_>,
    selector: &S,
    config: &SimConfig,
) -> Result<SimulationResult, SimulationError> {
    input.validate()?;
    config.validate()?;

    let n = input.len();
    let mut state = PositionState::Flat;
    let mut equity = config.initial_equity;
    let mut equity_curve = Vec::with_capacity(n);
    let mut trades = Vec::new();
    let mut skipped_entries = 0usize;

    for (t, bar) in input.bars.iter().enumerate() {
        // ─── Exit check ───
        let decision = match &mut state {
            PositionState::Open(pos) => {
                let pnl_atr = pos.observe_close(bar.close);
                evaluate_exit(pos, bar, pnl_atr, pos.bars_held(t), input.signal[t])
            }
            PositionState::Flat => None,
        };

        let mut exited = false;
        if let Some(decision) = decision {
            if let Some(pos) = state.take() {
                let trade = close_position(pos, t, bar.timestamp, decision, config);
                equity *= 1.0 + trade.net_pnl_pct;
                trades.push(trade);
                exited = true;
            }
        }

        // ─── Entry check ───
        // No re-entry on an exit bar, and nothing opens on the final bar.
        if state.is_flat() && !exited && input.signal[t] && t + 1 < n {
            match input.entry_atr(t) {
                Some(atr) => {
                    let (rule, strength) = selector.select(t);
                    state = PositionState::Open(OpenPosition::open(t, bar, atr, rule, strength));
                }
                None => {
                    skipped_entries += 1;
                    tracing::debug!(bar = t, atr = input.atr[t], "entry skipped: ATR not usable");
                }
            }
        }

        equity_curve.push(equity);
    }

    // ─── End of data ───
    if let (Some(pos), Some(last)) = (state.take(), input.bars.last()) {
        let decision = ExitDecision {
            reason: ExitReason::EndOfData,
            price: last.close,
        };
        let trade = close_position(pos, n - 1, last.timestamp, decision, config);
        equity *= 1.0 + trade.net_pnl_pct;
        trades.push(trade);
        if let Some(final_point) = equity_curve.last_mut() {
            *final_point = equity;
        }
    }

    tracing::debug!(
        bars = n,
        trades = trades.len(),
        skipped_entries,
        final_equity = equity,
        "bar walk complete"
    );

    Ok(SimulationResult {
        trades,
        equity_curve,
        timestamps: input.bars.iter().map(|b| b.timestamp).collect(),
        initial_equity: config.initial_equity,
    })
}

/// Convert an open position into its trade record.
fn close_position(
    pos: OpenPosition<'_>,
    exit_bar: usize,
    exit_time: DateTime<Utc>,
    decision: ExitDecision,
    config: &SimConfig,
) -> TradeRecord {
    let gross = decision.price - pos.entry_price;
    let gross_pnl_pct = gross / pos.entry_price;
    let net_pnl = gross - config.transaction_cost * pos.entry_price;
    let exit_sl_atr = Some(pos.trailing.current_sl_atr()).filter(|v| v.is_finite());

    TradeRecord {
        entry_bar: pos.entry_bar,
        entry_time: pos.entry_time,
        entry_price: pos.entry_price,
        entry_atr: pos.entry_atr,
        exit_bar,
        exit_time,
        exit_price: decision.price,
        exit_reason: decision.reason,
        bars_held: pos.bars_held(exit_bar),
        net_pnl,
        gross_pnl_pct,
        net_pnl_pct: gross_pnl_pct - config.transaction_cost,
        rule_name: pos.rule.name().to_string(),
        strength: pos.strength,
        trailing_activated: pos.trailing.is_active(),
        trailing_activation_sl_atr: pos.trailing.activation_sl_atr(),
        exit_sl_atr,
        mfe_atr: pos.mfe_atr,
        mae_atr: pos.mae_atr,
    }
}
