//! Exit-condition evaluation for one open position on one bar.
//!
//! Priority, first match wins:
//! 1. trailing stop (if active, close-based) else static stop (bar low)
//! 2. take profit (bar high)
//! 3. holding limit
//! 4. new entry signal while open
//!
//! Stops and targets fill exactly at their level. A trailing exit is
//! detected on the close but fills at the locked stop price (floored at the
//! bar low), not at the close. Intrabar high/low are assumed visible for
//! detection; a bar that touches both stop and target resolves to the stop.

use crate::domain::{Bar, ExitReason, OpenPosition};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitDecision {
    pub reason: ExitReason,
    pub price: f64,
}

/// Decide whether `pos` closes on `bar`.
///
/// `pnl_atr` must already reflect this bar's close (trailing state updated).
pub fn evaluate_exit(
    pos: &OpenPosition<'_>,
    bar: &Bar,
    pnl_atr: f64,
    bars_held: usize,
    signal: bool,
) -> Option<ExitDecision> {
    if pos.trailing.is_active() {
        if pnl_atr <= pos.trailing.current_sl_atr() {
            return Some(ExitDecision {
                reason: ExitReason::TrailingStop,
                price: bar.low.max(pos.trailing_stop_price()),
            });
        }
    } else if let Some(sl_price) = pos.sl_price {
        if bar.low <= sl_price {
            return Some(ExitDecision {
                reason: ExitReason::StopLoss,
                price: sl_price,
            });
        }
    }

    if let Some(tp_price) = pos.tp_price {
        if bar.high >= tp_price {
            return Some(ExitDecision {
                reason: ExitReason::TakeProfit,
                price: tp_price,
            });
        }
    }

    if pos.rule.time_limit_reached(bars_held) {
        return Some(ExitDecision {
            reason: ExitReason::TimeLimit,
            price: bar.close,
        });
    }

    if signal {
        return Some(ExitDecision {
            reason: ExitReason::NewSignal,
            price: bar.close,
        });
    }

    None
}
