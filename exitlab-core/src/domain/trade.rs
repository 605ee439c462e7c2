//! TradeRecord: a completed round-trip long trade.

use super::strength::SignalStrength;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    TakeProfit,
    TimeLimit,
    NewSignal,
    EndOfData,
}

impl ExitReason {
    pub const ALL: [ExitReason; 6] = [
        ExitReason::StopLoss,
        ExitReason::TrailingStop,
        ExitReason::TakeProfit,
        ExitReason::TimeLimit,
        ExitReason::NewSignal,
        ExitReason::EndOfData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::TimeLimit => "time_limit",
            ExitReason::NewSignal => "new_signal",
            ExitReason::EndOfData => "end_of_data",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete round-trip trade record: entry → exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    /// ATR captured at entry. All stop/target distances are scaled by it.
    pub entry_atr: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Duration ──
    /// `exit_bar - entry_bar`.
    pub bars_held: usize,

    // ── PnL ──
    /// Price move per unit, net of the round-trip cost (`cost * entry_price`).
    pub net_pnl: f64,
    /// `(exit - entry) / entry`, before costs.
    pub gross_pnl_pct: f64,
    /// `gross_pnl_pct - cost`.
    pub net_pnl_pct: f64,

    // ── Rule ──
    pub rule_name: String,
    /// Strength label the rule was selected by (strength-routed runs only).
    pub strength: Option<SignalStrength>,

    // ── Trailing ──
    pub trailing_activated: bool,
    /// Stop level (ATR units of PnL) on the bar trailing first activated.
    pub trailing_activation_sl_atr: Option<f64>,
    /// Stop level (ATR units of PnL) in force when the trade closed. `None`
    /// when the rule had no stop and trailing never activated.
    pub exit_sl_atr: Option<f64>,

    // ── Excursion ──
    /// Best close-based unrealized PnL in ATR units while open.
    pub mfe_atr: f64,
    /// Worst close-based unrealized PnL in ATR units while open.
    pub mae_atr: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl_pct > 0.0
    }

    /// Net PnL expressed in entry-ATR units.
    pub fn net_pnl_atr(&self) -> f64 {
        if self.entry_atr <= 0.0 {
            return 0.0;
        }
        self.net_pnl / self.entry_atr
    }
}
