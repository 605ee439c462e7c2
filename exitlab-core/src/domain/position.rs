//! Position state for the single-position bar walk.
//!
//! At most one position exists at a time. The state machine is the enum
//! [`PositionState`]; an open position owns its entry snapshot (price, ATR,
//! bound exit rule) and the mutable trailing/excursion state.

use chrono::{DateTime, Utc};

use super::bar::Bar;
use super::strength::SignalStrength;
use crate::exit_rules::{ExitRule, TrailingStop};

/// Trailing-stop state, in ATR units of PnL.
///
/// **Ratchet rule:** once active, the stop level may only rise, never loosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingState {
    active: bool,
    current_sl_atr: f64,
    activation_sl_atr: Option<f64>,
}

impl TrailingState {
    /// Inactive trailing state whose stop starts at `-stop_loss_atr`
    /// (`-inf` when the rule has no static stop).
    pub fn new(stop_loss_atr: Option<f64>) -> Self {
        Self {
            active: false,
            current_sl_atr: stop_loss_atr.map_or(f64::NEG_INFINITY, |sl| -sl),
            activation_sl_atr: None,
        }
    }

    /// Feed the latest PnL (ATR units). Activates at `trigger_atr` and ratchets
    /// the stop to `pnl_atr - lock_atr` whenever that is tighter.
    pub fn observe(&mut self, pnl_atr: f64, trailing: Option<&TrailingStop>) {
        let Some(trailing) = trailing else {
            return;
        };
        if pnl_atr >= trailing.trigger_atr {
            self.current_sl_atr = self.current_sl_atr.max(pnl_atr - trailing.lock_atr);
            if !self.active {
                self.active = true;
                self.activation_sl_atr = Some(self.current_sl_atr);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current_sl_atr(&self) -> f64 {
        self.current_sl_atr
    }

    /// Stop level recorded on the bar trailing first activated.
    pub fn activation_sl_atr(&self) -> Option<f64> {
        self.activation_sl_atr
    }
}

/// An open long position bound to one exit rule for its whole lifetime.
#[derive(Debug, Clone)]
pub struct OpenPosition<'r> {
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    /// Captured once at entry and never recomputed.
    pub entry_atr: f64,
    pub rule: &'r ExitRule,
    pub strength: Option<SignalStrength>,
    /// Static stop price, fixed at entry.
    pub sl_price: Option<f64>,
    /// Static target price, fixed at entry.
    pub tp_price: Option<f64>,
    pub trailing: TrailingState,
    pub mfe_atr: f64,
    pub mae_atr: f64,
}

impl<'r> OpenPosition<'r> {
    /// Open at `bar.open`. The caller guarantees `entry_atr` is finite and > 0.
    pub fn open(
        entry_bar: usize,
        bar: &Bar,
        entry_atr: f64,
        rule: &'r ExitRule,
        strength: Option<SignalStrength>,
    ) -> Self {
        let entry_price = bar.open;
        Self {
            entry_bar,
            entry_time: bar.timestamp,
            entry_price,
            entry_atr,
            rule,
            strength,
            sl_price: rule.stop_loss_atr().map(|sl| entry_price - sl * entry_atr),
            tp_price: rule.take_profit_atr().map(|tp| entry_price + tp * entry_atr),
            trailing: TrailingState::new(rule.stop_loss_atr()),
            mfe_atr: 0.0,
            mae_atr: 0.0,
        }
    }

    /// Close-based unrealized PnL in entry-ATR units.
    pub fn pnl_atr(&self, close: f64) -> f64 {
        (close - self.entry_price) / self.entry_atr
    }

    pub fn bars_held(&self, bar_index: usize) -> usize {
        bar_index.saturating_sub(self.entry_bar)
    }

    /// Update excursions and trailing state from a bar's close. Returns the
    /// close-based PnL in ATR units.
    pub fn observe_close(&mut self, close: f64) -> f64 {
        let pnl_atr = self.pnl_atr(close);
        self.mfe_atr = self.mfe_atr.max(pnl_atr);
        self.mae_atr = self.mae_atr.min(pnl_atr);
        self.trailing.observe(pnl_atr, self.rule.trailing());
        pnl_atr
    }

    /// Price corresponding to the current trailing stop level.
    pub fn trailing_stop_price(&self) -> f64 {
        self.entry_price + self.trailing.current_sl_atr() * self.entry_atr
    }
}

/// Position state machine: flat, or exactly one open position.
#[derive(Debug, Clone, Default)]
pub enum PositionState<'r> {
    #[default]
    Flat,
    Open(OpenPosition<'r>),
}

impl<'r> PositionState<'r> {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn as_open(&self) -> Option<&OpenPosition<'r>> {
        match self {
            PositionState::Open(pos) => Some(pos),
            PositionState::Flat => None,
        }
    }

    /// Take the open position out, leaving the state flat.
    pub fn take(&mut self) -> Option<OpenPosition<'r>> {
        match std::mem::take(self) {
            PositionState::Open(pos) => Some(pos),
            PositionState::Flat => None,
        }
    }
}
