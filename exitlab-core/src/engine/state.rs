//! Simulation configuration and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::input::SimulationError;
use crate::domain::TradeRecord;

/// Round-trip cost used by the research runs (7 bps).
pub const DEFAULT_TRANSACTION_COST: f64 = 0.0007;
pub const DEFAULT_INITIAL_EQUITY: f64 = 10_000.0;

/// Configuration for a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Flat round-trip cost as a fraction of entry price.
    pub transaction_cost: f64,
    pub initial_equity: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            transaction_cost: DEFAULT_TRANSACTION_COST,
            initial_equity: DEFAULT_INITIAL_EQUITY,
        }
    }
}

impl SimConfig {
    pub fn new(transaction_cost: f64, initial_equity: f64) -> Self {
        Self {
            transaction_cost,
            initial_equity,
        }
    }

    /// Cost-free config, convenient for hand-computed expectations.
    pub fn frictionless(initial_equity: f64) -> Self {
        Self::new(0.0, initial_equity)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.transaction_cost.is_finite() || self.transaction_cost < 0.0 {
            return Err(SimulationError::InvalidCost(self.transaction_cost));
        }
        if !self.initial_equity.is_finite() || self.initial_equity <= 0.0 {
            return Err(SimulationError::InvalidEquity(self.initial_equity));
        }
        Ok(())
    }
}

/// Trade ledger plus realized equity curve.
///
/// `equity_curve[i]` is realized equity after bar `i`: it only changes on
/// bars where a trade closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<f64>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub initial_equity: f64,
}

impl SimulationResult {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .copied()
            .unwrap_or(self.initial_equity)
    }

    pub fn bar_count(&self) -> usize {
        self.equity_curve.len()
    }
}
