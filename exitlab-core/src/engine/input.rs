//! Simulation inputs and their up-front validation.

use crate::domain::Bar;
use thiserror::Error;

/// Errors detected before any bar is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("{field} has {actual} values, expected {expected} (one per bar)")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("bar {index}: timestamp is not strictly after the previous bar")]
    NonIncreasingTimestamp { index: usize },
    #[error("bar {index}: {field} must be a positive finite price, got {value}")]
    InvalidBar {
        index: usize,
        field: &'static str,
        value: f64,
    },
    #[error("transaction cost must be finite and non-negative, got {0}")]
    InvalidCost(f64),
    #[error("initial equity must be finite and positive, got {0}")]
    InvalidEquity(f64),
}

/// Aligned per-bar inputs: prices, ATR and the (already causal) entry signal.
#[derive(Debug, Clone, Copy)]
pub struct SimulationInput<'a> {
    pub bars: &'a [Bar],
    /// May contain NaN or zero; such bars cannot be entered.
    pub atr: &'a [f64],
    /// `true` = enter at this bar's open if flat.
    pub signal: &'a [bool],
}

impl<'a> SimulationInput<'a> {
    pub fn new(bars: &'a [Bar], atr: &'a [f64], signal: &'a [bool]) -> Self {
        Self { bars, atr, signal }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Check alignment, ordering and price sanity.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let expected = self.bars.len();
        check_len("atr", expected, self.atr.len())?;
        check_len("signal", expected, self.signal.len())?;

        for (index, bar) in self.bars.iter().enumerate() {
            if let Some((field, value)) = bar.invalid_field() {
                return Err(SimulationError::InvalidBar {
                    index,
                    field,
                    value,
                });
            }
            if index > 0 && bar.timestamp <= self.bars[index - 1].timestamp {
                return Err(SimulationError::NonIncreasingTimestamp { index });
            }
        }
        Ok(())
    }

    /// ATR usable for sizing an entry at `index`.
    pub fn entry_atr(&self, index: usize) -> Option<f64> {
        self.atr
            .get(index)
            .copied()
            .filter(|atr| atr.is_finite() && *atr > 0.0)
    }
}

pub(crate) fn check_len(
    field: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), SimulationError> {
    if expected != actual {
        return Err(SimulationError::LengthMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}
