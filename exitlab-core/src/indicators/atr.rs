//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR is the simple rolling mean of TR over the trailing `window` bars with a
//! minimum of one observation, so early bars average whatever history exists.
//! ATR[t] only depends on bars 0..=t.

use super::{Indicator, IndicatorError};
use crate::domain::Bar;

/// Default ATR window used by the research presets.
pub const DEFAULT_ATR_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct Atr {
    window: usize,
    name: String,
}

impl Atr {
    pub fn new(window: usize) -> Result<Self, IndicatorError> {
        if window == 0 {
            return Err(IndicatorError::ZeroWindow { indicator: "atr" });
        }
        Ok(Self {
            window,
            name: format!("atr_{window}"),
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for Atr {
    fn default() -> Self {
        Self {
            window: DEFAULT_ATR_WINDOW,
            name: format!("atr_{DEFAULT_ATR_WINDOW}"),
        }
    }
}

/// Compute the True Range series from bars.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    let mut prev_close: Option<f64> = None;

    for bar in bars {
        let range = bar.high - bar.low;
        let value = match prev_close {
            None => range,
            Some(pc) => range.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
        };
        tr.push(value);
        prev_close = Some(bar.close);
    }

    tr
}

/// Rolling mean over the trailing `window` values, ignoring NaN entries.
///
/// Each window is summed afresh so a large value leaving the window leaves no
/// rounding residue behind. A position whose window holds no finite value
/// yields NaN.
pub fn rolling_mean_min1(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let (sum, count) = values[start..=i]
                .iter()
                .filter(|v| v.is_finite())
                .fold((0.0_f64, 0usize), |(sum, count), v| (sum + v, count + 1));
            if count > 0 {
                sum / count as f64
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// ATR series for `bars` with the given window.
pub fn rolling_atr(bars: &[Bar], window: usize) -> Result<Vec<f64>, IndicatorError> {
    Ok(Atr::new(window)?.compute(bars))
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean_min1(&true_range(bars), self.window)
    }
}
