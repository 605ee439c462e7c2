//! Trade-path recorder.
//!
//! A stripped-down bar walk with no capital or cost model. Each trade records
//! its close-based floating PnL on every bar after entry until a wide ATR
//! stop, a new signal, an optional holding limit, or the end of data. The
//! recorded paths are later re-evaluated under other exit rules by
//! [`super::replay`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ExitReason, SignalStrength};
use crate::engine::input::check_len;
use crate::engine::{SimulationError, SimulationInput};

/// Wide stop used while recording, in ATR units.
pub const DEFAULT_MAX_LOSS_ATR: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Close the recording once close-based loss reaches this many ATRs.
    pub max_loss_atr: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_holding_bars: Option<usize>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_loss_atr: DEFAULT_MAX_LOSS_ATR,
            max_holding_bars: None,
        }
    }
}

/// One observation on a trade path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    /// 1 = first bar after entry.
    pub step: usize,
    /// Floating return, `(close - entry) / entry`.
    pub pnl: f64,
    /// Floating PnL in entry-ATR units.
    pub pnl_atr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePath {
    pub trade_id: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub entry_atr: f64,
    pub strength: Option<SignalStrength>,
    /// Why the recording stopped: `StopLoss` (max loss), `NewSignal`,
    /// `TimeLimit` or `EndOfData`.
    pub recorded_exit: ExitReason,
    pub steps: Vec<PathStep>,
}

impl TradePath {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at which the best floating return occurred (first on ties).
    pub fn mfe_step(&self) -> Option<usize> {
        self.steps
            .iter()
            .fold(None::<&PathStep>, |best, s| match best {
                Some(b) if b.pnl >= s.pnl => Some(b),
                _ => Some(s),
            })
            .map(|s| s.step)
    }
}

struct OpenRecording {
    entry_time: DateTime<Utc>,
    entry_price: f64,
    entry_atr: f64,
    strength: Option<SignalStrength>,
    steps: Vec<PathStep>,
}

impl OpenRecording {
    fn finish(self, trade_id: usize, recorded_exit: ExitReason) -> TradePath {
        TradePath {
            trade_id,
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            entry_atr: self.entry_atr,
            strength: self.strength,
            recorded_exit,
            steps: self.steps,
        }
    }
}

/// Record one path per trade.
///
/// `labels`, when given, must be aligned with the bars; each path keeps the
/// label of its entry bar.
pub fn record_trade_paths(
    input: &SimulationInput<'_>,
    labels: Option<&[Option<SignalStrength>]>,
    config: &PathConfig,
) -> Result<Vec<TradePath>, SimulationError> {
    input.validate()?;
    if let Some(labels) = labels {
        check_len("strength_labels", input.len(), labels.len())?;
    }

    let n = input.len();
    let mut paths = Vec::new();
    let mut open: Option<OpenRecording> = None;

    for (t, bar) in input.bars.iter().enumerate() {
        if let Some(mut rec) = open.take() {
            let pnl = (bar.close - rec.entry_price) / rec.entry_price;
            let pnl_atr = (bar.close - rec.entry_price) / rec.entry_atr;
            let step = rec.steps.len() + 1;
            rec.steps.push(PathStep { step, pnl, pnl_atr });

            let exit = if pnl_atr <= -config.max_loss_atr {
                Some(ExitReason::StopLoss)
            } else if input.signal[t] {
                Some(ExitReason::NewSignal)
            } else if config.max_holding_bars.is_some_and(|max| step >= max) {
                Some(ExitReason::TimeLimit)
            } else {
                None
            };

            match exit {
                Some(reason) => {
                    paths.push(rec.finish(paths.len(), reason));
                    // No re-entry on the bar that closed the recording.
                    continue;
                }
                None => open = Some(rec),
            }
        }

        if open.is_none() && input.signal[t] && t + 1 < n {
            if let Some(entry_atr) = input.entry_atr(t) {
                open = Some(OpenRecording {
                    entry_time: bar.timestamp,
                    entry_price: bar.open,
                    entry_atr,
                    strength: labels.and_then(|l| l[t]),
                    steps: Vec::new(),
                });
            } else {
                tracing::debug!(bar = t, "path entry skipped: ATR not usable");
            }
        }
    }

    if let Some(rec) = open.take() {
        paths.push(rec.finish(paths.len(), ExitReason::EndOfData));
    }

    tracing::debug!(bars = n, paths = paths.len(), "trade paths recorded");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::{Duration, TimeZone};

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let base = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(base + Duration::hours(i as i64), c, c + 1.0, c - 1.0, c))
            .collect()
    }

    #[test]
    fn records_one_step_per_bar_after_entry() {
        let bars = bars(&[100.0, 102.0, 104.0, 101.0]);
        let input = SimulationInput::new(&bars, &[2.0; 4], &[true, false, false, false]);
        let paths = record_trade_paths(&input, None, &PathConfig::default()).unwrap();
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert_eq!(path.recorded_exit, ExitReason::EndOfData);
        assert_eq!(path.len(), 3);
        assert_eq!(path.steps[0], PathStep { step: 1, pnl: 0.02, pnl_atr: 1.0 });
        assert_eq!(path.steps[1].pnl_atr, 2.0);
        assert_eq!(path.mfe_step(), Some(2));
    }

    #[test]
    fn max_loss_closes_recording() {
        let bars = bars(&[100.0, 95.0, 89.0, 120.0]);
        let input = SimulationInput::new(&bars, &[2.0; 4], &[true, false, false, false]);
        let paths = record_trade_paths(&input, None, &PathConfig::default()).unwrap();
        assert_eq!(paths[0].recorded_exit, ExitReason::StopLoss);
        assert_eq!(paths[0].len(), 2);
    }

    #[test]
    fn new_signal_closes_without_same_bar_reentry() {
        let bars = bars(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let input =
            SimulationInput::new(&bars, &[1.0; 5], &[true, false, true, true, false]);
        let paths = record_trade_paths(&input, None, &PathConfig::default()).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].recorded_exit, ExitReason::NewSignal);
        assert_eq!(paths[1].entry_time, bars[3].timestamp);
        assert_eq!(paths[1].trade_id, 1);
    }

    #[test]
    fn holding_limit_and_labels() {
        let bars = bars(&[100.0; 6]);
        let labels = [Some(SignalStrength::Weak), None, None, None, None, None];
        let config = PathConfig {
            max_holding_bars: Some(2),
            ..PathConfig::default()
        };
        let input = SimulationInput::new(&bars, &[1.0; 6], &[true, false, false, false, false, false]);
        let paths = record_trade_paths(&input, Some(&labels[..]), &config).unwrap();
        assert_eq!(paths[0].recorded_exit, ExitReason::TimeLimit);
        assert_eq!(paths[0].len(), 2);
        assert_eq!(paths[0].strength, Some(SignalStrength::Weak));
    }

    #[test]
    fn misaligned_labels_rejected() {
        let bars = bars(&[100.0; 3]);
        let input = SimulationInput::new(&bars, &[1.0; 3], &[false; 3]);
        assert!(record_trade_paths(&input, Some(&[None][..]), &PathConfig::default()).is_err());
    }
}
