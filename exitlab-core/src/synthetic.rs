//! Deterministic synthetic market data.
//!
//! Seeded random-walk bars and sparse entry signals for tests and benches.
//! The same seed always produces the same series.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Bar, SignalStrength};

/// Shape of a generated series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkParams {
    pub start_price: f64,
    /// Per-bar close-to-close volatility as a fraction of price.
    pub volatility: f64,
    /// Per-bar drift as a fraction of price.
    pub drift: f64,
    pub bar_interval: Duration,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            volatility: 0.01,
            drift: 0.0002,
            bar_interval: Duration::hours(4),
        }
    }
}

fn start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200, 0) // 2024-01-01T00:00:00Z
        .single()
        .unwrap_or_default()
}

/// Random-walk OHLC bars. Prices stay positive and every bar satisfies
/// `low <= open, close <= high`.
pub fn random_walk_bars(n: usize, seed: u64, params: &WalkParams) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = start_time();
    let mut bars = Vec::with_capacity(n);
    let mut prev_close = params.start_price;

    for i in 0..n {
        let open = prev_close * (1.0 + rng.gen_range(-0.25..=0.25) * params.volatility);
        let step = params.drift + rng.gen_range(-1.0..=1.0) * params.volatility;
        let close = (open * (1.0 + step)).max(0.01);
        let wick_up = rng.gen_range(0.0..=0.5) * params.volatility;
        let wick_down = rng.gen_range(0.0..=0.5) * params.volatility;
        let high = open.max(close) * (1.0 + wick_up);
        let low = (open.min(close) * (1.0 - wick_down)).max(0.005);

        let timestamp = start + params.bar_interval * i as i32;
        bars.push(Bar::new(timestamp, open, high, low, close));
        prev_close = close;
    }

    bars
}

/// Sparse boolean entry signals.
pub fn random_signals(n: usize, seed: u64, rate: f64) -> Vec<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rate = rate.clamp(0.0, 1.0);
    (0..n).map(|_| rng.gen_bool(rate)).collect()
}

/// Random strength labels; roughly a quarter of bars stay unlabeled.
pub fn random_strength_labels(n: usize, seed: u64) -> Vec<Option<SignalStrength>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| match rng.gen_range(0..4) {
            0 => Some(SignalStrength::Strong),
            1 => Some(SignalStrength::Medium),
            2 => Some(SignalStrength::Weak),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bars() {
        let params = WalkParams::default();
        assert_eq!(
            random_walk_bars(200, 7, &params),
            random_walk_bars(200, 7, &params)
        );
        assert_ne!(
            random_walk_bars(200, 7, &params),
            random_walk_bars(200, 8, &params)
        );
    }

    #[test]
    fn bars_are_sane_and_ordered() {
        let bars = random_walk_bars(500, 42, &WalkParams::default());
        assert!(bars.iter().all(Bar::is_sane));
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn signal_rate_extremes() {
        assert!(random_signals(100, 1, 0.0).iter().all(|s| !s));
        assert!(random_signals(100, 1, 1.0).iter().all(|s| *s));
        assert_eq!(random_signals(100, 3, 0.2), random_signals(100, 3, 0.2));
    }

    #[test]
    fn labels_cover_all_variants() {
        let labels = random_strength_labels(400, 11);
        assert!(labels.contains(&None));
        for s in SignalStrength::ALL {
            assert!(labels.contains(&Some(s)));
        }
    }
}
