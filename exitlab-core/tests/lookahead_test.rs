//! Look-ahead contamination tests.
//!
//! Invariant: no decision at bar t may depend on data from bar t+1 or later.
//!
//! Method: run on a truncated series (bars 0..k) and on the full series.
//! Everything decided strictly before bar k-1 must be identical. Any
//! difference means future data leaked into a past decision.

use exitlab_core::domain::Bar;
use exitlab_core::engine::{simulate, SimConfig, SimulationInput};
use exitlab_core::exit_rules::ExitRule;
use exitlab_core::indicators::{rolling_atr, true_range, Atr, Indicator};
use exitlab_core::synthetic::{random_signals, random_walk_bars, WalkParams};

fn make_test_bars(n: usize) -> Vec<Bar> {
    random_walk_bars(n, 20240101, &WalkParams::default())
}

fn assert_series_prefix_eq(truncated: &[f64], full: &[f64], name: &str) {
    for (i, (a, b)) in truncated.iter().zip(full).enumerate() {
        let same = (a.is_nan() && b.is_nan()) || a == b;
        assert!(same, "{name}: bar {i} differs ({a} vs {b}) between truncated and full series");
    }
}

#[test]
fn true_range_has_no_lookahead() {
    let bars = make_test_bars(200);
    assert_series_prefix_eq(&true_range(&bars[..100]), &true_range(&bars), "true_range");
}

#[test]
fn atr_has_no_lookahead() {
    let bars = make_test_bars(200);
    for window in [1, 5, 10, 20] {
        let atr = Atr::new(window).unwrap();
        assert_series_prefix_eq(
            &atr.compute(&bars[..100]),
            &atr.compute(&bars),
            atr.name(),
        );
    }
}

#[test]
fn simulation_prefix_is_stable() {
    let bars = make_test_bars(400);
    let atr = rolling_atr(&bars, 10).unwrap();
    let signal = random_signals(bars.len(), 99, 0.08);
    let rule = ExitRule::preset("trail_t2_l1_sl3").unwrap();
    let config = SimConfig::default();

    let full = simulate(&SimulationInput::new(&bars, &atr, &signal), &rule, &config).unwrap();

    for k in [50, 120, 250, 399] {
        let truncated = simulate(
            &SimulationInput::new(&bars[..k], &atr[..k], &signal[..k]),
            &rule,
            &config,
        )
        .unwrap();

        let settled: Vec<_> = full.trades.iter().filter(|t| t.exit_bar < k - 1).collect();
        assert!(truncated.trades.len() >= settled.len());
        for (a, b) in settled.iter().zip(&truncated.trades) {
            assert_eq!(*a, b, "trade closed before bar {} changed when data was truncated", k - 1);
        }
        assert_series_prefix_eq(
            &truncated.equity_curve[..k - 1],
            &full.equity_curve[..k - 1],
            "equity_curve",
        );
    }
}

#[test]
fn future_signals_do_not_change_past_entries() {
    let bars = make_test_bars(300);
    let atr = rolling_atr(&bars, 10).unwrap();
    let signal = random_signals(bars.len(), 5, 0.08);
    let rule = ExitRule::preset("static_sl4_tp5_max30").unwrap();
    let config = SimConfig::default();

    let cutoff = 150;
    let mut altered = signal.clone();
    for s in altered.iter_mut().skip(cutoff) {
        *s = !*s;
    }

    let base = simulate(&SimulationInput::new(&bars, &atr, &signal), &rule, &config).unwrap();
    let flipped = simulate(&SimulationInput::new(&bars, &atr, &altered), &rule, &config).unwrap();

    let before = |r: &exitlab_core::engine::SimulationResult| {
        r.trades
            .iter()
            .filter(|t| t.exit_bar < cutoff)
            .cloned()
            .collect::<Vec<_>>()
    };
    assert_eq!(before(&base), before(&flipped));
    assert_eq!(
        base.equity_curve[..cutoff],
        flipped.equity_curve[..cutoff]
    );
}

#[test]
fn entry_uses_signal_at_its_own_index() {
    // A single signal at bar 7 must produce an entry at bar 7's open, never earlier.
    let bars = make_test_bars(20);
    let atr = rolling_atr(&bars, 10).unwrap();
    let mut signal = vec![false; 20];
    signal[7] = true;
    let rule = ExitRule::builder("hold3").max_holding_bars(3).build().unwrap();

    let result = simulate(
        &SimulationInput::new(&bars, &atr, &signal),
        &rule,
        &SimConfig::default(),
    )
    .unwrap();
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].entry_bar, 7);
    assert_eq!(result.trades[0].entry_price, bars[7].open);
    assert_eq!(result.trades[0].entry_atr, atr[7]);
}
