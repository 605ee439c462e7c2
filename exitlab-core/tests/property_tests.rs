//! Property tests for bar-walk invariants.
//!
//! Uses proptest to verify:
//! 1. No pyramiding: trades never overlap and never share a bar
//! 2. Strict exit after entry: holding = exit index − entry index
//! 3. Ratchet monotonicity: trailing stops never loosen
//! 4. Realized-only equity: the curve only moves on exit bars
//! 5. Determinism: identical inputs give byte-identical outputs
//! 6. Strength routing: every trade is bound to its label's rule

use proptest::prelude::*;
use exitlab_core::domain::SignalStrength;
use exitlab_core::engine::{simulate, simulate_dynamic, SimConfig, SimulationInput, SimulationResult};
use exitlab_core::exit_rules::{ExitRule, StrengthRules};
use exitlab_core::indicators::rolling_atr;
use exitlab_core::path::{record_trade_paths, replay_exit_rule, PathConfig, ReplayExitReason};
use exitlab_core::synthetic::{random_signals, random_strength_labels, random_walk_bars, WalkParams};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_rule() -> impl Strategy<Value = ExitRule> {
    (
        prop::option::of(0.5..6.0_f64),
        prop::option::of(0.5..8.0_f64),
        prop::option::of(1usize..40),
        prop::option::of((0.5..4.0_f64, 0.1..2.0_f64)),
    )
        .prop_map(|(sl, tp, max, trail)| {
            let mut b = ExitRule::builder("arb");
            if let Some(sl) = sl {
                b = b.stop_loss_atr(sl);
            }
            if let Some(tp) = tp {
                b = b.take_profit_atr(tp);
            }
            if let Some(max) = max {
                b = b.max_holding_bars(max);
            }
            if let Some((trigger, lock)) = trail {
                b = b.trailing(trigger, lock);
            }
            b.build().unwrap()
        })
}

struct Market {
    bars: Vec<exitlab_core::domain::Bar>,
    atr: Vec<f64>,
    signal: Vec<bool>,
}

fn market(seed: u64, n: usize, rate: f64) -> Market {
    let bars = random_walk_bars(n, seed, &WalkParams::default());
    let atr = rolling_atr(&bars, 10).unwrap();
    let signal = random_signals(n, seed ^ 0x5eed, rate);
    Market { bars, atr, signal }
}

fn run(m: &Market, rule: &ExitRule) -> SimulationResult {
    let input = SimulationInput::new(&m.bars, &m.atr, &m.signal);
    simulate(&input, rule, &SimConfig::default()).unwrap()
}

proptest! {
    // ── 1 + 2. Single position, strict exit after entry ──────────────

    #[test]
    fn trades_never_overlap(seed in any::<u64>(), rate in 0.0..0.5_f64, rule in arb_rule()) {
        let m = market(seed, 300, rate);
        let result = run(&m, &rule);

        for trade in &result.trades {
            prop_assert!(trade.exit_bar > trade.entry_bar);
            prop_assert!(trade.exit_time > trade.entry_time);
            prop_assert_eq!(trade.bars_held, trade.exit_bar - trade.entry_bar);
            prop_assert!(trade.net_pnl_pct.is_finite());
        }
        for pair in result.trades.windows(2) {
            prop_assert!(pair[0].exit_bar < pair[1].entry_bar);
        }
    }

    // ── 3. Ratchet ───────────────────────────────────────────────────

    #[test]
    fn trailing_stop_never_loosens(seed in any::<u64>(), rule in arb_rule()) {
        let m = market(seed, 400, 0.1);
        let result = run(&m, &rule);

        for trade in result.trades.iter().filter(|t| t.trailing_activated) {
            let at_activation = trade.trailing_activation_sl_atr.unwrap();
            let at_exit = trade.exit_sl_atr.unwrap();
            prop_assert!(at_exit >= at_activation);
        }
    }

    // ── 4. Realized-only equity ──────────────────────────────────────

    #[test]
    fn equity_moves_only_on_exit_bars(seed in any::<u64>(), rule in arb_rule()) {
        let m = market(seed, 300, 0.1);
        let result = run(&m, &rule);

        prop_assert_eq!(result.equity_curve.len(), m.bars.len());
        let exit_bars: Vec<usize> = result.trades.iter().map(|t| t.exit_bar).collect();
        let mut prev = result.initial_equity;
        for (i, &equity) in result.equity_curve.iter().enumerate() {
            if equity != prev {
                prop_assert!(exit_bars.contains(&i), "equity moved on bar {} without an exit", i);
            }
            prev = equity;
        }
        for trade in &result.trades {
            let at_entry = result.equity_curve[trade.entry_bar];
            for i in trade.entry_bar..trade.exit_bar {
                prop_assert_eq!(result.equity_curve[i], at_entry);
            }
        }
    }

    // ── 5. Determinism ───────────────────────────────────────────────

    #[test]
    fn simulation_is_deterministic(seed in any::<u64>(), rule in arb_rule()) {
        let m = market(seed, 250, 0.15);
        let a = serde_json::to_string(&run(&m, &rule)).unwrap();
        let b = serde_json::to_string(&run(&m, &rule)).unwrap();
        prop_assert_eq!(a, b);
    }

    // ── 6. Strength routing ──────────────────────────────────────────

    #[test]
    fn dynamic_binds_rule_by_label(seed in any::<u64>()) {
        let m = market(seed, 300, 0.1);
        let labels = random_strength_labels(m.bars.len(), seed.wrapping_add(1));
        let rules = StrengthRules::preset("BTCUSD").unwrap();
        let input = SimulationInput::new(&m.bars, &m.atr, &m.signal);
        let result = simulate_dynamic(&input, &labels, &rules, &SimConfig::default()).unwrap();

        for trade in &result.trades {
            let expected = SignalStrength::resolve(labels[trade.entry_bar]);
            prop_assert_eq!(trade.strength, Some(expected));
            prop_assert_eq!(trade.rule_name.as_str(), rules.for_strength(expected).name());
        }
    }

    // ── Replay ───────────────────────────────────────────────────────

    #[test]
    fn replay_without_limits_runs_to_end(seed in any::<u64>()) {
        let m = market(seed, 200, 0.1);
        let input = SimulationInput::new(&m.bars, &m.atr, &m.signal);
        let paths = record_trade_paths(&input, None, &PathConfig::default()).unwrap();
        let open_ended = ExitRule::builder("open_ended").build().unwrap();

        for path in &paths {
            let out = replay_exit_rule(path, &open_ended);
            prop_assert_eq!(out.reason, ReplayExitReason::RanToEnd);
            prop_assert_eq!(out.exit_step, path.len());
            prop_assert!(out.mfe >= out.pnl);
            prop_assert!(out.mae <= out.pnl);
        }
    }
}
