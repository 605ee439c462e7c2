//! ExitLab Runner: run configuration, statistics, replay summaries, sweeps.
//!
//! This crate builds on `exitlab-core` to provide:
//! - TOML run configuration with content-addressed run ids
//! - Single-rule, all-rule and strength-routed runs over prepared market data
//! - Annualized performance statistics per bar size
//! - Aggregated trade-path replay summaries
//! - Parallel exit-rule parameter sweeps

pub mod bar_size;
pub mod config;
pub mod metrics;
pub mod replay_summary;
pub mod runner;
pub mod sweep;

pub use bar_size::{BarSize, UnknownBarSize};
pub use config::{BacktestConfig, ConfigError, RunId, StrengthTableConfig};
pub use metrics::{PerformanceStats, StrengthBreakdown};
pub use replay_summary::ReplaySummary;
pub use runner::{run_backtest, run_dynamic_backtest, BacktestResult, MarketData, RunError, Runner};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_stats_is_send_sync() {
        assert_send::<PerformanceStats>();
        assert_sync::<PerformanceStats>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<BarSize>();
        assert_sync::<BarSize>();
        assert_send::<MarketData>();
        assert_sync::<MarketData>();
    }

    #[test]
    fn runner_is_shareable_across_sweep_threads() {
        assert_sync::<Runner<'static>>();
        assert_send::<SweepResults>();
        assert_send::<ReplaySummary>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
