//! Trade paths: recording per-trade PnL paths and replaying exit rules on them.

pub mod recorder;
pub mod replay;

pub use recorder::{record_trade_paths, PathConfig, PathStep, TradePath, DEFAULT_MAX_LOSS_ATR};
pub use replay::{
    replay_all, replay_by_strength, replay_exit_rule, ReplayExitReason, ReplayOutcome,
};
