//! ExitLab Core: bar-walk exit simulation, exit rules, ATR and trade-path replay.
//!
//! This crate contains the heart of the exit-simulation engine:
//! - Domain types (bars, strength labels, positions, trades)
//! - ATR estimator used to scale every stop and target
//! - Exit-rule specifications, presets, per-strength tables and a keyed registry
//! - Single-position bar walk with a fixed exit-priority order
//! - Strength-routed variant that binds a rule per entry
//! - Trade-path recorder and per-trade exit-rule replay
//! - Seeded synthetic data for tests and benches

pub mod domain;
pub mod engine;
pub mod exit_rules;
pub mod indicators;
pub mod path;
pub mod synthetic;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all owned core types are Send + Sync.
    ///
    /// Parameter sweeps move rules and results across rayon worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::SignalStrength>();
        require_sync::<domain::SignalStrength>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();
        require_send::<domain::ExitReason>();
        require_sync::<domain::ExitReason>();
        require_send::<domain::TrailingState>();
        require_sync::<domain::TrailingState>();

        // Exit rules
        require_send::<exit_rules::ExitRule>();
        require_sync::<exit_rules::ExitRule>();
        require_send::<exit_rules::StrengthRules>();
        require_sync::<exit_rules::StrengthRules>();
        require_send::<exit_rules::RuleRegistry>();
        require_sync::<exit_rules::RuleRegistry>();
        require_send::<exit_rules::ExitRuleError>();
        require_sync::<exit_rules::ExitRuleError>();

        // Engine types
        require_send::<engine::SimConfig>();
        require_sync::<engine::SimConfig>();
        require_send::<engine::SimulationResult>();
        require_sync::<engine::SimulationResult>();
        require_send::<engine::SimulationError>();
        require_sync::<engine::SimulationError>();
        require_send::<engine::SimulationInput<'static>>();
        require_sync::<engine::SimulationInput<'static>>();

        // Paths
        require_send::<path::TradePath>();
        require_sync::<path::TradePath>();
        require_send::<path::ReplayOutcome>();
        require_sync::<path::ReplayOutcome>();

        // Indicators
        require_send::<indicators::Atr>();
        require_sync::<indicators::Atr>();
    }

    /// Architecture contract: rule selection only sees the entry bar index.
    ///
    /// `RuleSelector::select` takes no position, equity or future data, so the
    /// rule bound at entry cannot depend on anything after the entry bar.
    #[test]
    fn rule_selector_sees_only_entry_index() {
        fn _check_trait_object_builds(
            selector: &dyn engine::RuleSelector,
        ) -> (&exit_rules::ExitRule, Option<domain::SignalStrength>) {
            selector.select(0)
        }
    }
}
