//! Backtesting engine: single-position bar walk and its strength-routed variant.
//!
//! The engine consumes aligned bars, an ATR series and a causal entry signal,
//! then walks bars in order holding at most one long position:
//!
//! 1. Exit check: trailing update from the close, then stop → target → time → new signal
//! 2. Entry check: flat, signal set, ATR usable, no exit on this bar
//! 3. Realized equity recorded for the bar

pub mod dynamic;
pub mod exits;
pub mod input;
pub mod simulator;
pub mod state;

pub use dynamic::{align_strength_labels, simulate_dynamic, StrengthRouted};
pub use exits::{evaluate_exit, ExitDecision};
pub use input::{SimulationError, SimulationInput};
pub use simulator::{run_bar_walk, simulate, RuleSelector};
pub use state::{SimConfig, SimulationResult, DEFAULT_INITIAL_EQUITY, DEFAULT_TRANSACTION_COST};
