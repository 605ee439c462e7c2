//! Domain types for ExitLab

pub mod bar;
pub mod position;
pub mod strength;
pub mod trade;

pub use bar::Bar;
pub use position::{OpenPosition, PositionState, TrailingState};
pub use strength::{SignalStrength, UnknownStrength};
pub use trade::{ExitReason, TradeRecord};
