//! Strategy engine: per-bar state machine and supporting pieces.
//!
//! The engine consumes one bar plus its trailing history per call and runs:
//!
//! 1. Day boundary: reset per-session state when the session date advances
//! 2. Activation gate: observe but never trade before the activation time
//! 3. Indicator refresh over the trimmed window
//! 4. Entry evaluation while flat, exit evaluation while open
//! 5. Snapshot of the resulting state

pub mod config;
pub mod entry;
pub mod exit;
pub mod refresh;
pub mod result;
pub mod session;
pub mod state;
pub mod strategy;

pub use config::{Bias, ConfigHash, StrategyConfig, SupertrendParams};
pub use entry::{EntryPlan, EntrySide};
pub use exit::{profit_threshold_breached, ExitReason};
pub use refresh::{aggregate_trend, IndicatorSet, IndicatorSnapshot, TrendFlags};
pub use result::{BarResult, Signal};
pub use session::SessionClock;
pub use state::{DayAccumulator, EngineState, StateSnapshot};
pub use strategy::SupertrendStrategy;
