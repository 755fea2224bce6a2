//! Supertrend Core: streaming indicators and a per-bar trading state machine.
//!
//! This crate contains:
//! - Domain types (bars, trailing windows, positions, broker payloads)
//! - Indicator library (SMA/EMA/RMA, ATR, Supertrend, RSI, pivots, VWAP)
//! - Commission-aware position sizing
//! - The Supertrend strategy engine with day-boundary bookkeeping

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod sizers;

pub use engine::{BarResult, Signal, StrategyConfig, SupertrendStrategy};
pub use error::{ConfigError, StrategyError};
