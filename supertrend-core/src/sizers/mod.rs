//! Position sizers: determine trade quantity.
//!
//! Sizers translate an entry/stop pair and a risk budget into a whole number
//! of shares. They never decide whether to trade, only how much.

pub mod commission_aware;

pub use commission_aware::CommissionAwareSizer;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a quantity could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("per-share risk must be positive and finite, got {0}")]
    InvalidRisk(f64),

    #[error("entry price must be positive and finite, got {0}")]
    InvalidPrice(f64),

    #[error("account balance must be positive and finite, got {0}")]
    InvalidBalance(f64),

    #[error("Position size must be positive, got {quantity}")]
    NotViable { quantity: i64 },
}

/// How the affordability cap on a position is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QtyType {
    /// Cap at `balance * value / 100` worth of shares.
    #[default]
    PercentOfEquity,
    /// Cap at `value` shares.
    Fixed,
}

impl QtyType {
    /// Largest whole number of shares the account may hold.
    pub fn max_shares(&self, value: f64, balance: f64, entry_price: f64) -> f64 {
        match self {
            QtyType::PercentOfEquity => (balance * value / 100.0 / entry_price).floor(),
            QtyType::Fixed => value.floor(),
        }
    }
}

/// Inputs for one sizing decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingRequest {
    pub entry_price: f64,
    pub stop_price: f64,
    /// Percent of the account risked per trade (1.0 = 1 %).
    pub risk_percentage: f64,
    pub account_balance: f64,
}

/// Every intermediate of a sizing decision, for logging and alerts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingOutcome {
    pub per_share_risk: f64,
    pub tolerated_risk: f64,
    pub preliminary_quantity: f64,
    pub commission: f64,
    pub quantity: i64,
}

/// Position sizing logic
///
/// # Responsibilities
/// - Convert entry/stop prices + risk budget → whole-share quantity
/// - Account for commissions and affordability
///
/// # Non-Responsibilities
/// - Sizers do NOT decide entry/exit (that's the engine's job)
/// - Sizers never round a non-viable quantity up to one share
pub trait Sizer: Send + Sync {
    /// Returns `SizingError::NotViable` when the final quantity is ≤ 0.
    fn size(&self, request: &SizingRequest) -> Result<SizingOutcome, SizingError>;

    /// Sizer name for logging
    fn name(&self) -> &str;
}
