//! Per-bar output of the strategy.

use serde::Serialize;
use std::fmt;

use super::state::StateSnapshot;
use crate::domain::OrderDetails;
use crate::error::StrategyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    CloseAll,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::CloseAll => "CLOSE_ALL",
        })
    }
}

/// Outcome of one `process_bar` call.
///
/// `order_details` is present exactly when `signal` is; `state` is always
/// present, including on error paths.
#[derive(Debug, Clone, PartialEq)]
pub struct BarResult {
    pub signal: Option<Signal>,
    pub order_details: Option<OrderDetails>,
    pub state: StateSnapshot,
    pub alerts: Vec<String>,
    pub error: Option<StrategyError>,
}

impl BarResult {
    pub fn quiet(state: StateSnapshot) -> Self {
        Self {
            signal: None,
            order_details: None,
            state,
            alerts: Vec::new(),
            error: None,
        }
    }

    pub fn failed(state: StateSnapshot, error: StrategyError) -> Self {
        Self {
            error: Some(error),
            ..Self::quiet(state)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Error message as surfaced to callers, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}
