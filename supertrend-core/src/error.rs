//! Error taxonomy for configuration and per-bar processing.

use thiserror::Error;

use crate::indicators::IndicatorError;
use crate::sizers::SizingError;

/// Rejected configuration. Raised only at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Recoverable failure while processing one bar.
///
/// Never escapes `process_bar`: it is carried in `BarResult::error`, or in
/// `BarResult::alerts` for failures local to one entry/exit attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("{0}")]
    Validation(String),

    #[error("Insufficient historical data")]
    InsufficientHistory { required: usize, available: usize },

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error("{0}")]
    EntryConstruction(String),

    #[error("Processing error: {0}")]
    Unexpected(String),
}

impl From<SizingError> for StrategyError {
    fn from(err: SizingError) -> Self {
        StrategyError::EntryConstruction(err.to_string())
    }
}
