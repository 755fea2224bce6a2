//! Indicator library.
//!
//! Every indicator is a pure function of a bar slice: no state survives between
//! calls, and each output series is index-aligned with its input. Positions
//! that are not yet available (warm-up) hold `f64::NAN`; callers convert to
//! `Option<f64>` at the edge with [`series::defined`].

pub mod atr;
pub mod ema;
pub mod pivot;
pub mod rma;
pub mod rsi;
pub mod series;
pub mod sma;
pub mod supertrend;
pub mod vwap;

pub use atr::{atr, true_range, Atr};
pub use ema::{ema, Ema, DEFAULT_SMOOTHING};
pub use pivot::{pivot_high, pivot_levels, pivot_low, PivotHigh, PivotLevels, PivotLow};
pub use rma::{rma, Rma};
pub use rsi::{rsi, Rsi, RsiSmoothing};
pub use sma::{sma, Sma};
pub use supertrend::{supertrend, Supertrend, SupertrendPoint, SupertrendSeries, TrendDirection};
pub use vwap::{vwap, Vwap};

use crate::domain::Bar;
use thiserror::Error;

/// Invalid indicator parameters or inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("{indicator} period must be positive, got {period}")]
    InvalidPeriod {
        indicator: &'static str,
        period: usize,
    },

    #[error("{indicator} factor must be positive and finite, got {factor}")]
    InvalidFactor { indicator: &'static str, factor: f64 },

    #[error("{indicator} input columns differ in length: {lengths:?}")]
    LengthMismatch {
        indicator: &'static str,
        lengths: Vec<usize>,
    },
}

/// Trait for single-series indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later,
/// with the single documented exception of pivots, whose value at t is only
/// published once `right` further bars exist.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_9", "supertrend_10_3").
    fn name(&self) -> &str;

    /// Number of leading values that are undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

pub(crate) fn check_factor(indicator: &'static str, factor: f64) -> Result<(), IndicatorError> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(IndicatorError::InvalidFactor { indicator, factor });
    }
    Ok(())
}

pub(crate) fn check_period(indicator: &'static str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { indicator, period });
    }
    Ok(())
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
/// Bars are one minute apart.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Bar::new(
                base + chrono::Duration::minutes(i as i64),
                open,
                high,
                low,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Bars from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(
                base + chrono::Duration::minutes(i as i64),
                open,
                high,
                low,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
