//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = w * source[t] + (1 - w) * EMA[t-1], w = smoothing / (period + 1)
//! Seed: EMA[0] = source[0].
//! Lookback: period - 1. The recurrence has a value from the first bar, but
//! everything before `period - 1` is masked to NaN to line up with
//! TradingView's warm-up.

use super::{check_period, Indicator, IndicatorError};
use crate::domain::{Bar, PriceSource};

/// Standard smoothing multiplier (w = 2 / (period + 1)).
pub const DEFAULT_SMOOTHING: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    smoothing: f64,
    source: PriceSource,
    name: String,
}

impl Ema {
    pub fn new(period: usize, source: PriceSource) -> Result<Self, IndicatorError> {
        Self::with_smoothing(period, DEFAULT_SMOOTHING, source)
    }

    pub fn with_smoothing(
        period: usize,
        smoothing: f64,
        source: PriceSource,
    ) -> Result<Self, IndicatorError> {
        check_period("EMA", period)?;
        if !(smoothing.is_finite() && smoothing > 0.0) {
            return Err(IndicatorError::InvalidFactor {
                indicator: "EMA",
                factor: smoothing,
            });
        }
        Ok(Self {
            period,
            smoothing,
            source,
            name: format!("ema_{period}"),
        })
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values: Vec<f64> = bars.iter().map(|b| b.price(self.source)).collect();
        ema(&values, self.period, self.smoothing)
    }
}

/// EMA of an arbitrary series.
pub fn ema(values: &[f64], period: usize, smoothing: f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n == 0 || period == 0 {
        return result;
    }

    let weight = smoothing / (period as f64 + 1.0);
    result[0] = values[0];
    for i in 1..n {
        result[i] = values[i] * weight + result[i - 1] * (1.0 - weight);
    }

    for v in result.iter_mut().take(period - 1) {
        *v = f64::NAN;
    }
    result
}
