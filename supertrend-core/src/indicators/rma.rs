//! Wilder's Moving Average (RMA).
//!
//! alpha = 1 / period
//! Seed: RMA[period-1] = mean(source[0..period]).
//! Recursive: RMA[t] = alpha * source[t] + (1 - alpha) * RMA[t-1].
//! Lookback: period - 1.

use super::series::mean;
use super::{check_period, Indicator, IndicatorError};
use crate::domain::{Bar, PriceSource};

#[derive(Debug, Clone)]
pub struct Rma {
    period: usize,
    source: PriceSource,
    name: String,
}

impl Rma {
    pub fn new(period: usize, source: PriceSource) -> Result<Self, IndicatorError> {
        check_period("RMA", period)?;
        Ok(Self {
            period,
            source,
            name: format!("rma_{period}"),
        })
    }
}

impl Indicator for Rma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values: Vec<f64> = bars.iter().map(|b| b.price(self.source)).collect();
        rma(&values, self.period)
    }
}

/// RMA of an arbitrary series. A NaN in the seed window leaves the whole
/// output undefined.
pub fn rma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let alpha = 1.0 / period as f64;
    result[period - 1] = mean(&values[..period]);
    for i in period..n {
        result[i] = alpha * values[i] + (1.0 - alpha) * result[i - 1];
    }
    result
}
