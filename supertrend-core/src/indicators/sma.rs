//! Simple Moving Average (SMA).
//!
//! SMA[t] = mean(source[t-period+1..=t])
//! Lookback: period - 1.

use super::series::rolling_mean;
use super::{check_period, Indicator, IndicatorError};
use crate::domain::{Bar, PriceSource};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: PriceSource,
    name: String,
}

impl Sma {
    pub fn new(period: usize, source: PriceSource) -> Result<Self, IndicatorError> {
        check_period("SMA", period)?;
        Ok(Self {
            period,
            source,
            name: format!("sma_{period}"),
        })
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values: Vec<f64> = bars.iter().map(|b| b.price(self.source)).collect();
        sma(&values, self.period)
    }
}

/// SMA of an arbitrary series. Undefined before `period - 1`.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    rolling_mean(values, period)
}
