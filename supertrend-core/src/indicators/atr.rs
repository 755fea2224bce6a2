//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR is the Wilder RMA of the true-range series.
//! Lookback: period - 1 (TR[0] is defined as high[0]-low[0]).

use super::rma::rma;
use super::{check_period, Indicator, IndicatorError};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("ATR", period)?;
        Ok(Self {
            period,
            name: format!("atr_{period}"),
        })
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        atr(&high, &low, &close, self.period)
    }
}

/// True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
///
/// Columns are read up to the shortest of the three.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    let mut tr = Vec::with_capacity(n);
    for i in 0..n {
        let hl = high[i] - low[i];
        if i == 0 {
            tr.push(hl);
            continue;
        }
        let pc = close[i - 1];
        tr.push(hl.max((high[i] - pc).abs()).max((low[i] - pc).abs()));
    }
    tr
}

/// ATR over OHLC columns.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    rma(&true_range(high, low, close), period)
}
