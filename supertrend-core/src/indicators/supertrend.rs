//! Supertrend: ATR-based directional indicator.
//!
//! Inherently sequential/stateful: direction flips between support and resistance
//! based on close vs previously committed band comparisons.
//!
//! Lookback: atr_period - 1 (same as the RMA-based ATR it depends on).
//!
//! Output: the active band value, i.e. the lower band (support) when trending up,
//! upper band (resistance) when trending down.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::atr::atr;
use super::series::defined;
use super::{check_factor, check_period, Indicator, IndicatorError};
use crate::domain::Bar;

/// Direction of a Supertrend at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendDirection {
    Up,
    Down,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Up => f.write_str("UP"),
            TrendDirection::Down => f.write_str("DOWN"),
        }
    }
}

/// (value, direction) at one index. `value` is `None` while ATR warms up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupertrendPoint {
    pub value: Option<f64>,
    pub direction: TrendDirection,
}

/// Full Supertrend output over a window, index-aligned with its input.
#[derive(Debug, Clone, PartialEq)]
pub struct SupertrendSeries {
    value: Vec<f64>,
    direction: Vec<TrendDirection>,
    final_upper: Vec<f64>,
    final_lower: Vec<f64>,
}

impl SupertrendSeries {
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.value
    }

    pub fn directions(&self) -> &[TrendDirection] {
        &self.direction
    }

    pub fn point(&self, index: usize) -> Option<SupertrendPoint> {
        Some(SupertrendPoint {
            value: defined(*self.value.get(index)?),
            direction: *self.direction.get(index)?,
        })
    }

    /// Point at the last index.
    pub fn current(&self) -> Option<SupertrendPoint> {
        self.len().checked_sub(1).and_then(|i| self.point(i))
    }

    /// Point one bar before the last; the current point for a single-bar series.
    pub fn previous(&self) -> Option<SupertrendPoint> {
        match self.len() {
            0 => None,
            1 => self.point(0),
            n => self.point(n - 2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    period: usize,
    factor: f64,
    name: String,
}

impl Supertrend {
    pub fn new(period: usize, factor: f64) -> Result<Self, IndicatorError> {
        check_period("Supertrend", period)?;
        check_factor("Supertrend", factor)?;
        Ok(Self {
            period,
            factor,
            name: format!("supertrend_{period}_{factor}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Values and directions over the given bars.
    pub fn series(&self, bars: &[Bar]) -> SupertrendSeries {
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        recurrence(&high, &low, &close, self.period, self.factor)
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        self.series(bars).value
    }
}

/// Supertrend over raw OHLC columns.
pub fn supertrend(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    atr_period: usize,
    factor: f64,
) -> Result<SupertrendSeries, IndicatorError> {
    check_period("Supertrend", atr_period)?;
    check_factor("Supertrend", factor)?;
    if high.len() != low.len() || low.len() != close.len() {
        return Err(IndicatorError::LengthMismatch {
            indicator: "Supertrend",
            lengths: vec![high.len(), low.len(), close.len()],
        });
    }
    Ok(recurrence(high, low, close, atr_period, factor))
}

fn recurrence(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    atr_period: usize,
    factor: f64,
) -> SupertrendSeries {
    let n = close.len();
    let atr = atr(high, low, close, atr_period);

    let mut final_upper = vec![f64::NAN; n];
    let mut final_lower = vec![f64::NAN; n];
    let mut value = vec![f64::NAN; n];
    let mut direction = vec![TrendDirection::Down; n];

    if n == 0 {
        return SupertrendSeries {
            value,
            direction,
            final_upper,
            final_lower,
        };
    }

    let hl2 = |i: usize| (high[i] + low[i]) / 2.0;
    final_upper[0] = hl2(0) + factor * atr[0];
    final_lower[0] = hl2(0) - factor * atr[0];
    value[0] = final_upper[0];

    for i in 1..n {
        let basic_upper = hl2(i) + factor * atr[i];
        let basic_lower = hl2(i) - factor * atr[i];
        let prev_upper = final_upper[i - 1];
        let prev_lower = final_lower[i - 1];
        let prev_close = close[i - 1];

        // An undefined previous band adopts the basic band, so the bands seed
        // on the first bar with a defined ATR.
        final_upper[i] = if basic_upper.is_nan() {
            f64::NAN
        } else if prev_upper.is_nan() || basic_upper < prev_upper || prev_close > prev_upper {
            basic_upper
        } else {
            prev_upper
        };

        final_lower[i] = if basic_lower.is_nan() {
            f64::NAN
        } else if prev_lower.is_nan() || basic_lower > prev_lower || prev_close < prev_lower {
            basic_lower
        } else {
            prev_lower
        };

        (direction[i], value[i]) = match direction[i - 1] {
            TrendDirection::Down if close[i] > prev_upper => (TrendDirection::Up, final_lower[i]),
            TrendDirection::Down => (TrendDirection::Down, final_upper[i]),
            TrendDirection::Up if close[i] < prev_lower => (TrendDirection::Down, final_upper[i]),
            TrendDirection::Up => (TrendDirection::Up, final_lower[i]),
        };
    }

    SupertrendSeries {
        value,
        direction,
        final_upper,
        final_lower,
    }
}
