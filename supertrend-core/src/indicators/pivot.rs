//! Pivot highs and lows (centered-window extrema).
//!
//! Index i is a pivot high iff `value[i] == max(value[i-left..=i+right])`;
//! pivot low mirrors with min. Indices without a fully populated window are
//! NaN, so the last `right` values of any series are always undefined: a pivot
//! is only published once `right` further bars exist.
//!
//! Lookback: left + right.

use super::series::{fix_nan, max, min};
use super::Indicator;
use crate::domain::Bar;

fn centered(values: &[f64], left: usize, right: usize, extreme: fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < left + right + 1 {
        return result;
    }
    for i in left..(n - right) {
        if values[i] == extreme(&values[i - left..=i + right]) {
            result[i] = values[i];
        }
    }
    result
}

pub fn pivot_high(values: &[f64], left: usize, right: usize) -> Vec<f64> {
    centered(values, left, right, max)
}

pub fn pivot_low(values: &[f64], left: usize, right: usize) -> Vec<f64> {
    centered(values, left, right, min)
}

/// Pivot highs of the bar highs.
#[derive(Debug, Clone)]
pub struct PivotHigh {
    left: usize,
    right: usize,
    name: String,
}

impl PivotHigh {
    pub fn new(left: usize, right: usize) -> Self {
        Self {
            left,
            right,
            name: format!("pivot_high_{left}_{right}"),
        }
    }
}

impl Indicator for PivotHigh {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.left + self.right
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        pivot_high(&highs, self.left, self.right)
    }
}

/// Pivot lows of the bar lows.
#[derive(Debug, Clone)]
pub struct PivotLow {
    left: usize,
    right: usize,
    name: String,
}

impl PivotLow {
    pub fn new(left: usize, right: usize) -> Self {
        Self {
            left,
            right,
            name: format!("pivot_low_{left}_{right}"),
        }
    }
}

impl Indicator for PivotLow {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.left + self.right
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        pivot_low(&lows, self.left, self.right)
    }
}

/// Nearest resistance (last pivot high) and support (last pivot low).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PivotLevels {
    pub resistance: Option<f64>,
    pub support: Option<f64>,
}

impl PivotLevels {
    /// Price strictly between support and resistance. Needs both levels.
    pub fn is_squeezed(&self, price: f64) -> bool {
        match (self.resistance, self.support) {
            (Some(r), Some(s)) => price < r && price > s,
            _ => false,
        }
    }
}

/// Forward-filled pivot levels at the last bar.
pub fn pivot_levels(bars: &[Bar], left: usize, right: usize) -> PivotLevels {
    let highs = PivotHigh::new(left, right).compute(bars);
    let lows = PivotLow::new(left, right).compute(bars);
    let last = |series: Vec<f64>| {
        fix_nan(&series)
            .last()
            .copied()
            .filter(|v| !v.is_nan())
    };
    PivotLevels {
        resistance: last(highs),
        support: last(lows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    #[test]
    fn pivot_high_requires_full_window() {
        let values = [1.0, 2.0, 5.0, 2.0, 1.0, 0.5];
        let result = pivot_high(&values, 2, 2);
        assert!(result[0].is_nan() && result[1].is_nan());
        assert_eq!(result[2], 5.0);
        assert!(result[3].is_nan());
        // last `right` indices never confirmed
        assert!(result[4].is_nan() && result[5].is_nan());
    }

    #[test]
    fn pivot_low_mirrors() {
        let values = [5.0, 4.0, 1.0, 4.0, 5.0];
        let result = pivot_low(&values, 2, 2);
        assert_eq!(result[2], 1.0);
        assert_eq!(result.iter().filter(|v| !v.is_nan()).count(), 1);
    }

    #[test]
    fn equal_values_are_both_pivots() {
        let values = [1.0, 3.0, 3.0, 1.0, 0.0];
        let result = pivot_high(&values, 1, 1);
        assert_eq!(result[1], 3.0);
        assert_eq!(result[2], 3.0);
    }

    #[test]
    fn too_short_is_all_undefined() {
        assert!(pivot_high(&[1.0, 2.0, 1.0], 2, 2).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn levels_carry_forward_last_pivot() {
        // High pivot at 2 (12.0), low pivot at 5 (7.0); then drift with no new pivots
        let bars = make_ohlc_bars(&[
            (10.0, 10.5, 9.5, 10.0),
            (10.0, 11.0, 9.0, 10.5),
            (10.5, 12.0, 9.8, 11.0),
            (11.0, 11.5, 9.0, 9.5),
            (9.5, 10.0, 8.0, 8.5),
            (8.5, 9.0, 7.0, 8.0),
            (8.0, 9.5, 7.5, 9.0),
            (9.0, 9.8, 7.6, 9.2),
            (9.2, 9.9, 7.7, 9.4),
        ]);
        let levels = pivot_levels(&bars, 2, 2);
        assert_eq!(levels.resistance, Some(12.0));
        assert_eq!(levels.support, Some(7.0));
        assert!(levels.is_squeezed(9.4));
        assert!(!levels.is_squeezed(12.0));
        assert!(!levels.is_squeezed(7.0));
    }

    #[test]
    fn squeeze_needs_both_levels() {
        let levels = PivotLevels {
            resistance: Some(10.0),
            support: None,
        };
        assert!(!levels.is_squeezed(5.0));
    }
}
