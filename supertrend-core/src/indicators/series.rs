//! Windowed reductions over plain `f64` series.
//!
//! A NaN anywhere in a window makes that window's result NaN. Results are
//! index-aligned with the input; positions before the first full window are NaN.

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N).
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Maximum, or NaN if the slice is empty or contains NaN.
pub fn max(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Minimum, or NaN if the slice is empty or contains NaN.
pub fn min(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn rolling(values: &[f64], period: usize, reduce: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    for i in (period - 1)..n {
        result[i] = reduce(&values[i + 1 - period..=i]);
    }
    result
}

pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, mean)
}

pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, std_dev)
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, max)
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, min)
}

/// Forward-fill NaN gaps with the last defined value.
///
/// Leading NaNs (before any defined value) stay NaN.
pub fn fix_nan(values: &[f64]) -> Vec<f64> {
    let mut last = f64::NAN;
    values
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                last = v;
            }
            last
        })
        .collect()
}

/// Most recent defined value at or before the end of the series.
pub fn last_defined(values: &[f64]) -> Option<f64> {
    values.iter().rev().copied().find(|v| !v.is_nan())
}

/// NaN → None.
pub fn defined(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}
