//! Volume Weighted Average Price (VWAP), cumulative over the input window.
//!
//! VWAP[t] = sum(typical * volume)[0..=t] / sum(volume)[0..=t]
//! typical = (high + low + close) / 3. Undefined while cumulative volume is 0.

use super::Indicator;
use crate::domain::{Bar, PriceSource};

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        vwap(bars)
    }
}

pub fn vwap(bars: &[Bar]) -> Vec<f64> {
    let mut pv = 0.0;
    let mut vol = 0.0;
    bars.iter()
        .map(|b| {
            pv += b.price(PriceSource::Hlc3) * b.volume;
            vol += b.volume;
            if vol > 0.0 {
                pv / vol
            } else {
                f64::NAN
            }
        })
        .collect()
}
