//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for the engine's single instrument.
///
/// Bars are immutable once observed. Missing values arrive as NaN (a "void"
/// field) and are rejected by validation before any indicator sees them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Names of the numeric fields that are not finite.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Price read from the configured source column.
    pub fn price(&self, source: PriceSource) -> f64 {
        match source {
            PriceSource::Open => self.open,
            PriceSource::High => self.high,
            PriceSource::Low => self.low,
            PriceSource::Close => self.close,
            PriceSource::Hl2 => self.hl2(),
            PriceSource::Hlc3 => (self.high + self.low + self.close) / 3.0,
            PriceSource::Ohlc4 => (self.open + self.high + self.low + self.close) / 4.0,
        }
    }
}

/// Which bar column feeds the moving averages and RSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Open,
    High,
    Low,
    #[default]
    Close,
    Hl2,
    Hlc3,
    Ohlc4,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap(),
            100.0,
            105.0,
            98.0,
            103.0,
            50_000.0,
        )
    }

    #[test]
    fn bar_reports_missing_fields() {
        assert!(sample_bar().missing_fields().is_empty());
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        bar.volume = f64::INFINITY;
        assert_eq!(bar.missing_fields(), vec!["open", "volume"]);
    }

    #[test]
    fn price_sources() {
        let bar = sample_bar();
        assert_eq!(bar.price(PriceSource::Close), 103.0);
        assert_eq!(bar.price(PriceSource::Hl2), 101.5);
        assert_eq!(bar.price(PriceSource::Hlc3), (105.0 + 98.0 + 103.0) / 3.0);
        assert_eq!(bar.price(PriceSource::Ohlc4), (100.0 + 105.0 + 98.0 + 103.0) / 4.0);
    }

    #[test]
    fn price_source_deserializes_lowercase() {
        let src: PriceSource = serde_json::from_str("\"hlc3\"").unwrap();
        assert_eq!(src, PriceSource::Hlc3);
    }
}
