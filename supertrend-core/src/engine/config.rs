//! Strategy configuration.
//!
//! Immutable for the lifetime of an engine. Every field has a default, so a
//! TOML document only needs to name what it overrides.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{OrderHeader, PriceSource, StopType};
use crate::error::ConfigError;
use crate::indicators::{check_factor, check_period, RsiSmoothing};
use crate::sizers::QtyType;

/// Which directions the engine may enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    #[default]
    Both,
    Long,
    Short,
}

impl Bias {
    pub fn allows_long(&self) -> bool {
        *self != Bias::Short
    }

    pub fn allows_short(&self) -> bool {
        *self != Bias::Long
    }
}

/// ATR period and band factor of one Supertrend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupertrendParams {
    pub atr_period: usize,
    pub factor: f64,
}

impl SupertrendParams {
    pub const fn new(atr_period: usize, factor: f64) -> Self {
        Self { atr_period, factor }
    }
}

/// Structural identity of a configuration (blake3 of its canonical JSON).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0[..12.min(self.0.len())])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    // ── Activation ──
    /// Bars at or before this Unix time (seconds) are observed but not traded.
    pub activation_unix_time: i64,
    pub use_trailing_stop: bool,
    /// Column feeding the moving averages and RSI.
    pub source: PriceSource,

    // ── Supertrends ──
    pub main: SupertrendParams,
    pub confirmation: [SupertrendParams; 3],
    pub trailing: SupertrendParams,

    // ── Risk ──
    pub bias: Bias,
    /// Aggregate profit that closes everything for the day.
    pub profit_threshold: f64,
    pub reward_risk_ratio: f64,
    /// Percent of the account risked per trade (1.0 = 1 %).
    pub risk_percentage: f64,
    pub min_commission: f64,
    /// Dollars per share.
    pub commission_per_share: f64,
    /// Commission ceiling as a fraction of trade value.
    pub commission_cap_fraction: f64,
    /// 0 means "use `initial_capital`".
    pub account_balance: f64,

    // ── Orders ──
    pub stop_type: StopType,
    pub set_market_order: bool,
    pub take_profit: bool,
    pub profit_exit: bool,

    // ── Account ──
    pub initial_capital: f64,
    pub qty_type: QtyType,
    pub qty_value: f64,
    pub margin_long: f64,
    pub margin_short: f64,

    // ── Instrument ──
    pub timeframe: String,
    pub symbol: String,

    // ── Session ──
    /// IANA zone in which trading days are counted.
    pub reset_timezone: String,
    /// Local hour at which a new trading day starts (18 for futures).
    pub reset_hour: u32,

    // ── Filters ──
    pub volume_multiplier: f64,
    pub volume_period: usize,
    pub tick_offset: f64,
    pub ma_period: usize,
    pub rsi_period: usize,
    pub rsi_smoothing: RsiSmoothing,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub pivot_left: usize,
    pub pivot_right: usize,
    pub warmup_buffer: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            activation_unix_time: 1_761_140_099,
            use_trailing_stop: false,
            source: PriceSource::Close,
            main: SupertrendParams::new(10, 3.0),
            confirmation: [
                SupertrendParams::new(10, 1.0),
                SupertrendParams::new(11, 2.0),
                SupertrendParams::new(12, 3.0),
            ],
            trailing: SupertrendParams::new(3, 1.5),
            bias: Bias::Both,
            profit_threshold: 300.0,
            reward_risk_ratio: 1.5,
            risk_percentage: 1.0,
            min_commission: 1.0,
            commission_per_share: 0.005,
            commission_cap_fraction: 0.01,
            account_balance: 0.0,
            stop_type: StopType::Tick,
            set_market_order: false,
            take_profit: true,
            profit_exit: true,
            initial_capital: 25_000.0,
            qty_type: QtyType::PercentOfEquity,
            qty_value: 100.0,
            margin_long: 25.0,
            margin_short: 25.0,
            timeframe: "1".into(),
            symbol: "STOCK".into(),
            reset_timezone: "America/New_York".into(),
            reset_hour: 0,
            volume_multiplier: 6.0,
            volume_period: 10,
            tick_offset: 0.02,
            ma_period: 9,
            rsi_period: 14,
            rsi_smoothing: RsiSmoothing::Sma,
            rsi_overbought: 80.0,
            rsi_oversold: 20.0,
            pivot_left: 3,
            pivot_right: 3,
            warmup_buffer: 50,
        }
    }
}

impl StrategyConfig {
    /// Parse and validate a (possibly partial) TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: StrategyConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter and resolve the session timezone.
    pub fn validate(&self) -> Result<Tz, ConfigError> {
        check_period("main Supertrend", self.main.atr_period)?;
        check_factor("main Supertrend", self.main.factor)?;
        for params in &self.confirmation {
            check_period("confirmation Supertrend", params.atr_period)?;
            check_factor("confirmation Supertrend", params.factor)?;
        }
        check_period("trailing Supertrend", self.trailing.atr_period)?;
        check_factor("trailing Supertrend", self.trailing.factor)?;
        check_period("moving average", self.ma_period)?;
        check_period("RSI", self.rsi_period)?;
        check_period("volume average", self.volume_period)?;

        positive("reward_risk_ratio", self.reward_risk_ratio)?;
        positive("initial_capital", self.initial_capital)?;
        positive("qty_value", self.qty_value)?;
        non_negative("min_commission", self.min_commission)?;
        non_negative("commission_per_share", self.commission_per_share)?;
        non_negative("commission_cap_fraction", self.commission_cap_fraction)?;
        non_negative("account_balance", self.account_balance)?;
        non_negative("volume_multiplier", self.volume_multiplier)?;
        non_negative("tick_offset", self.tick_offset)?;
        if !self.profit_threshold.is_finite() {
            return Err(ConfigError::invalid(
                "profit_threshold",
                format!("must be finite, got {}", self.profit_threshold),
            ));
        }
        percentage("risk_percentage", self.risk_percentage)?;
        percentage("margin_long", self.margin_long)?;
        percentage("margin_short", self.margin_short)?;
        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            return Err(ConfigError::invalid(
                "rsi levels",
                format!(
                    "need 0 <= oversold < overbought <= 100, got {}/{}",
                    self.rsi_oversold, self.rsi_overbought
                ),
            ));
        }
        if self.reset_hour >= 24 {
            return Err(ConfigError::invalid(
                "reset_hour",
                format!("must be < 24, got {}", self.reset_hour),
            ));
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::invalid("symbol", "must not be empty"));
        }

        self.reset_timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.reset_timezone.clone()))
    }

    /// Period multiplier for sub-minute timeframes.
    pub fn timeframe_multiplier(&self) -> usize {
        match self.timeframe.as_str() {
            "10S" => 6,
            "5S" => 12,
            "15S" => 4,
            _ => 1,
        }
    }

    /// Balance used for sizing, gating and payloads.
    pub fn effective_balance(&self) -> f64 {
        if self.account_balance > 0.0 {
            self.account_balance
        } else {
            self.initial_capital
        }
    }

    /// Bars of history needed for one decision: the longest indicator window
    /// plus the warm-up buffer.
    pub fn required_history(&self) -> usize {
        let tf = self.timeframe_multiplier();
        let triple = self
            .confirmation
            .iter()
            .map(|p| p.atr_period)
            .max()
            .unwrap_or(0);
        let core = [
            self.main.atr_period * tf,
            triple,
            self.trailing.atr_period * tf,
            self.ma_period * tf,
            self.rsi_period,
            self.volume_period * tf,
            self.pivot_left + self.pivot_right + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(1);
        core + self.warmup_buffer
    }

    /// Fields shared by every broker payload.
    pub fn order_header(&self, unix_time_ms: i64) -> OrderHeader {
        OrderHeader {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe.clone(),
            risk_percentage: self.risk_percentage,
            account_balance: self.effective_balance(),
            stop_type: self.stop_type,
            take_profit: self.take_profit,
            set_market_order: self.set_market_order,
            unix_time_ms,
        }
    }

    pub fn config_hash(&self) -> Result<ConfigHash, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(ConfigHash(blake3::hash(json.as_bytes()).to_hex().to_string()))
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be > 0, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")))
    }
}

fn percentage(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 100.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be in (0, 100], got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let tz = StrategyConfig::default().validate().unwrap();
        assert_eq!(tz, chrono_tz::America::New_York);
    }

    #[test]
    fn default_required_history() {
        // max(10, 12, 3, 9, 14, 10, 7) + 50
        assert_eq!(StrategyConfig::default().required_history(), 64);
    }

    #[test]
    fn timeframe_scales_required_history() {
        let config = StrategyConfig {
            timeframe: "10S".into(),
            ..Default::default()
        };
        assert_eq!(config.timeframe_multiplier(), 6);
        // main ATR 10 * 6 = 60 dominates
        assert_eq!(config.required_history(), 110);
    }

    #[test]
    fn timeframe_multipliers() {
        for (label, mult) in [("5S", 12), ("15S", 4), ("1", 1), ("5", 1)] {
            let config = StrategyConfig {
                timeframe: label.into(),
                ..Default::default()
            };
            assert_eq!(config.timeframe_multiplier(), mult, "{label}");
        }
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = StrategyConfig::from_toml_str(
            r#"
            symbol = "AAPL"
            bias = "long"
            stop_type = "kcStop"
            reset_hour = 18

            [main]
            atr_period = 7
            factor = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.symbol, "AAPL");
        assert_eq!(config.bias, Bias::Long);
        assert_eq!(config.stop_type, StopType::KeltnerStop);
        assert_eq!(config.main, SupertrendParams::new(7, 2.5));
        assert_eq!(config.reset_hour, 18);
        assert_eq!(config.trailing, SupertrendParams::new(3, 1.5));
        assert_eq!(config.initial_capital, 25_000.0);
    }

    #[test]
    fn toml_confirmation_array() {
        let config = StrategyConfig::from_toml_str(
            r#"
            confirmation = [
                { atr_period = 5, factor = 1.0 },
                { atr_period = 6, factor = 1.5 },
                { atr_period = 7, factor = 2.0 },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.confirmation[2], SupertrendParams::new(7, 2.0));
    }

    #[test]
    fn rejects_bad_values() {
        let bad_factor = StrategyConfig {
            main: SupertrendParams::new(10, 0.0),
            ..Default::default()
        };
        assert!(matches!(bad_factor.validate(), Err(ConfigError::Indicator(_))));

        let bad_period = StrategyConfig {
            trailing: SupertrendParams::new(0, 1.5),
            ..Default::default()
        };
        assert!(matches!(bad_period.validate(), Err(ConfigError::Indicator(_))));

        let bad_hour = StrategyConfig {
            reset_hour: 24,
            ..Default::default()
        };
        assert!(matches!(bad_hour.validate(), Err(ConfigError::Invalid { .. })));

        let bad_risk = StrategyConfig {
            risk_percentage: 150.0,
            ..Default::default()
        };
        assert!(bad_risk.validate().is_err());

        let bad_tz = StrategyConfig {
            reset_timezone: "Mars/Olympus".into(),
            ..Default::default()
        };
        assert!(matches!(bad_tz.validate(), Err(ConfigError::UnknownTimezone(_))));
    }

    #[test]
    fn unknown_bias_fails_to_parse() {
        assert!(matches!(
            StrategyConfig::from_toml_str(r#"bias = "sideways""#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn balance_override() {
        let mut config = StrategyConfig::default();
        assert_eq!(config.effective_balance(), 25_000.0);
        config.account_balance = 50_000.0;
        assert_eq!(config.effective_balance(), 50_000.0);
        assert_eq!(config.order_header(0).account_balance, 50_000.0);
    }

    #[test]
    fn config_hash_tracks_parameters() {
        let a = StrategyConfig::default();
        let mut b = a.clone();
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());
        b.main.factor = 2.0;
        assert_ne!(a.config_hash().unwrap(), b.config_hash().unwrap());
        assert_eq!(a.config_hash().unwrap().0.len(), 64);
    }

    #[test]
    fn bias_gates() {
        assert!(Bias::Both.allows_long() && Bias::Both.allows_short());
        assert!(Bias::Long.allows_long() && !Bias::Long.allows_short());
        assert!(!Bias::Short.allows_long() && Bias::Short.allows_short());
    }
}
