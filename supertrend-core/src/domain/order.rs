//! Broker order payloads.
//!
//! These records are the JSON contract consumed by the broker-integration
//! service. Field names are fixed by that service, hence the explicit renames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ATR factor reported to the broker for Keltner, ATR and volatility stops.
pub const BROKER_ATR_FACTOR: f64 = 1.5;

/// What the broker should do with the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderAction {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "close_all")]
    CloseAll,
    #[serde(rename = "updateIbPrice")]
    UpdatePrice,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderAction::Buy => "BUY",
            OrderAction::Sell => "SELL",
            OrderAction::CloseAll => "close_all",
            OrderAction::UpdatePrice => "updateIbPrice",
        };
        f.write_str(s)
    }
}

/// How the broker derives its protective stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StopType {
    #[default]
    #[serde(rename = "tick")]
    Tick,
    #[serde(rename = "kcStop")]
    KeltnerStop,
    #[serde(rename = "vStop")]
    VolatilityStop,
    #[serde(rename = "pivot")]
    Pivot,
}

/// Fields shared by every payload kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub symbol: String,
    #[serde(rename = "barSizeSetting_tv")]
    pub timeframe: String,
    #[serde(rename = "riskPercentage")]
    pub risk_percentage: f64,
    #[serde(rename = "accountBalance")]
    pub account_balance: f64,
    #[serde(rename = "stopType")]
    pub stop_type: StopType,
    #[serde(rename = "takeProfitBool")]
    pub take_profit: bool,
    pub set_market_order: bool,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "unixtime")]
    pub unix_time_ms: i64,
}

/// New BUY or SELL bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    #[serde(rename = "orderAction")]
    pub action: OrderAction,
    pub quantity: i64,
    pub limit_price: f64,
    pub stop_loss: f64,
    pub take_profit_price: f64,
    #[serde(rename = "rewardRiskRatio")]
    pub reward_risk_ratio: f64,
    pub notes: String,
}

/// Flatten everything for the symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseAllOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    #[serde(rename = "orderAction")]
    pub action: OrderAction,
    /// Always -1: the broker closes whatever is open.
    pub quantity: i64,
    pub limit_price: f64,
    pub stop_loss: f64,
    #[serde(rename = "rewardRiskRatio")]
    pub reward_risk_ratio: f64,
    #[serde(rename = "kcAtrFactor")]
    pub keltner_atr_factor: f64,
    #[serde(rename = "atrFactor")]
    pub atr_factor: f64,
    #[serde(rename = "vstopAtrFactor")]
    pub vstop_atr_factor: f64,
    pub uptrend: bool,
    pub test: bool,
    pub notes: String,
}

/// Move the protective stop and target of a live bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdateOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    #[serde(rename = "orderAction")]
    pub action: OrderAction,
    pub quantity: i64,
    pub limit_price: f64,
    pub stop_loss: f64,
    pub take_profit_price: f64,
    #[serde(rename = "rewardRiskRatio")]
    pub reward_risk_ratio: f64,
    #[serde(rename = "kcAtrFactor")]
    pub keltner_atr_factor: f64,
    #[serde(rename = "atrFactor")]
    pub atr_factor: f64,
    #[serde(rename = "vstopAtrFactor")]
    pub vstop_atr_factor: f64,
    pub notes: String,
}

/// Any payload the engine can emit.
///
/// Untagged: variants are tried widest first when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderDetails {
    PriceUpdate(PriceUpdateOrder),
    Entry(EntryOrder),
    CloseAll(CloseAllOrder),
}

impl OrderDetails {
    pub fn header(&self) -> &OrderHeader {
        match self {
            OrderDetails::Entry(o) => &o.header,
            OrderDetails::CloseAll(o) => &o.header,
            OrderDetails::PriceUpdate(o) => &o.header,
        }
    }

    pub fn action(&self) -> OrderAction {
        match self {
            OrderDetails::Entry(o) => o.action,
            OrderDetails::CloseAll(o) => o.action,
            OrderDetails::PriceUpdate(o) => o.action,
        }
    }

    pub fn quantity(&self) -> i64 {
        match self {
            OrderDetails::Entry(o) => o.quantity,
            OrderDetails::CloseAll(o) => o.quantity,
            OrderDetails::PriceUpdate(o) => o.quantity,
        }
    }

    pub fn limit_price(&self) -> f64 {
        match self {
            OrderDetails::Entry(o) => o.limit_price,
            OrderDetails::CloseAll(o) => o.limit_price,
            OrderDetails::PriceUpdate(o) => o.limit_price,
        }
    }

    pub fn stop_loss(&self) -> f64 {
        match self {
            OrderDetails::Entry(o) => o.stop_loss,
            OrderDetails::CloseAll(o) => o.stop_loss,
            OrderDetails::PriceUpdate(o) => o.stop_loss,
        }
    }

    pub fn take_profit_price(&self) -> Option<f64> {
        match self {
            OrderDetails::Entry(o) => Some(o.take_profit_price),
            OrderDetails::CloseAll(_) => None,
            OrderDetails::PriceUpdate(o) => Some(o.take_profit_price),
        }
    }

    pub fn reward_risk_ratio(&self) -> f64 {
        match self {
            OrderDetails::Entry(o) => o.reward_risk_ratio,
            OrderDetails::CloseAll(o) => o.reward_risk_ratio,
            OrderDetails::PriceUpdate(o) => o.reward_risk_ratio,
        }
    }

    pub fn notes(&self) -> &str {
        match self {
            OrderDetails::Entry(o) => &o.notes,
            OrderDetails::CloseAll(o) => &o.notes,
            OrderDetails::PriceUpdate(o) => &o.notes,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for OrderDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Symbol: {} | Action: {} | Quantity: {} | Entry: ${:.2} | Stop Loss: ${:.2} | Take Profit: ${:.2} | Risk/Reward: {:.2} | Notes: {}",
            self.header().symbol,
            self.action(),
            self.quantity(),
            self.limit_price(),
            self.stop_loss(),
            self.take_profit_price().unwrap_or(0.0),
            self.reward_risk_ratio(),
            self.notes(),
        )
    }
}
