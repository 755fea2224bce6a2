//! Engine-owned mutable state and its read-only snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::domain::{Position, PositionSide};
use crate::indicators::PivotLevels;

/// Daily profit bookkeeping fed by `update_pnl`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayAccumulator {
    pub daily_net_profit: f64,
    pub last_net_profit: f64,
    /// One entry per closed day.
    pub trade_profits: Vec<f64>,
}

impl DayAccumulator {
    /// Fold the latest aggregate (realized + open) profit into today's total.
    pub fn observe(&mut self, current_net_profit: f64) {
        self.daily_net_profit += current_net_profit - self.last_net_profit;
        self.last_net_profit = current_net_profit;
    }

    /// Archive today's total and start a new day at zero.
    pub fn close_day(&mut self) -> f64 {
        let total = self.daily_net_profit;
        self.trade_profits.push(total);
        self.daily_net_profit = 0.0;
        total
    }
}

/// Mutable state that evolves bar-by-bar. Owned by the strategy and handed to
/// each per-bar step by exclusive reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    pub position: Position,
    pub up_trend: bool,
    pub dn_trend: bool,
    pub long_ma: bool,
    pub short_ma: bool,
    pub volume_ok: bool,
    /// Set when the profit threshold closed the book; blocks entries until the
    /// next session.
    pub profit_exit_latched: bool,
    /// Last defined trailing-Supertrend value. Survives day resets.
    pub trailing_stop: Option<f64>,
    pub pivots: PivotLevels,
    pub day: DayAccumulator,
    /// Realized profit reported by `update_pnl`.
    pub net_profit: f64,
    /// Unrealized profit reported by `update_pnl`.
    pub open_profit: f64,
    /// Bars that passed validation.
    pub bar_index: u64,
    /// Session date of the latest bar seen, rejected bars included.
    pub last_session: Option<NaiveDate>,
}

impl EngineState {
    pub fn aggregate_profit(&self) -> f64 {
        self.net_profit + self.open_profit
    }

    /// Start-of-session reset: flatten and clear everything that is per-day.
    pub fn day_reset(&mut self) {
        let closed = self.day.close_day();
        info!(previous_day_pnl = closed, "daily reset");
        self.position = Position::flat();
        self.up_trend = false;
        self.dn_trend = false;
        self.long_ma = false;
        self.short_ma = false;
        self.volume_ok = false;
        self.profit_exit_latched = false;
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let (long_stop, long_target) = match self.position.side {
            PositionSide::Long => (self.position.stop, self.position.target),
            _ => (None, None),
        };
        let (short_stop, short_target) = match self.position.side {
            PositionSide::Short => (self.position.stop, self.position.target),
            _ => (None, None),
        };
        StateSnapshot {
            position_size: self.position.quantity,
            long_position: self.position.is_long(),
            short_position: self.position.is_short(),
            daily_net_profit: self.day.daily_net_profit,
            up_trend: self.up_trend,
            dn_trend: self.dn_trend,
            long_stop,
            long_target,
            short_stop,
            short_target,
            trailing_stop: self.trailing_stop,
            profit_exit_latched: self.profit_exit_latched,
            bar_index: self.bar_index,
            trade_profits: self.day.trade_profits.clone(),
        }
    }
}

/// Read-only projection of the engine state, rebuilt on every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub position_size: i64,
    pub long_position: bool,
    pub short_position: bool,
    pub daily_net_profit: f64,
    pub up_trend: bool,
    pub dn_trend: bool,
    pub long_stop: Option<f64>,
    pub long_target: Option<f64>,
    pub short_stop: Option<f64>,
    pub short_target: Option<f64>,
    pub trailing_stop: Option<f64>,
    pub profit_exit_latched: bool,
    pub bar_index: u64,
    pub trade_profits: Vec<f64>,
}

fn level(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("${v:.2}"))
}

impl fmt::Display for StateSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = if self.long_position {
            "LONG"
        } else if self.short_position {
            "SHORT"
        } else {
            "FLAT"
        };
        let trend = if self.up_trend {
            "UP"
        } else if self.dn_trend {
            "DOWN"
        } else {
            "NEUTRAL"
        };
        write!(
            f,
            "Bar: {} | Position: {} ({}) | Daily P&L: ${:.2} | Trend: {} | Long SL/TP: {}/{} | Short SL/TP: {}/{} | Trailing: {} | Profit exit: {}",
            self.bar_index,
            position,
            self.position_size,
            self.daily_net_profit,
            trend,
            level(self.long_stop),
            level(self.long_target),
            level(self.short_stop),
            level(self.short_target),
            level(self.trailing_stop),
            self.profit_exit_latched,
        )
    }
}
