//! Exit evaluation and close/update payloads.
//!
//! Checks run in a fixed order and the first match wins, so a bar closes the
//! position at most once: trailing stop, profit threshold, take-profit touch,
//! then the RSI-extreme alternate.

use std::fmt;
use tracing::info;

use super::config::StrategyConfig;
use super::state::EngineState;
use crate::domain::{
    Bar, CloseAllOrder, OrderAction, OrderDetails, Position, PositionSide, PriceUpdateOrder,
    BROKER_ATR_FACTOR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TrailingStopLong,
    TrailingStopShort,
    ProfitThreshold,
    TakeProfitLong,
    TakeProfitShort,
    RsiExtreme,
}

impl ExitReason {
    /// Note sent to the broker with the close.
    pub fn notes(&self) -> &'static str {
        match self {
            ExitReason::TrailingStopLong => "crossdownStop close_all",
            ExitReason::TrailingStopShort => "crossUpStop close_all",
            ExitReason::ProfitThreshold => "profitSig",
            ExitReason::TakeProfitLong => "crossupTP close_all",
            ExitReason::TakeProfitShort => "crossdownTP close_all",
            ExitReason::RsiExtreme => "exitRSI close_all",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.notes())
    }
}

/// Aggregate profit at or above the cap, or a loss of the full risk budget.
/// Always false with `profit_exit` disabled.
pub fn profit_threshold_breached(config: &StrategyConfig, state: &EngineState) -> bool {
    if !config.profit_exit {
        return false;
    }
    let profit = state.aggregate_profit();
    let risk_budget = config.effective_balance() * config.risk_percentage / 100.0;
    profit >= config.profit_threshold || profit <= -risk_budget
}

/// First exit condition that holds for the open position, if any.
///
/// Needs a remembered trailing stop; a profit-threshold breach latches entry
/// suppression for the rest of the session.
pub fn evaluate_exit(
    config: &StrategyConfig,
    bar: &Bar,
    state: &mut EngineState,
    rsi: Option<f64>,
) -> Option<ExitReason> {
    let stop = state.trailing_stop?;
    if state.position.is_flat() {
        return None;
    }

    let profit_breached = profit_threshold_breached(config, state);
    if profit_breached {
        state.profit_exit_latched = true;
    }

    let position = state.position;
    if config.use_trailing_stop {
        match position.side {
            PositionSide::Long if bar.low <= stop => return Some(ExitReason::TrailingStopLong),
            PositionSide::Short if bar.high >= stop => {
                return Some(ExitReason::TrailingStopShort)
            }
            _ => {}
        }
    }

    if profit_breached {
        return Some(ExitReason::ProfitThreshold);
    }

    let target = position.target?;
    let rsi = rsi.unwrap_or(f64::NAN);
    match position.side {
        PositionSide::Long if bar.high >= target => Some(ExitReason::TakeProfitLong),
        PositionSide::Long if bar.close >= target && rsi >= config.rsi_overbought => {
            Some(ExitReason::RsiExtreme)
        }
        PositionSide::Short if bar.low <= target => Some(ExitReason::TakeProfitShort),
        PositionSide::Short if bar.close <= target && rsi <= config.rsi_oversold => {
            Some(ExitReason::RsiExtreme)
        }
        _ => None,
    }
}

pub fn close_all_order(
    config: &StrategyConfig,
    bar: &Bar,
    reason: ExitReason,
    uptrend: bool,
) -> OrderDetails {
    OrderDetails::CloseAll(CloseAllOrder {
        header: config.order_header(bar.timestamp.timestamp_millis()),
        action: OrderAction::CloseAll,
        quantity: -1,
        limit_price: bar.close,
        stop_loss: bar.close,
        reward_risk_ratio: 1.0,
        keltner_atr_factor: BROKER_ATR_FACTOR,
        atr_factor: BROKER_ATR_FACTOR,
        vstop_atr_factor: BROKER_ATR_FACTOR,
        uptrend,
        test: false,
        notes: reason.notes().to_string(),
    })
}

/// Move a live bracket to `stop`, with the target re-derived from the
/// reward/risk ratio on whichever side of the stop the close sits.
pub fn price_update_order(
    config: &StrategyConfig,
    bar: &Bar,
    stop: f64,
    notes: &str,
) -> OrderDetails {
    let close = bar.close;
    let rr = config.reward_risk_ratio;
    let take_profit_price = if close > stop {
        close + rr * (close - stop)
    } else {
        close - rr * (stop - close)
    };
    OrderDetails::PriceUpdate(PriceUpdateOrder {
        header: config.order_header(bar.timestamp.timestamp_millis()),
        action: OrderAction::UpdatePrice,
        quantity: -1,
        limit_price: close,
        stop_loss: stop,
        take_profit_price,
        reward_risk_ratio: rr,
        keltner_atr_factor: BROKER_ATR_FACTOR,
        atr_factor: BROKER_ATR_FACTOR,
        vstop_atr_factor: BROKER_ATR_FACTOR,
        notes: notes.to_string(),
    })
}

/// Flatten the position.
pub fn apply_exit(state: &mut EngineState, reason: ExitReason, price: f64) {
    let closed = state.position;
    state.position = Position::flat();
    info!(
        %reason,
        side = ?closed.side,
        quantity = closed.quantity.abs(),
        price,
        "position closed"
    );
}
