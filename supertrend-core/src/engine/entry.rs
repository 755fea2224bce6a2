//! Entry evaluation and construction.

use tracing::{info, warn};

use super::config::StrategyConfig;
use super::refresh::IndicatorSnapshot;
use super::state::EngineState;
use crate::domain::{Bar, EntryOrder, OrderAction, OrderDetails, Position};
use crate::error::StrategyError;
use crate::indicators::TrendDirection;
use crate::sizers::{Sizer, SizingOutcome, SizingRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySide {
    Long,
    Short,
}

impl EntrySide {
    pub fn action(&self) -> OrderAction {
        match self {
            EntrySide::Long => OrderAction::Buy,
            EntrySide::Short => OrderAction::Sell,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntrySide::Long => "Long",
            EntrySide::Short => "Short",
        }
    }
}

/// A sized entry, ready to be turned into a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryPlan {
    pub side: EntrySide,
    pub quantity: i64,
    pub entry_price: f64,
    pub stop: f64,
    pub target: f64,
    pub sizing: SizingOutcome,
}

/// Gates that apply to both sides: flat book, no pivot squeeze, enough
/// volume, and no profit-threshold exit earlier in the session.
pub fn entry_allowed(state: &EngineState, close: f64) -> bool {
    state.position.is_flat()
        && !state.pivots.is_squeezed(close)
        && state.volume_ok
        && !state.profit_exit_latched
}

/// Side whose entry conditions all hold on this bar, long checked first.
pub fn entry_side(
    config: &StrategyConfig,
    bar: &Bar,
    indicators: &IndicatorSnapshot,
    state: &EngineState,
) -> Option<EntrySide> {
    let close = bar.close;
    let trailing_defined = indicators.trailing.value.is_some();
    let above = |level: Option<f64>| level.is_some_and(|v| close > v);
    let below = |level: Option<f64>| level.is_some_and(|v| close < v);

    let long_signal = indicators.flipped_up()
        && indicators.trailing.direction == TrendDirection::Up
        && trailing_defined;
    let short_signal = indicators.flipped_down()
        && indicators.trailing.direction == TrendDirection::Down
        && trailing_defined;

    if long_signal
        && !state.short_ma
        && above(indicators.ema)
        && above(indicators.rma)
        && config.bias.allows_long()
        && state.up_trend
        && close > bar.open
    {
        Some(EntrySide::Long)
    } else if short_signal
        && !state.long_ma
        && below(indicators.ema)
        && below(indicators.rma)
        && config.bias.allows_short()
        && state.dn_trend
        && close < bar.open
    {
        Some(EntrySide::Short)
    } else {
        None
    }
}

/// Stop one tick beyond the trailing Supertrend, target at the configured
/// reward/risk multiple, quantity from the sizer.
pub fn plan_entry(
    config: &StrategyConfig,
    sizer: &dyn Sizer,
    side: EntrySide,
    entry_price: f64,
    trailing_value: f64,
) -> Result<EntryPlan, StrategyError> {
    let rr = config.reward_risk_ratio;
    let (stop, target) = match side {
        EntrySide::Long => {
            let stop = trailing_value - config.tick_offset;
            (stop, entry_price + rr * (entry_price - stop))
        }
        EntrySide::Short => {
            let stop = trailing_value + config.tick_offset;
            (stop, entry_price - rr * (stop - entry_price))
        }
    };

    let sizing = sizer
        .size(&SizingRequest {
            entry_price,
            stop_price: stop,
            risk_percentage: config.risk_percentage,
            account_balance: config.effective_balance(),
        })
        .map_err(|err| {
            warn!(side = side.label(), %err, "skipping entry");
            err
        })?;

    Ok(EntryPlan {
        side,
        quantity: sizing.quantity,
        entry_price,
        stop,
        target,
        sizing,
    })
}

pub fn entry_order(config: &StrategyConfig, plan: &EntryPlan, bar: &Bar) -> OrderDetails {
    OrderDetails::Entry(EntryOrder {
        header: config.order_header(bar.timestamp.timestamp_millis()),
        action: plan.side.action(),
        quantity: plan.quantity,
        limit_price: plan.entry_price,
        stop_loss: plan.stop,
        take_profit_price: plan.target,
        reward_risk_ratio: config.reward_risk_ratio,
        notes: format!("supertrend {} {}", plan.side.label(), bar.timestamp.to_rfc3339()),
    })
}

/// Open the position described by `plan`.
pub fn apply_entry(state: &mut EngineState, plan: &EntryPlan) {
    state.position = match plan.side {
        EntrySide::Long => Position::long(plan.quantity, plan.entry_price, plan.stop, plan.target),
        EntrySide::Short => {
            Position::short(plan.quantity, plan.entry_price, plan.stop, plan.target)
        }
    };
    info!(
        side = plan.side.label(),
        quantity = plan.quantity,
        entry = plan.entry_price,
        stop = plan.stop,
        target = plan.target,
        risk = plan.sizing.per_share_risk * plan.quantity as f64,
        "entry opened"
    );
}
