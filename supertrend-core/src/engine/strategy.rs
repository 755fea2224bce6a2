//! Per-bar decision loop of the Supertrend strategy.
//!
//! Steps, in order, for every bar:
//! 1. day-boundary reset
//! 2. validate the bar and trim the history window
//! 3. activation gate
//! 4. indicator refresh and trend aggregation
//! 5. MA, pivot and volume gates
//! 6. entry evaluation (flat book only)
//! 7. exit evaluation (book open before this bar)
//! 8. snapshot
//!
//! Failures never escape `process_bar`; they are folded into the returned
//! `BarResult` together with a valid snapshot.

use tracing::{debug, error, info, warn};

use super::config::{ConfigHash, StrategyConfig};
use super::entry::{apply_entry, entry_allowed, entry_order, entry_side, plan_entry, EntrySide};
use super::exit::{apply_exit, close_all_order, evaluate_exit, price_update_order};
use super::refresh::{IndicatorSet, IndicatorSnapshot};
use super::result::{BarResult, Signal};
use super::session::SessionClock;
use super::state::{EngineState, StateSnapshot};
use crate::domain::{Bar, BarBuffer, BarWindow, OrderDetails};
use crate::error::{ConfigError, StrategyError};
use crate::indicators::TrendDirection;
use crate::sizers::CommissionAwareSizer;

/// Bars between periodic state summaries in the debug log.
const STATE_LOG_INTERVAL: u64 = 100;

/// One instrument's strategy engine. Not shared between threads; run one
/// instance per symbol.
#[derive(Debug, Clone)]
pub struct SupertrendStrategy {
    config: StrategyConfig,
    config_hash: ConfigHash,
    clock: SessionClock,
    indicators: IndicatorSet,
    sizer: CommissionAwareSizer,
    required_history: usize,
    state: EngineState,
}

impl SupertrendStrategy {
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        let tz = config.validate()?;
        let indicators = IndicatorSet::from_config(&config)?;
        let sizer = CommissionAwareSizer::new(
            config.min_commission,
            config.commission_per_share,
            config.commission_cap_fraction,
        )
        .with_quantity_cap(config.qty_type, config.qty_value);
        let config_hash = config.config_hash()?;
        let required_history = config.required_history();

        info!(
            config_hash = %config_hash,
            symbol = %config.symbol,
            timeframe = %config.timeframe,
            required_history,
            timezone = %tz,
            "strategy initialized"
        );

        Ok(Self {
            clock: SessionClock::new(tz, config.reset_hour),
            config,
            config_hash,
            indicators,
            sizer,
            required_history,
            state: EngineState::default(),
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &ConfigHash {
        &self.config_hash
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot()
    }

    /// Minimum history length `process_bar` accepts, and the window it trims to.
    pub fn required_history(&self) -> usize {
        self.required_history
    }

    /// Empty live-feed buffer sized to the required history.
    pub fn buffer(&self) -> BarBuffer {
        BarBuffer::new(self.required_history)
    }

    /// Latest realized and unrealized profit from the account feed. Call
    /// before `process_bar` for the profit-threshold exit to see it.
    pub fn update_pnl(&mut self, net_profit: f64, open_profit: f64) {
        self.state.net_profit = net_profit;
        self.state.open_profit = open_profit;
        debug!(net_profit, open_profit, "pnl updated");
    }

    /// Broker payload moving the live bracket to the remembered trailing stop.
    pub fn price_update_order(&self, bar: &Bar, notes: &str) -> Option<OrderDetails> {
        self.state
            .trailing_stop
            .map(|stop| price_update_order(&self.config, bar, stop, notes))
    }

    /// Push `bar` into a live buffer and process it against the buffered
    /// history.
    pub fn on_bar(&mut self, buffer: &mut BarBuffer, bar: Bar) -> BarResult {
        buffer.push(bar);
        self.process_bar(&bar, buffer.as_slice())
    }

    /// Process one bar. `history` is ordered oldest first and ends with `bar`.
    pub fn process_bar(&mut self, bar: &Bar, history: &[Bar]) -> BarResult {
        match self.step(bar, history) {
            Ok(result) => result,
            Err(err) => {
                match &err {
                    StrategyError::InsufficientHistory {
                        required,
                        available,
                    } => warn!(required, available, "insufficient history"),
                    other => error!(error = %other, "bar rejected"),
                }
                BarResult::failed(self.state.snapshot(), err)
            }
        }
    }

    fn step(&mut self, bar: &Bar, history: &[Bar]) -> Result<BarResult, StrategyError> {
        self.roll_session(bar, history);

        let missing = bar.missing_fields();
        if !missing.is_empty() {
            return Err(StrategyError::Validation(format!(
                "Bar is missing required fields: {}",
                missing.join(", ")
            )));
        }
        if history.len() < self.required_history {
            return Err(StrategyError::InsufficientHistory {
                required: self.required_history,
                available: history.len(),
            });
        }

        // Non-finite history values stay in the window as undefined points
        let window = BarWindow::new(history).trailing(self.required_history);

        self.state.bar_index += 1;
        let aggregate = self.state.aggregate_profit();
        self.state.day.observe(aggregate);
        debug!(
            bar_index = self.state.bar_index,
            timestamp = %bar.timestamp,
            open = bar.open,
            high = bar.high,
            low = bar.low,
            close = bar.close,
            volume = bar.volume,
            "bar"
        );

        if bar.timestamp.timestamp() <= self.config.activation_unix_time {
            return Ok(BarResult::quiet(self.state.snapshot()));
        }

        let indicators = self.indicators.refresh(window)?;
        self.update_gates(bar, &indicators);

        let mut result = BarResult::quiet(StateSnapshot::default());
        let position_open = !self.state.position.is_flat();

        if entry_allowed(&self.state, bar.close) {
            self.try_entry(bar, &indicators, &mut result);
        }
        if position_open {
            self.try_exit(bar, &indicators, &mut result);
        }

        result.state = self.state.snapshot();
        if let (Some(signal), Some(order)) = (result.signal, &result.order_details) {
            info!(%signal, %order, "signal");
        }
        if self.state.bar_index % STATE_LOG_INTERVAL == 0 {
            debug!(state = %result.state, "state summary");
        }
        Ok(result)
    }

    /// Day reset when `bar` opens a later session than the last bar seen.
    /// Runs before validation, so a rejected boundary bar still rolls the day.
    fn roll_session(&mut self, bar: &Bar, history: &[Bar]) {
        let previous = self.state.last_session.or_else(|| {
            history
                .len()
                .checked_sub(2)
                .map(|i| self.clock.session_date(history[i].timestamp))
        });
        if previous.is_some_and(|date| self.clock.is_new_session(date, bar.timestamp)) {
            self.state.day_reset();
        }
        let session = self.clock.session_date(bar.timestamp);
        self.state.last_session = Some(previous.map_or(session, |date| date.max(session)));
    }

    /// Trend, trailing memory, MA, pivot and volume flags for this bar.
    fn update_gates(&mut self, bar: &Bar, indicators: &IndicatorSnapshot) {
        let state = &mut self.state;
        let trend = indicators.trend();
        state.up_trend = trend.up_trend;
        state.dn_trend = trend.dn_trend;

        if let Some(value) = indicators.trailing.value {
            state.trailing_stop = Some(value);
        }

        (state.long_ma, state.short_ma) = match (indicators.ema, indicators.rma) {
            (Some(ema), Some(rma)) => (
                bar.close > bar.open && ema > rma && bar.close > ema,
                bar.close < bar.open && ema < rma && bar.close < ema,
            ),
            _ => (false, false),
        };

        state.pivots = indicators.pivots;

        let affordable = self.config.effective_balance() / bar.close;
        state.volume_ok = bar.volume >= indicators.volume_mean
            && bar.volume > affordable * self.config.volume_multiplier;
    }

    fn try_entry(&mut self, bar: &Bar, indicators: &IndicatorSnapshot, result: &mut BarResult) {
        let Some(side) = entry_side(&self.config, bar, indicators, &self.state) else {
            return;
        };
        let Some(trailing_value) = indicators.trailing.value else {
            return;
        };

        match plan_entry(&self.config, &self.sizer, side, bar.close, trailing_value) {
            Ok(plan) => {
                let order = entry_order(&self.config, &plan, bar);
                apply_entry(&mut self.state, &plan);
                let (label, signal) = match side {
                    EntrySide::Long => ("LONG", Signal::Buy),
                    EntrySide::Short => ("SHORT", Signal::Sell),
                };
                result.alerts.push(format!(
                    "{label} ENTRY: qty={}, stop={:.2}, target={:.2}",
                    plan.quantity, plan.stop, plan.target
                ));
                result.signal = Some(signal);
                result.order_details = Some(order);
            }
            Err(err) => {
                error!(side = side.label(), error = %err, "entry construction failed");
                result
                    .alerts
                    .push(format!("ERROR: {} entry failed - {}", side.label(), err));
            }
        }
    }

    fn try_exit(&mut self, bar: &Bar, indicators: &IndicatorSnapshot, result: &mut BarResult) {
        let Some(reason) = evaluate_exit(&self.config, bar, &mut self.state, indicators.rsi) else {
            return;
        };
        let uptrend = indicators.trailing.direction == TrendDirection::Up || self.state.up_trend;
        let order = close_all_order(&self.config, bar, reason, uptrend);
        apply_exit(&mut self.state, reason, bar.close);
        result.alerts.push(format!("EXIT: {reason}"));
        result.signal = Some(Signal::CloseAll);
        result.order_details = Some(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn config() -> StrategyConfig {
        StrategyConfig {
            activation_unix_time: 0,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let bad = StrategyConfig {
            reward_risk_ratio: 0.0,
            ..Default::default()
        };
        assert!(SupertrendStrategy::new(bad).is_err());
    }

    #[test]
    fn short_history_is_reported_not_raised() {
        let mut strategy = SupertrendStrategy::new(config()).unwrap();
        let bars = make_bars(&[100.0; 10]);
        let result = strategy.process_bar(&bars[9], &bars);
        assert_eq!(
            result.error_message().as_deref(),
            Some("Insufficient historical data")
        );
        assert!(result.signal.is_none());
        assert_eq!(result.state.bar_index, 0);
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let mut strategy = SupertrendStrategy::new(config()).unwrap();
        let bars = make_bars(&[100.0; 80]);
        let mut bad = bars[79];
        bad.close = f64::NAN;
        let result = strategy.process_bar(&bad, &bars);
        assert!(matches!(result.error, Some(StrategyError::Validation(_))));

        // A bad history bar is an undefined point, not a rejection
        let mut history = bars.clone();
        history[70].volume = f64::NAN;
        let result = strategy.process_bar(&bars[79], &history);
        assert!(result.is_ok());
        assert_eq!(result.state.bar_index, 1);
    }

    #[test]
    fn stale_history_beyond_window_is_ignored() {
        let mut strategy = SupertrendStrategy::new(config()).unwrap();
        let mut bars = make_bars(&[100.0; 80]);
        bars[0].high = f64::NAN;
        let result = strategy.process_bar(&bars[79], &bars);
        assert!(result.is_ok());
        assert_eq!(result.state.bar_index, 1);
    }

    #[test]
    fn activation_gate_only_snapshots() {
        let mut strategy = SupertrendStrategy::new(StrategyConfig::default()).unwrap();
        let bars = make_bars(&[100.0; 80]);
        let result = strategy.process_bar(&bars[79], &bars);
        assert!(result.is_ok());
        assert!(result.signal.is_none());
        assert_eq!(result.state.bar_index, 1);
        assert!(strategy.state().trailing_stop.is_none());
    }

    #[test]
    fn remembers_trailing_stop_after_activation() {
        let mut strategy = SupertrendStrategy::new(config()).unwrap();
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64 * 0.5).collect();
        let bars = make_bars(&closes);
        let result = strategy.process_bar(&bars[79], &bars);
        assert!(result.is_ok());
        assert!(result.state.trailing_stop.is_some());
        assert!(result.state.up_trend);
        assert!(strategy.price_update_order(&bars[79], "trail").is_some());
    }

    #[test]
    fn update_pnl_feeds_daily_total() {
        let mut strategy = SupertrendStrategy::new(config()).unwrap();
        let bars = make_bars(&[100.0; 80]);
        strategy.update_pnl(40.0, 10.0);
        let result = strategy.process_bar(&bars[79], &bars);
        assert_eq!(result.state.daily_net_profit, 50.0);
    }

    #[test]
    fn live_buffer_fills_to_required_history() {
        let mut strategy = SupertrendStrategy::new(config()).unwrap();
        let mut buffer = strategy.buffer();
        let bars = make_bars(&[100.0; 70]);
        let mut results = Vec::new();
        for bar in &bars {
            results.push(strategy.on_bar(&mut buffer, *bar));
        }
        let required = strategy.required_history();
        assert!(results[required - 2].error.is_some());
        assert!(results[required - 1].is_ok());
        assert!(buffer.is_full());
    }
}
