//! Per-bar indicator refresh.
//!
//! Every indicator is recomputed from scratch over the trimmed trailing
//! window; nothing carries over between bars except what the engine state
//! stores explicitly.

use tracing::debug;

use super::config::StrategyConfig;
use crate::domain::BarWindow;
use crate::error::StrategyError;
use crate::indicators::series::{defined, last_defined, mean};
use crate::indicators::{
    pivot_levels, Ema, Indicator, IndicatorError, PivotLevels, Rma, Rsi, Supertrend,
    SupertrendPoint, TrendDirection,
};

/// Trend confirmation from the three confirmation Supertrends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrendFlags {
    pub up_trend: bool,
    pub dn_trend: bool,
}

/// Unanimous Up → `up_trend`, unanimous Down → `dn_trend`. Should both ever
/// hold, `up_trend` wins and clears `dn_trend`.
pub fn aggregate_trend(directions: &[TrendDirection]) -> TrendFlags {
    let up_trend = directions.iter().all(|d| *d == TrendDirection::Up);
    let dn_trend = directions.iter().all(|d| *d == TrendDirection::Down);
    TrendFlags {
        up_trend,
        dn_trend: dn_trend && !up_trend,
    }
}

/// Indicator readings at the current bar (and the previous one where a
/// transition matters).
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub main: SupertrendPoint,
    pub main_prev: SupertrendPoint,
    pub confirmation: [TrendDirection; 3],
    pub trailing: SupertrendPoint,
    pub ema: Option<f64>,
    pub rma: Option<f64>,
    pub rsi: Option<f64>,
    pub pivots: PivotLevels,
    pub volume_mean: f64,
}

impl IndicatorSnapshot {
    pub fn trend(&self) -> TrendFlags {
        aggregate_trend(&self.confirmation)
    }

    /// Main Supertrend turned Up on this bar.
    pub fn flipped_up(&self) -> bool {
        self.main_prev.direction == TrendDirection::Down
            && self.main.direction == TrendDirection::Up
    }

    /// Main Supertrend turned Down on this bar.
    pub fn flipped_down(&self) -> bool {
        self.main_prev.direction == TrendDirection::Up
            && self.main.direction == TrendDirection::Down
    }
}

/// Indicator instances, built once from a validated config.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    main: Supertrend,
    confirmation: [Supertrend; 3],
    trailing: Supertrend,
    ema: Ema,
    rma: Rma,
    rsi: Rsi,
    pivot_left: usize,
    pivot_right: usize,
    volume_period: usize,
}

impl IndicatorSet {
    pub fn from_config(config: &StrategyConfig) -> Result<Self, IndicatorError> {
        let tf = config.timeframe_multiplier();
        let [c1, c2, c3] = config.confirmation;
        Ok(Self {
            main: Supertrend::new(config.main.atr_period * tf, config.main.factor)?,
            confirmation: [
                Supertrend::new(c1.atr_period, c1.factor)?,
                Supertrend::new(c2.atr_period, c2.factor)?,
                Supertrend::new(c3.atr_period, c3.factor)?,
            ],
            trailing: Supertrend::new(config.trailing.atr_period * tf, config.trailing.factor)?,
            ema: Ema::new(config.ma_period * tf, config.source)?,
            rma: Rma::new(config.ma_period * tf, config.source)?,
            rsi: Rsi::new(config.rsi_period, config.rsi_smoothing, config.source)?,
            pivot_left: config.pivot_left,
            pivot_right: config.pivot_right,
            volume_period: config.volume_period * tf,
        })
    }

    pub fn refresh(&self, window: BarWindow<'_>) -> Result<IndicatorSnapshot, StrategyError> {
        let bars = window.bars();
        let empty = || StrategyError::Unexpected("empty indicator window".into());

        let main = self.main.series(bars);
        let trailing = self.trailing.series(bars);
        let mut confirmation = [TrendDirection::Down; 3];
        for (slot, st) in confirmation.iter_mut().zip(&self.confirmation) {
            *slot = st.series(bars).current().ok_or_else(empty)?.direction;
        }

        let last = |values: Vec<f64>| values.last().copied().and_then(defined);
        let volumes = window.trailing(self.volume_period).volumes();

        let snapshot = IndicatorSnapshot {
            main: main.current().ok_or_else(empty)?,
            main_prev: main.previous().ok_or_else(empty)?,
            confirmation,
            trailing: trailing.current().ok_or_else(empty)?,
            ema: last(self.ema.compute(bars)),
            rma: last(self.rma.compute(bars)),
            rsi: last(self.rsi.compute(bars)),
            pivots: pivot_levels(bars, self.pivot_left, self.pivot_right),
            volume_mean: mean(&volumes),
        };

        debug!(
            main = ?snapshot.main,
            trailing = ?snapshot.trailing,
            confirmation = ?snapshot.confirmation,
            ema = ?snapshot.ema,
            rma = ?snapshot.rma,
            rsi = ?snapshot.rsi,
            resistance = ?snapshot.pivots.resistance,
            support = ?snapshot.pivots.support,
            last_trailing = ?last_defined(trailing.values()),
            "indicators refreshed"
        );
        Ok(snapshot)
    }
}
