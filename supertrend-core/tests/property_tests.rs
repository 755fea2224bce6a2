//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Determinism: replaying the same bars yields identical results
//! 2. Supertrend flips exactly when close crosses the previous active band
//! 3. Supertrend is causal: a prefix computes the same values as the full series
//! 4. Sizing never exceeds the risk budget or the affordability cap
//! 5. RSI stays within [0, 100]
//! 6. Daily bookkeeping telescopes back to the last observed profit

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use supertrend_core::domain::Bar;
use supertrend_core::engine::{DayAccumulator, StrategyConfig, SupertrendParams, SupertrendStrategy};
use supertrend_core::indicators::{rsi, supertrend, RsiSmoothing, TrendDirection};
use supertrend_core::sizers::{CommissionAwareSizer, QtyType, Sizer, SizingError, SizingRequest};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk of bars: (close step, bar range, wick split, volume).
fn arb_bars(min: usize, max: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec(
        (-2.0..2.0_f64, 0.1..3.0_f64, 0.0..1.0_f64, 100.0..5000.0_f64),
        min..max,
    )
    .prop_map(|steps| {
        let start = Utc.with_ymd_and_hms(2025, 11, 3, 14, 30, 0).unwrap();
        let mut close = 100.0;
        steps
            .into_iter()
            .enumerate()
            .map(|(i, (step, range, split, volume))| {
                let open = close;
                close = (close + step).max(1.0);
                let body_high = open.max(close);
                let body_low = open.min(close);
                let high = body_high + range * split;
                let low = (body_low - range * (1.0 - split)).max(0.5);
                Bar::new(
                    start + Duration::minutes(i as i64),
                    open,
                    high,
                    low,
                    close,
                    volume,
                )
            })
            .collect()
    })
}

fn columns(bars: &[Bar]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    (
        bars.iter().map(|b| b.high).collect(),
        bars.iter().map(|b| b.low).collect(),
        bars.iter().map(|b| b.close).collect(),
    )
}

fn fast_config() -> StrategyConfig {
    StrategyConfig {
        activation_unix_time: 0,
        main: SupertrendParams::new(4, 1.0),
        confirmation: [
            SupertrendParams::new(4, 0.5),
            SupertrendParams::new(5, 1.0),
            SupertrendParams::new(6, 1.5),
        ],
        volume_multiplier: 0.0,
        ma_period: 4,
        rsi_period: 4,
        volume_period: 4,
        pivot_left: 2,
        pivot_right: 2,
        warmup_buffer: 8,
        use_trailing_stop: true,
        ..Default::default()
    }
}

// ── 1. Determinism ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Two fresh engines fed the same bars agree on every result.
    #[test]
    fn replay_is_deterministic(bars in arb_bars(20, 120)) {
        let mut a = SupertrendStrategy::new(fast_config()).unwrap();
        let mut b = SupertrendStrategy::new(fast_config()).unwrap();
        for i in 0..bars.len() {
            let ra = a.process_bar(&bars[i], &bars[..=i]);
            let rb = b.process_bar(&bars[i], &bars[..=i]);
            prop_assert_eq!(ra, rb);
        }
        prop_assert_eq!(a.state(), b.state());
    }

    /// A signal always carries a payload, and a quiet bar never does.
    #[test]
    fn payload_iff_signal(bars in arb_bars(20, 120)) {
        let mut strategy = SupertrendStrategy::new(fast_config()).unwrap();
        for i in 0..bars.len() {
            let result = strategy.process_bar(&bars[i], &bars[..=i]);
            prop_assert_eq!(result.signal.is_some(), result.order_details.is_some());
            let open = result.state.long_position || result.state.short_position;
            prop_assert_eq!(open, result.state.position_size != 0);
        }
    }
}

// ── 2–3. Supertrend ──────────────────────────────────────────────────

proptest! {
    /// Down → Up iff close > previous value (the upper band);
    /// Up → Down iff close < previous value (the lower band).
    #[test]
    fn supertrend_flips_on_band_cross(
        bars in arb_bars(2, 80),
        period in 1usize..8,
        factor in 0.5..4.0_f64,
    ) {
        let (high, low, close) = columns(&bars);
        let st = supertrend(&high, &low, &close, period, factor).unwrap();
        let values = st.values();
        let directions = st.directions();
        prop_assert_eq!(directions[0], TrendDirection::Down);

        for i in 1..bars.len() {
            let prev = values[i - 1];
            let expected = match directions[i - 1] {
                TrendDirection::Down if close[i] > prev => TrendDirection::Up,
                TrendDirection::Up if close[i] < prev => TrendDirection::Down,
                same => same,
            };
            prop_assert_eq!(directions[i], expected, "index {}", i);
        }
    }

    /// Values at index i never depend on bars after i.
    #[test]
    fn supertrend_is_causal(
        bars in arb_bars(10, 60),
        period in 1usize..6,
        cut in 1usize..10,
    ) {
        let (high, low, close) = columns(&bars);
        let full = supertrend(&high, &low, &close, period, 2.0).unwrap();
        let k = bars.len() - cut;
        let prefix = supertrend(&high[..k], &low[..k], &close[..k], period, 2.0).unwrap();
        prop_assert_eq!(&full.directions()[..k], prefix.directions());
        for (a, b) in full.values()[..k].iter().zip(prefix.values()) {
            prop_assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }
}

// ── 4. Sizing ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn sizing_respects_budget_and_cap(
        entry in 5.0..500.0_f64,
        stop_distance in 0.01..20.0_f64,
        risk in 0.1..5.0_f64,
        balance in 1_000.0..200_000.0_f64,
        short in any::<bool>(),
    ) {
        let stop = if short { entry + stop_distance } else { entry - stop_distance };
        let sizer = CommissionAwareSizer::default();
        let request = SizingRequest {
            entry_price: entry,
            stop_price: stop,
            risk_percentage: risk,
            account_balance: balance,
        };
        match sizer.size(&request) {
            Ok(outcome) => {
                let cap = QtyType::PercentOfEquity.max_shares(100.0, balance, entry);
                prop_assert!(outcome.quantity > 0);
                prop_assert!(outcome.quantity as f64 <= cap);
                let spend = outcome.quantity as f64 * outcome.per_share_risk;
                prop_assert!(
                    spend <= outcome.tolerated_risk - outcome.commission
                        + outcome.per_share_risk / 2.0 + 1e-9
                );
            }
            Err(SizingError::NotViable { quantity }) => prop_assert!(quantity <= 0),
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    /// A fixed share cap is never exceeded.
    #[test]
    fn fixed_cap_holds(
        entry in 5.0..50.0_f64,
        stop_distance in 0.01..1.0_f64,
        cap in 1.0..500.0_f64,
    ) {
        let sizer = CommissionAwareSizer::default().with_quantity_cap(QtyType::Fixed, cap);
        let request = SizingRequest {
            entry_price: entry,
            stop_price: entry - stop_distance,
            risk_percentage: 2.0,
            account_balance: 100_000.0,
        };
        if let Ok(outcome) = sizer.size(&request) {
            prop_assert!(outcome.quantity as f64 <= cap.floor());
        }
    }
}

// ── 5. RSI ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(
        bars in arb_bars(2, 80),
        period in 1usize..20,
        rma_smoothing in any::<bool>(),
    ) {
        let (_, _, close) = columns(&bars);
        let smoothing = if rma_smoothing { RsiSmoothing::Rma } else { RsiSmoothing::Sma };
        for value in rsi(&close, period, smoothing).into_iter().filter(|v| !v.is_nan()) {
            prop_assert!((0.0..=100.0).contains(&value), "rsi {}", value);
        }
    }
}

// ── 6. Daily bookkeeping ─────────────────────────────────────────────

proptest! {
    #[test]
    fn day_totals_sum_to_last_observation(
        ops in prop::collection::vec((-500.0..500.0_f64, any::<bool>()), 1..60),
    ) {
        let mut day = DayAccumulator::default();
        let mut last = 0.0;
        for (profit, close_day) in ops {
            if close_day {
                day.close_day();
            }
            day.observe(profit);
            last = profit;
        }
        let archived: f64 = day.trade_profits.iter().sum();
        prop_assert!((archived + day.daily_net_profit - last).abs() < 1e-6);
    }
}
