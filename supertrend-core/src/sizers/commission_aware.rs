//! Commission-Aware Risk Sizer
//!
//! Two passes: size against the risk budget, estimate the commission that
//! quantity would pay, then size again with the commission taken out of the
//! budget.

use tracing::debug;

use super::{QtyType, Sizer, SizingError, SizingOutcome, SizingRequest};

/// Commission-aware risk sizer
///
/// # Formula
/// ```text
/// per_share_risk = |entry - stop|
/// tolerated_risk = |risk% / 100 * balance - min_commission|
/// cap            = affordability cap (floor(balance / entry) by default)
/// preliminary    = floor(min(tolerated_risk / per_share_risk, cap))
/// commission     = min(max(preliminary * rate, min_commission), preliminary * entry * cap_fraction)
/// quantity       = round(min((tolerated_risk - commission) / per_share_risk, cap))
/// ```
///
/// `round` sends exact halves to the even share (2.5 -> 2, 3.5 -> 4).
///
/// # Example
/// - Entry $100, stop $98, risk 1 %, balance $50,000, min commission $1
/// - Tolerated risk: $499, preliminary: 249 shares
/// - Commission: 249 * 0.005 = $1.245
/// - Quantity: round((499 - 1.245) / 2) = 249 shares
#[derive(Debug, Clone)]
pub struct CommissionAwareSizer {
    min_commission: f64,
    /// Dollars per share.
    commission_rate: f64,
    /// Commission ceiling as a fraction of trade value (0.01 = 1 %).
    commission_cap_fraction: f64,
    qty_type: QtyType,
    qty_value: f64,
}

impl CommissionAwareSizer {
    pub fn new(min_commission: f64, commission_rate: f64, commission_cap_fraction: f64) -> Self {
        Self {
            min_commission,
            commission_rate,
            commission_cap_fraction,
            qty_type: QtyType::PercentOfEquity,
            qty_value: 100.0,
        }
    }

    pub fn with_quantity_cap(mut self, qty_type: QtyType, qty_value: f64) -> Self {
        self.qty_type = qty_type;
        self.qty_value = qty_value;
        self
    }

    /// Commission for `quantity` shares at `price`.
    ///
    /// The trade-value ceiling wins over the minimum when they conflict.
    pub fn commission(&self, quantity: f64, price: f64) -> f64 {
        (quantity * self.commission_rate)
            .max(self.min_commission)
            .min(quantity * price * self.commission_cap_fraction)
    }
}

impl Default for CommissionAwareSizer {
    fn default() -> Self {
        Self::new(1.0, 0.005, 0.01)
    }
}

impl Sizer for CommissionAwareSizer {
    fn size(&self, request: &SizingRequest) -> Result<SizingOutcome, SizingError> {
        let entry = request.entry_price;
        if !(entry.is_finite() && entry > 0.0) {
            return Err(SizingError::InvalidPrice(entry));
        }
        let balance = request.account_balance;
        if !(balance.is_finite() && balance > 0.0) {
            return Err(SizingError::InvalidBalance(balance));
        }
        let per_share_risk = (entry - request.stop_price).abs();
        if !(per_share_risk.is_finite() && per_share_risk > 0.0) {
            return Err(SizingError::InvalidRisk(per_share_risk));
        }

        let tolerated_risk =
            (request.risk_percentage / 100.0 * balance - self.min_commission).abs();
        let cap = self.qty_type.max_shares(self.qty_value, balance, entry);

        let preliminary_quantity = (tolerated_risk / per_share_risk).min(cap).floor();
        let commission = self.commission(preliminary_quantity, entry);
        let quantity =
            round_half_even(((tolerated_risk - commission) / per_share_risk).min(cap)) as i64;

        debug!(
            per_share_risk,
            tolerated_risk,
            preliminary_quantity,
            commission,
            quantity,
            "sized position"
        );

        if quantity <= 0 {
            return Err(SizingError::NotViable { quantity });
        }

        Ok(SizingOutcome {
            per_share_risk,
            tolerated_risk,
            preliminary_quantity,
            commission,
            quantity,
        })
    }

    fn name(&self) -> &str {
        "commission_aware"
    }
}

/// Nearest integer, ties to even.
fn round_half_even(value: f64) -> f64 {
    if (value - value.trunc()).abs() == 0.5 {
        2.0 * (value / 2.0).round()
    } else {
        value.round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(entry: f64, stop: f64, risk: f64, balance: f64) -> SizingRequest {
        SizingRequest {
            entry_price: entry,
            stop_price: stop,
            risk_percentage: risk,
            account_balance: balance,
        }
    }

    #[test]
    fn reference_sizing_case() {
        let outcome = CommissionAwareSizer::default()
            .size(&request(100.0, 98.0, 1.0, 50_000.0))
            .unwrap();
        assert_eq!(outcome.per_share_risk, 2.0);
        assert_eq!(outcome.tolerated_risk, 499.0);
        assert_eq!(outcome.preliminary_quantity, 249.0);
        assert!((outcome.commission - 1.245).abs() < 1e-12);
        assert_eq!(outcome.quantity, 249);
    }

    #[test]
    fn short_side_uses_absolute_risk() {
        let long = CommissionAwareSizer::default()
            .size(&request(100.0, 98.0, 1.0, 50_000.0))
            .unwrap();
        let short = CommissionAwareSizer::default()
            .size(&request(100.0, 102.0, 1.0, 50_000.0))
            .unwrap();
        assert_eq!(long.quantity, short.quantity);
    }

    #[test]
    fn affordability_caps_tight_stops() {
        // $0.01 risk would allow ~49,900 shares; balance only buys 500
        let outcome = CommissionAwareSizer::default()
            .size(&request(100.0, 99.99, 1.0, 50_000.0))
            .unwrap();
        assert_eq!(outcome.preliminary_quantity, 500.0);
        assert_eq!(outcome.quantity, 500);
    }

    #[test]
    fn fixed_cap() {
        let sizer = CommissionAwareSizer::default().with_quantity_cap(QtyType::Fixed, 100.0);
        let outcome = sizer.size(&request(100.0, 98.0, 1.0, 50_000.0)).unwrap();
        assert_eq!(outcome.quantity, 100);
    }

    #[test]
    fn exact_halves_round_to_even() {
        // Commission-free: $100 or $140 of risk over $40 per share
        let sizer = CommissionAwareSizer::new(0.0, 0.0, 0.01);
        let outcome = sizer.size(&request(50.0, 10.0, 1.0, 10_000.0)).unwrap();
        assert_eq!(outcome.quantity, 2);
        let outcome = sizer.size(&request(50.0, 10.0, 1.0, 14_000.0)).unwrap();
        assert_eq!(outcome.quantity, 4);

        assert_eq!(round_half_even(2.4), 2.0);
        assert_eq!(round_half_even(2.6), 3.0);
        assert_eq!(round_half_even(-2.5), -2.0);
    }

    #[test]
    fn non_viable_is_not_rounded_up() {
        // Risk budget $1 - $1 min commission → nothing left
        let err = CommissionAwareSizer::default()
            .size(&request(100.0, 90.0, 1.0, 100.0))
            .unwrap_err();
        assert!(matches!(err, SizingError::NotViable { quantity } if quantity <= 0));
    }

    #[test]
    fn commission_cap_beats_minimum() {
        let sizer = CommissionAwareSizer::default();
        // 10 shares at $5: rate gives 0.05, min lifts to 1.0, cap is 0.5
        assert_eq!(sizer.commission(10.0, 5.0), 0.5);
        // 1000 shares at $100: 5.0 within [1, 1000]
        assert_eq!(sizer.commission(1000.0, 100.0), 5.0);
        assert_eq!(sizer.commission(0.0, 100.0), 0.0);
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let sizer = CommissionAwareSizer::default();
        assert!(matches!(
            sizer.size(&request(100.0, 100.0, 1.0, 50_000.0)),
            Err(SizingError::InvalidRisk(_))
        ));
        assert!(matches!(
            sizer.size(&request(0.0, -1.0, 1.0, 50_000.0)),
            Err(SizingError::InvalidPrice(_))
        ));
        assert!(matches!(
            sizer.size(&request(100.0, 98.0, 1.0, 0.0)),
            Err(SizingError::InvalidBalance(_))
        ));
        assert!(matches!(
            sizer.size(&request(100.0, f64::NAN, 1.0, 50_000.0)),
            Err(SizingError::InvalidRisk(_))
        ));
    }
}
