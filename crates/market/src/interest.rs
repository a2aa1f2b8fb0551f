//! Interest Rate Module
//!
//! Pure functions for the kinked borrow-rate curve and the per-interval
//! factor multiplier. The multiplier is the linear approximation
//! `1 + rate * dt / seconds_per_year`; it is applied consistently so every
//! replica computes identical factors.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::params::InterestRateModel;

/// Decimal places kept on interest factors
pub const FACTOR_PRECISION: u32 = 18;

/// Cumulative interest factors of one collateral type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestFactors {
    pub supply_interest_factor: Decimal,
    pub borrow_interest_factor: Decimal,
    pub previous_accrual_time: DateTime<Utc>,
}

impl InterestFactors {
    /// Identity factors anchored at `now` (a never-accrued market)
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            supply_interest_factor: Decimal::ONE,
            borrow_interest_factor: Decimal::ONE,
            previous_accrual_time: now,
        }
    }
}

/// Borrowed over supplied; zero when nothing is supplied
pub fn utilization(total_supplied: Decimal, total_borrowed: Decimal) -> Decimal {
    if total_supplied <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    total_borrowed
        .checked_div(total_supplied)
        .unwrap_or(Decimal::ZERO)
}

/// Annualized borrow rate at a utilization ratio; `None` on overflow
pub fn borrow_rate(model: &InterestRateModel, utilization: Decimal) -> Option<Decimal> {
    if utilization <= model.kink_utilization {
        let slope = model.multiplier.checked_mul(utilization)?;
        return model.base_rate.checked_add(slope);
    }
    let at_kink = model.multiplier.checked_mul(model.kink_utilization)?;
    let excess = utilization.checked_sub(model.kink_utilization)?;
    let jump = model.jump_multiplier.checked_mul(excess)?;
    model.base_rate.checked_add(at_kink)?.checked_add(jump)
}

/// Factor multiplier for `elapsed_seconds` at an annual rate.
///
/// Returns `None` on overflow or a zero-length year.
pub fn interest_multiplier(
    annual_rate: Decimal,
    elapsed_seconds: i64,
    seconds_per_year: u64,
) -> Option<Decimal> {
    if seconds_per_year == 0 {
        return None;
    }
    let scaled = annual_rate.checked_mul(Decimal::from(elapsed_seconds))?;
    let per_interval = scaled.checked_div(Decimal::from(seconds_per_year))?;
    Decimal::ONE.checked_add(per_interval)
}

/// Round a factor toward zero at `FACTOR_PRECISION` places
pub fn round_factor(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(FACTOR_PRECISION, RoundingStrategy::ToZero)
        .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bnb_model() -> InterestRateModel {
        InterestRateModel::new(dec!(0.05), dec!(2), dec!(0.8), dec!(10))
    }

    #[test]
    fn test_utilization() {
        assert_eq!(utilization(dec!(1000), dec!(500)), dec!(0.5));
        assert_eq!(utilization(Decimal::ZERO, dec!(500)), Decimal::ZERO);
    }

    #[test]
    fn test_borrow_rate_below_kink() {
        // 0.05 + 2 * 0.5
        assert_eq!(borrow_rate(&bnb_model(), dec!(0.5)), Some(dec!(1.05)));
        assert_eq!(borrow_rate(&bnb_model(), Decimal::ZERO), Some(dec!(0.05)));
    }

    #[test]
    fn test_borrow_rate_above_kink() {
        // 0.05 + 2 * 0.8 + 10 * 0.1
        assert_eq!(borrow_rate(&bnb_model(), dec!(0.9)), Some(dec!(2.65)));
    }

    #[test]
    fn test_borrow_rate_overflow_is_none() {
        let huge = dec!(70000000000000000000000000000);
        let model = InterestRateModel::new(huge, huge, dec!(0.8), dec!(10));
        assert_eq!(borrow_rate(&model, dec!(0.5)), None);

        let steep = InterestRateModel::new(dec!(0.05), dec!(2), dec!(0.8), huge);
        assert!(borrow_rate(&steep, dec!(0.9)).is_some());
        assert_eq!(borrow_rate(&steep, dec!(2)), None);
    }

    #[test]
    fn test_daily_multiplier() {
        let m = interest_multiplier(dec!(1.05), 86_400, 31_536_000).unwrap();
        let increase = m - Decimal::ONE;
        // 1.05 / 365
        assert!((increase - dec!(0.002876712328767)).abs() < dec!(0.000000000001));
    }

    #[test]
    fn test_zero_elapsed_is_identity() {
        assert_eq!(
            interest_multiplier(dec!(1.05), 0, 31_536_000),
            Some(Decimal::ONE)
        );
        assert_eq!(interest_multiplier(dec!(1.05), 10, 0), None);
    }

    #[test]
    fn test_round_factor_truncates() {
        let value = dec!(1.0000000000000000019);
        assert_eq!(round_factor(value), dec!(1.000000000000000001));
        assert_eq!(round_factor(dec!(1.50)).to_string(), "1.5");
    }
}
