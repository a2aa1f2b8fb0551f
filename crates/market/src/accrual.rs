//! Interest Factor Accrual Engine
//!
//! Advances one collateral type's factors to `now` and books the interest
//! into the module totals. Runs inside a `StoreTx`, so a failure part way
//! through leaves the committed state untouched.

use chrono::{DateTime, Utc};
use hard_core::Denom;
use rust_decimal::Decimal;
use tracing::{debug, error};

use crate::config::MarketConfig;
use crate::error::{MarketError, MarketResult};
use crate::interest::{borrow_rate, interest_multiplier, round_factor, utilization, InterestFactors};
use crate::store::StoreTx;

/// Accrue interest for `denom` up to `now` and return the current factors.
///
/// A missing factors entry is initialized to identity at `now`. A zero
/// elapsed interval is a no-op.
pub fn accrue(
    tx: &mut StoreTx<'_>,
    config: &MarketConfig,
    denom: &Denom,
    now: DateTime<Utc>,
) -> MarketResult<InterestFactors> {
    let market = tx
        .params()
        .money_market(denom)
        .cloned()
        .ok_or_else(|| MarketError::UnknownCollateralType(denom.clone()))?;

    let Some(previous) = tx.factors(denom) else {
        let initial = InterestFactors::initial(now);
        tx.set_factors(denom, initial.clone());
        return Ok(initial);
    };

    if now < previous.previous_accrual_time {
        error!(
            %denom,
            previous = %previous.previous_accrual_time,
            %now,
            "accrual time moved backwards"
        );
        return Err(MarketError::InvalidTimeOrdering {
            denom: denom.clone(),
            previous: previous.previous_accrual_time,
            now,
        });
    }

    let elapsed = (now - previous.previous_accrual_time).num_seconds();
    if elapsed == 0 {
        return Ok(previous);
    }

    let totals = tx.totals();
    let supplied = totals.supplied(denom);
    let borrowed = totals.borrowed(denom);

    let rate = borrow_rate(&market.interest_rate_model, utilization(supplied, borrowed))
        .ok_or(MarketError::ArithmeticOverflow("borrow rate"))?;
    let multiplier = interest_multiplier(rate, elapsed, config.seconds_per_year)
        .ok_or(MarketError::ArithmeticOverflow("interest multiplier"))?;

    let borrow_factor = previous
        .borrow_interest_factor
        .checked_mul(multiplier)
        .map(round_factor)
        .ok_or(MarketError::ArithmeticOverflow("borrow interest factor"))?;

    // Interest realized by the rounded factor, so totals never outgrow positions
    let interest = borrowed
        .checked_mul(borrow_factor)
        .and_then(|v| v.checked_div(previous.borrow_interest_factor))
        .and_then(|v| v.checked_sub(borrowed))
        .ok_or(MarketError::ArithmeticOverflow("borrow interest"))?;

    let (reserves, supplier_share) = if supplied > Decimal::ZERO {
        let reserves = interest
            .checked_mul(market.reserve_factor)
            .ok_or(MarketError::ArithmeticOverflow("reserve share"))?;
        (reserves, interest - reserves)
    } else {
        (interest, Decimal::ZERO)
    };

    let supply_factor = if supplier_share > Decimal::ZERO {
        supplier_share
            .checked_div(supplied)
            .and_then(|ratio| Decimal::ONE.checked_add(ratio))
            .and_then(|m| previous.supply_interest_factor.checked_mul(m))
            .map(round_factor)
            .ok_or(MarketError::ArithmeticOverflow("supply interest factor"))?
    } else {
        previous.supply_interest_factor
    };

    let totals = tx.totals_mut();
    totals.adjust_borrowed(denom, interest)?;
    totals.adjust_reserves(denom, reserves)?;
    totals.adjust_supplied(denom, supplier_share)?;

    let next = InterestFactors {
        supply_interest_factor: supply_factor,
        borrow_interest_factor: borrow_factor,
        previous_accrual_time: now,
    };
    tx.set_factors(denom, next.clone());

    debug!(
        %denom,
        elapsed,
        %rate,
        %interest,
        %reserves,
        supply_factor = %next.supply_interest_factor,
        borrow_factor = %next.borrow_interest_factor,
        "interest accrued"
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BorrowLimit, InterestRateModel, MoneyMarket, Params};
    use crate::store::{transact, MarketStore};
    use chrono::{Duration, TimeZone};
    use hard_core::Amount;
    use rust_decimal_macros::dec;

    fn bnb() -> Denom {
        "bnb".parse().unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
    }

    fn store_with(supplied: Decimal, borrowed: Decimal) -> MarketStore {
        let mut store = MarketStore::default();
        transact(&mut store, |tx| {
            tx.set_params(Params::new(vec![MoneyMarket::new(
                bnb(),
                BorrowLimit::new(true, dec!(0.5), dec!(0.6)),
                "bnb:usd",
                Amount::from_units(100_000_000),
                Amount::ZERO,
                InterestRateModel::new(dec!(0.05), dec!(2), dec!(0.8), dec!(10)),
                dec!(0.05),
                dec!(0.02),
            )]));
            tx.set_factors(&bnb(), InterestFactors::initial(t0()));
            tx.totals_mut().adjust_supplied(&bnb(), supplied)?;
            tx.totals_mut().adjust_borrowed(&bnb(), borrowed)?;
            Ok(())
        })
        .unwrap();
        store
    }

    fn run(store: &mut MarketStore, now: DateTime<Utc>) -> MarketResult<InterestFactors> {
        let config = MarketConfig::default();
        transact(store, |tx| accrue(tx, &config, &bnb(), now))
    }

    #[test]
    fn test_one_day_at_half_utilization() {
        let mut store = store_with(dec!(1000), dec!(500));
        let factors = run(&mut store, t0() + Duration::days(1)).unwrap();

        // 1.05 / 365
        let increase = factors.borrow_interest_factor - Decimal::ONE;
        assert!((increase - dec!(0.002876712328767123)).abs() < dec!(0.000000000000000002));

        let interest = store.totals().borrowed(&bnb()) - dec!(500);
        let reserves = store.totals().reserves(&bnb());
        assert_eq!(reserves, interest * dec!(0.05));
        assert_eq!(
            store.totals().supplied(&bnb()),
            dec!(1000) + interest - reserves
        );
        assert!(factors.supply_interest_factor > Decimal::ONE);
    }

    #[test]
    fn test_idempotent_at_same_time() {
        let mut store = store_with(dec!(1000), dec!(500));
        let now = t0() + Duration::hours(3);
        let first = run(&mut store, now).unwrap();
        let snapshot = store.clone();

        let second = run(&mut store, now).unwrap();
        assert_eq!(first, second);
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_backwards_time_is_fatal() {
        let mut store = store_with(dec!(1000), dec!(500));
        run(&mut store, t0() + Duration::hours(1)).unwrap();
        let snapshot = store.clone();

        let err = run(&mut store, t0()).unwrap_err();
        assert!(matches!(err, MarketError::InvalidTimeOrdering { .. }));
        assert!(err.is_fatal());
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_no_suppliers_sends_interest_to_reserves() {
        let mut store = store_with(Decimal::ZERO, dec!(100));
        let factors = run(&mut store, t0() + Duration::days(30)).unwrap();

        assert_eq!(factors.supply_interest_factor, Decimal::ONE);
        assert!(factors.borrow_interest_factor > Decimal::ONE);
        let interest = store.totals().borrowed(&bnb()) - dec!(100);
        assert_eq!(store.totals().reserves(&bnb()), interest);
        assert_eq!(store.totals().supplied(&bnb()), Decimal::ZERO);
    }

    #[test]
    fn test_factors_never_decrease() {
        let mut store = store_with(dec!(1000), dec!(900));
        let mut last = InterestFactors::initial(t0());
        for step in [0, 1, 1, 59, 3_600, 86_400, 86_400 * 30] {
            let now = last.previous_accrual_time + Duration::seconds(step);
            let next = run(&mut store, now).unwrap();
            assert!(next.supply_interest_factor >= last.supply_interest_factor);
            assert!(next.borrow_interest_factor >= last.borrow_interest_factor);
            last = next;
        }
    }

    #[test]
    fn test_unknown_collateral_type() {
        let mut store = store_with(dec!(1000), dec!(500));
        let config = MarketConfig::default();
        let usdx: Denom = "usdx".parse().unwrap();
        let err = transact(&mut store, |tx| accrue(tx, &config, &usdx, t0())).unwrap_err();
        assert_eq!(err, MarketError::UnknownCollateralType(usdx));
    }

    #[test]
    fn test_missing_factors_lazily_initialized() {
        let mut store = store_with(dec!(1000), dec!(500));
        store.factors.clear();
        let now = t0() + Duration::days(3);
        let factors = run(&mut store, now).unwrap();
        assert_eq!(factors, InterestFactors::initial(now));
        assert_eq!(store.factors(&bnb()), Some(&InterestFactors::initial(now)));
    }
}
