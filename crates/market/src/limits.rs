//! Borrow limit checks
//!
//! Collateral and debt are valued in the price feed's quote asset:
//! `amount / conversion_factor * price`. Only collateral-enabled deposits
//! count, each scaled by its market's loan-to-value.

use hard_core::{Address, Amount, Denom, PriceFeed};
use rust_decimal::Decimal;

use crate::error::{MarketError, MarketResult};
use crate::interest::InterestFactors;
use crate::params::{MoneyMarket, Params};
use crate::store::StoreTx;

/// Collateral and debt value of one owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Valuation {
    pub borrow_limit: Decimal,
    pub debt_value: Decimal,
}

/// Value the owner's positions as currently seen by `tx`.
///
/// Factors of every denom involved must already be accrued.
pub fn valuation(
    tx: &StoreTx<'_>,
    prices: &dyn PriceFeed,
    owner: &Address,
) -> MarketResult<Valuation> {
    let params = tx.params();
    let mut borrow_limit = Decimal::ZERO;
    let mut debt_value = Decimal::ZERO;

    for deposit in tx.deposits_of(owner) {
        let market = market_for(params, deposit.denom())?;
        if !market.borrow_limit.collateral_enabled {
            continue;
        }
        let factor = current_factor(tx, deposit.denom(), |f| f.supply_interest_factor);
        let value = usd_value(market, deposit.live_balance(factor)?, prices)?;
        let limit = value
            .checked_mul(market.borrow_limit.loan_to_value)
            .ok_or(MarketError::ArithmeticOverflow("borrow limit"))?;
        borrow_limit = borrow_limit
            .checked_add(limit)
            .ok_or(MarketError::ArithmeticOverflow("borrow limit"))?;
    }

    if let Some(borrow) = tx.borrow(owner) {
        for denom in borrow.amount.denoms() {
            let market = market_for(params, denom)?;
            let factor = current_factor(tx, denom, |f| f.borrow_interest_factor);
            let value = usd_value(market, borrow.live_balance(denom, factor)?, prices)?;
            debt_value = debt_value
                .checked_add(value)
                .ok_or(MarketError::ArithmeticOverflow("debt value"))?;
        }
    }

    Ok(Valuation {
        borrow_limit,
        debt_value,
    })
}

/// Fail with `BorrowLimitExceeded` when the owner's debt outgrows collateral
pub fn check_borrow_limit(
    tx: &StoreTx<'_>,
    prices: &dyn PriceFeed,
    owner: &Address,
) -> MarketResult<()> {
    // No debt, nothing to check and no prices needed
    if tx.borrow(owner).is_none() {
        return Ok(());
    }
    let Valuation {
        borrow_limit,
        debt_value,
    } = valuation(tx, prices, owner)?;
    if debt_value > borrow_limit {
        return Err(MarketError::BorrowLimitExceeded {
            debt_value: debt_value.normalize().to_string(),
            limit: borrow_limit.normalize().to_string(),
        });
    }
    Ok(())
}

fn market_for<'p>(params: &'p Params, denom: &Denom) -> MarketResult<&'p MoneyMarket> {
    params
        .money_market(denom)
        .ok_or_else(|| MarketError::UnknownCollateralType(denom.clone()))
}

fn current_factor(
    tx: &StoreTx<'_>,
    denom: &Denom,
    pick: impl Fn(&InterestFactors) -> Decimal,
) -> Decimal {
    tx.factors(denom).map(|f| pick(&f)).unwrap_or(Decimal::ONE)
}

fn usd_value(market: &MoneyMarket, amount: Amount, prices: &dyn PriceFeed) -> MarketResult<Decimal> {
    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let price = prices.price(&market.price_pair_key)?;
    amount
        .value()
        .checked_div(market.conversion_factor.value())
        .and_then(|units| units.checked_mul(price))
        .ok_or(MarketError::ArithmeticOverflow("position value"))
}
