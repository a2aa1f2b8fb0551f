//! Position Ledger
//!
//! Supply, withdraw, borrow and repay. Each operation accrues the markets it
//! touches, takes the position's exact value at the current factor, applies
//! the delta, rebases the result and mirrors the delta into the totals.
//! Tokens move last. All of it runs inside one `StoreTx`.
//!
//! A position that drops below one unit is closed; its leftover fraction is
//! removed from the matching total so the aggregate keeps tracking the
//! remaining positions.

use chrono::{DateTime, Utc};
use hard_core::{AccountId, Address, Amount, Bank, Coin, Denom, PriceFeed};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

use crate::accrual::accrue;
use crate::config::MarketConfig;
use crate::error::{MarketError, MarketResult};
use crate::limits::check_borrow_limit;
use crate::positions::{rebase, Borrow, Deposit};
use crate::store::StoreTx;

/// Collaborators and clock for one ledger operation
pub struct LedgerEnv<'a> {
    pub config: &'a MarketConfig,
    pub bank: &'a mut dyn Bank,
    pub now: DateTime<Utc>,
}

impl LedgerEnv<'_> {
    fn custody(&self) -> AccountId {
        AccountId::module(self.config.custody_account.as_str())
    }
}

/// Deposit `coin` from the owner's account into custody
pub fn supply(
    tx: &mut StoreTx<'_>,
    env: &mut LedgerEnv<'_>,
    owner: &Address,
    coin: &Coin,
) -> MarketResult<()> {
    validate(tx, coin)?;
    ensure_funds(env, owner, coin)?;

    let factors = accrue(tx, env.config, &coin.denom, env.now)?;
    let factor = factors.supply_interest_factor;

    let exact = match tx.deposit(owner, &coin.denom) {
        Some(existing) => existing.exact_balance(factor)?,
        None => Decimal::ZERO,
    };
    let (principal, snapshot) = rebase(add(exact, coin.amount)?, factor)?;
    tx.set_deposit(Deposit::new(
        owner.clone(),
        Coin::new(coin.denom.clone(), principal),
        snapshot,
    ));
    tx.totals_mut().adjust_supplied(&coin.denom, coin.amount.value())?;

    let custody = env.custody();
    env.bank.send_coin(&AccountId::from(owner), &custody, coin)?;
    Ok(())
}

/// Return `coin` of the owner's deposit from custody
pub fn withdraw(
    tx: &mut StoreTx<'_>,
    env: &mut LedgerEnv<'_>,
    prices: &dyn PriceFeed,
    owner: &Address,
    coin: &Coin,
) -> MarketResult<()> {
    validate(tx, coin)?;
    accrue_positions(tx, env, owner, &coin.denom)?;

    let deposit = tx
        .deposit(owner, &coin.denom)
        .ok_or_else(|| MarketError::DepositNotFound {
            owner: owner.to_string(),
            denom: coin.denom.clone(),
        })?;
    let factor = current_supply_factor(tx, &coin.denom);
    let exact = deposit.exact_balance(factor)?;
    let live = truncate(exact)?;
    if live < coin.amount {
        return Err(MarketError::ExcessWithdrawal {
            denom: coin.denom.clone(),
            requested: coin.amount.to_string(),
            available: live.to_string(),
        });
    }

    let (principal, snapshot) = rebase(exact - coin.amount.value(), factor)?;
    tx.set_deposit(Deposit::new(
        owner.clone(),
        Coin::new(coin.denom.clone(), principal),
        snapshot,
    ));
    let mut released = coin.amount.value();
    if principal.is_zero() {
        released += dust(tx.totals().supplied(&coin.denom), released, exact);
    }
    tx.totals_mut().adjust_supplied(&coin.denom, -released)?;

    check_borrow_limit(tx, prices, owner)?;
    ensure_liquidity(env, coin)?;

    let custody = env.custody();
    env.bank.send_coin(&custody, &AccountId::from(owner), coin)?;
    Ok(())
}

/// Lend `coin` from custody to the owner against their collateral
pub fn borrow(
    tx: &mut StoreTx<'_>,
    env: &mut LedgerEnv<'_>,
    prices: &dyn PriceFeed,
    owner: &Address,
    coin: &Coin,
) -> MarketResult<()> {
    validate(tx, coin)?;
    accrue_positions(tx, env, owner, &coin.denom)?;
    ensure_liquidity(env, coin)?;

    let factor = current_borrow_factor(tx, &coin.denom);
    let mut position = tx.borrow(owner).unwrap_or_else(|| Borrow::new(owner.clone()));
    let exact = position.exact_balance(&coin.denom, factor)?;
    let (principal, snapshot) = rebase(add(exact, coin.amount)?, factor)?;
    position.set_position(&coin.denom, principal, snapshot);
    tx.set_borrow(position);

    let proposed = tx
        .totals_mut()
        .adjust_borrowed(&coin.denom, coin.amount.value())?;
    let max = tx
        .params()
        .money_market(&coin.denom)
        .map(|mm| mm.max_borrow_limit)
        .unwrap_or(Amount::ZERO);
    if !max.is_zero() && proposed > max.value() {
        return Err(MarketError::MaxBorrowLimitExceeded {
            denom: coin.denom.clone(),
            proposed: proposed.to_string(),
            max: max.to_string(),
        });
    }

    check_borrow_limit(tx, prices, owner)?;

    let custody = env.custody();
    env.bank.send_coin(&custody, &AccountId::from(owner), coin)?;
    Ok(())
}

/// Pay back `coin` of the owner's debt into custody
pub fn repay(
    tx: &mut StoreTx<'_>,
    env: &mut LedgerEnv<'_>,
    owner: &Address,
    coin: &Coin,
) -> MarketResult<()> {
    validate(tx, coin)?;
    accrue_positions(tx, env, owner, &coin.denom)?;

    let mut position = tx
        .borrow(owner)
        .filter(|b| !b.amount.amount_of(&coin.denom).is_zero())
        .ok_or_else(|| MarketError::BorrowNotFound(format!("{owner} ({})", coin.denom)))?;
    let factor = current_borrow_factor(tx, &coin.denom);
    let exact = position.exact_balance(&coin.denom, factor)?;
    let owed = truncate(exact)?;
    if owed < coin.amount {
        return Err(MarketError::ExcessRepayment {
            denom: coin.denom.clone(),
            requested: coin.amount.to_string(),
            owed: owed.to_string(),
        });
    }
    ensure_funds(env, owner, coin)?;

    let (principal, snapshot) = rebase(exact - coin.amount.value(), factor)?;
    position.set_position(&coin.denom, principal, snapshot);
    tx.set_borrow(position);
    // debt below one unit is forgiven
    let mut released = coin.amount.value();
    if principal.is_zero() {
        released += dust(tx.totals().borrowed(&coin.denom), released, exact);
    }
    tx.totals_mut().adjust_borrowed(&coin.denom, -released)?;

    let custody = env.custody();
    env.bank.send_coin(&AccountId::from(owner), &custody, coin)?;
    Ok(())
}

/// Accrue `denom` and every market the owner holds a position in, so
/// balances and limits see current factors.
fn accrue_positions(
    tx: &mut StoreTx<'_>,
    env: &LedgerEnv<'_>,
    owner: &Address,
    denom: &Denom,
) -> MarketResult<()> {
    let mut denoms: BTreeSet<Denom> = tx
        .deposits_of(owner)
        .into_iter()
        .map(|d| d.amount.denom)
        .collect();
    if let Some(borrow) = tx.borrow(owner) {
        denoms.extend(borrow.amount.denoms().cloned());
    }
    denoms.insert(denom.clone());

    for denom in &denoms {
        accrue(tx, env.config, denom, env.now)?;
    }
    Ok(())
}

fn validate(tx: &StoreTx<'_>, coin: &Coin) -> MarketResult<()> {
    if coin.amount.is_zero() {
        return Err(MarketError::InvalidAmount(format!("{coin} must be positive")));
    }
    if tx.params().money_market(&coin.denom).is_none() {
        return Err(MarketError::UnknownCollateralType(coin.denom.clone()));
    }
    Ok(())
}

fn ensure_funds(env: &LedgerEnv<'_>, owner: &Address, coin: &Coin) -> MarketResult<()> {
    let available = env.bank.balance(&AccountId::from(owner), &coin.denom);
    if available < coin.amount {
        return Err(MarketError::InsufficientBalance {
            account: owner.to_string(),
            reason: format!("has {}{}, needs {}", available, coin.denom, coin),
        });
    }
    Ok(())
}

fn ensure_liquidity(env: &LedgerEnv<'_>, coin: &Coin) -> MarketResult<()> {
    let available = env.bank.balance(&env.custody(), &coin.denom);
    if available < coin.amount {
        return Err(MarketError::InsufficientLiquidity {
            denom: coin.denom.clone(),
            available: available.to_string(),
            requested: coin.amount.to_string(),
        });
    }
    Ok(())
}

fn current_supply_factor(tx: &StoreTx<'_>, denom: &Denom) -> Decimal {
    tx.factors(denom)
        .map(|f| f.supply_interest_factor)
        .unwrap_or(Decimal::ONE)
}

fn current_borrow_factor(tx: &StoreTx<'_>, denom: &Denom) -> Decimal {
    tx.factors(denom)
        .map(|f| f.borrow_interest_factor)
        .unwrap_or(Decimal::ONE)
}

fn add(exact: Decimal, amount: Amount) -> MarketResult<Decimal> {
    exact
        .checked_add(amount.value())
        .ok_or(MarketError::ArithmeticOverflow("position principal"))
}

fn truncate(exact: Decimal) -> MarketResult<Amount> {
    Amount::from_decimal_trunc(exact).map_err(|e| MarketError::InvalidAmount(e.to_string()))
}

/// Fraction left in a closed position, capped at what the total still holds
/// after `released` comes out.
fn dust(total: Decimal, released: Decimal, exact: Decimal) -> Decimal {
    let left = (total - released).max(Decimal::ZERO);
    (exact - released).max(Decimal::ZERO).min(left)
}
