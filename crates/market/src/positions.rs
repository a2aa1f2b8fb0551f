//! Position records
//!
//! Positions store raw principal plus a factor snapshot. The exact value is
//! `principal * current / snapshot` and the live balance is its truncation,
//! so interest is realized lazily whenever the owner interacts.
//!
//! On a write the exact value is rebased onto a whole-unit principal; the
//! fraction below one unit is kept by lowering the snapshot instead of being
//! truncated away.

use hard_core::{Address, Amount, Coin, Coins, Denom};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{MarketError, MarketResult};

/// Supplied collateral of one denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub depositor: Address,
    pub amount: Coin,
    /// Supply interest factor when `amount` was last written
    pub index: Decimal,
}

impl Deposit {
    pub fn new(depositor: Address, amount: Coin, index: Decimal) -> Self {
        Self {
            depositor,
            amount,
            index,
        }
    }

    pub fn denom(&self) -> &Denom {
        &self.amount.denom
    }

    /// Balance including interest up to `current_factor`
    pub fn live_balance(&self, current_factor: Decimal) -> MarketResult<Amount> {
        normalize(self.amount.amount, self.index, current_factor)
    }

    /// Untruncated balance at `current_factor`
    pub fn exact_balance(&self, current_factor: Decimal) -> MarketResult<Decimal> {
        exact_value(self.amount.amount, self.index, current_factor)
    }
}

/// All debt of one borrower, one principal and snapshot per denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrow {
    pub borrower: Address,
    pub amount: Coins,
    /// Borrow interest factor per denom when its principal was last written
    pub index: BTreeMap<Denom, Decimal>,
}

impl Borrow {
    pub fn new(borrower: Address) -> Self {
        Self {
            borrower,
            amount: Coins::new(),
            index: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_empty()
    }

    /// Debt of `denom` including interest up to `current_factor`
    pub fn live_balance(&self, denom: &Denom, current_factor: Decimal) -> MarketResult<Amount> {
        let exact = self.exact_balance(denom, current_factor)?;
        Amount::from_decimal_trunc(exact).map_err(|e| MarketError::InvalidAmount(e.to_string()))
    }

    /// Untruncated debt of `denom` at `current_factor`
    pub fn exact_balance(&self, denom: &Denom, current_factor: Decimal) -> MarketResult<Decimal> {
        let principal = self.amount.amount_of(denom);
        if principal.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let snapshot = self
            .index
            .get(denom)
            .copied()
            .ok_or_else(|| {
                MarketError::CorruptPosition(format!("{} has no {denom} borrow index", self.borrower))
            })?;
        exact_value(principal, snapshot, current_factor)
    }

    /// Overwrite one denom's principal and snapshot, dropping it at zero
    pub fn set_position(&mut self, denom: &Denom, principal: Amount, factor: Decimal) {
        self.amount.set(denom.clone(), principal);
        if principal.is_zero() {
            self.index.remove(denom);
        } else {
            self.index.insert(denom.clone(), factor);
        }
    }
}

/// `trunc(principal * current / snapshot)`
pub fn normalize(principal: Amount, snapshot: Decimal, current: Decimal) -> MarketResult<Amount> {
    let exact = exact_value(principal, snapshot, current)?;
    Amount::from_decimal_trunc(exact).map_err(|e| MarketError::InvalidAmount(e.to_string()))
}

/// `principal * current / snapshot`
pub fn exact_value(principal: Amount, snapshot: Decimal, current: Decimal) -> MarketResult<Decimal> {
    if snapshot <= Decimal::ZERO {
        return Err(MarketError::CorruptPosition(format!(
            "non-positive interest index {snapshot}"
        )));
    }
    principal
        .value()
        .checked_mul(current)
        .and_then(|v| v.checked_div(snapshot))
        .ok_or(MarketError::ArithmeticOverflow("position normalization"))
}

/// Split an exact value at `current` into a whole-unit principal and the
/// snapshot that reproduces the value from it.
///
/// A value below one unit rebases to a zero principal; the caller decides
/// what happens to that remainder.
pub fn rebase(value: Decimal, current: Decimal) -> MarketResult<(Amount, Decimal)> {
    let principal =
        Amount::from_decimal_trunc(value).map_err(|e| MarketError::InvalidAmount(e.to_string()))?;
    if principal.is_zero() || principal.value() == value {
        return Ok((principal, current));
    }
    let snapshot = current
        .checked_mul(principal.value())
        .and_then(|v| v.checked_div(value))
        .ok_or(MarketError::ArithmeticOverflow("position rebase"))?;
    Ok((principal, snapshot))
}
