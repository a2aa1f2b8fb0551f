//! Coins - Denom-keyed sets of amounts
//!
//! `Coins` holds whole raw units (account balances, positions, payouts).
//! `DecCoins` holds non-negative decimals (module-wide aggregates, pending
//! reward accruals) so fractional interest is never dropped.
//!
//! Both are kept sorted by denom with no zero entries, which makes their
//! serialized form canonical.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::amount::{Amount, AmountError};
use crate::denom::{Denom, DenomError};

/// Errors from coin parsing and arithmetic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinError {
    #[error("Invalid coin string: {0}")]
    InvalidCoin(String),

    #[error(transparent)]
    Denom(#[from] DenomError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("Duplicate denom in coin set: {0}")]
    DuplicateDenom(Denom),

    #[error("Negative amount for {denom}: {amount}")]
    Negative { denom: Denom, amount: Decimal },

    #[error("Arithmetic overflow for {0}")]
    Overflow(Denom),
}

/// A single amount of one denom
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: Denom,
    pub amount: Amount,
}

impl Coin {
    pub fn new(denom: Denom, amount: Amount) -> Self {
        Self { denom, amount }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Parses the `<amount><denom>` form, e.g. `100bnb`
impl FromStr for Coin {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .filter(|&i| i > 0)
            .ok_or_else(|| CoinError::InvalidCoin(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        let amount = Decimal::from_str(amount).map_err(|_| CoinError::InvalidCoin(s.to_string()))?;
        Ok(Coin::new(denom.parse()?, Amount::new(amount)?))
    }
}

/// A decimal amount of one denom (serialized form of `DecCoins` entries)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: Denom,
    pub amount: Decimal,
}

/// Sorted set of whole-unit coins without zero entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(BTreeMap<Denom, Amount>);

impl Coins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Amount of a denom (zero if absent)
    pub fn amount_of(&self, denom: &Denom) -> Amount {
        self.0.get(denom).copied().unwrap_or(Amount::ZERO)
    }

    /// Add a coin, merging with any existing amount
    pub fn add(&mut self, coin: &Coin) -> Result<(), CoinError> {
        if coin.is_zero() {
            return Ok(());
        }
        let current = self.amount_of(&coin.denom);
        let sum = current
            .checked_add(&coin.amount)
            .ok_or_else(|| CoinError::Overflow(coin.denom.clone()))?;
        self.0.insert(coin.denom.clone(), sum);
        Ok(())
    }

    /// Subtract a coin; fails without mutating if the result would be negative
    pub fn sub(&mut self, coin: &Coin) -> Result<(), CoinError> {
        let current = self.amount_of(&coin.denom);
        let rest = current.checked_sub(&coin.amount).ok_or_else(|| CoinError::Negative {
            denom: coin.denom.clone(),
            amount: current.value() - coin.amount.value(),
        })?;
        self.set(coin.denom.clone(), rest);
        Ok(())
    }

    /// Overwrite the amount of a denom, removing it when zero
    pub fn set(&mut self, denom: Denom, amount: Amount) {
        if amount.is_zero() {
            self.0.remove(&denom);
        } else {
            self.0.insert(denom, amount);
        }
    }

    /// True when every coin in `other` is covered by `self`
    pub fn covers(&self, other: &Coins) -> bool {
        other.iter().all(|c| self.amount_of(&c.denom) >= c.amount)
    }

    pub fn denoms(&self) -> impl Iterator<Item = &Denom> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = Coin> + '_ {
        self.0.iter().map(|(d, a)| Coin::new(d.clone(), *a))
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        let mut coins = Coins::new();
        coins.set(coin.denom, coin.amount);
        coins
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = CoinError;

    fn try_from(list: Vec<Coin>) -> Result<Self, Self::Error> {
        let mut coins = Coins::new();
        for coin in list {
            if coins.0.contains_key(&coin.denom) {
                return Err(CoinError::DuplicateDenom(coin.denom));
            }
            coins.set(coin.denom, coin.amount);
        }
        Ok(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins
            .0
            .into_iter()
            .map(|(denom, amount)| Coin { denom, amount })
            .collect()
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Sorted set of non-negative decimal amounts without zero entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DecCoin>", into = "Vec<DecCoin>")]
pub struct DecCoins(BTreeMap<Denom, Decimal>);

impl DecCoins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Amount of a denom (zero if absent)
    pub fn amount_of(&self, denom: &Denom) -> Decimal {
        self.0.get(denom).copied().unwrap_or(Decimal::ZERO)
    }

    /// Apply a signed delta to a denom.
    ///
    /// Fails without mutating if the result would be negative or overflow.
    pub fn adjust(&mut self, denom: &Denom, delta: Decimal) -> Result<Decimal, CoinError> {
        let current = self.amount_of(denom);
        let next = current
            .checked_add(delta)
            .ok_or_else(|| CoinError::Overflow(denom.clone()))?;
        if next < Decimal::ZERO {
            return Err(CoinError::Negative {
                denom: denom.clone(),
                amount: next,
            });
        }
        self.set(denom.clone(), next);
        Ok(next)
    }

    /// Overwrite the amount of a denom, removing it when zero
    pub fn set(&mut self, denom: Denom, amount: Decimal) {
        if amount.is_zero() {
            self.0.remove(&denom);
        } else {
            self.0.insert(denom, amount.normalize());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Denom, Decimal)> {
        self.0.iter().map(|(d, a)| (d, *a))
    }
}

impl From<&Coins> for DecCoins {
    fn from(coins: &Coins) -> Self {
        let mut out = DecCoins::new();
        for coin in coins.iter() {
            out.set(coin.denom, coin.amount.value());
        }
        out
    }
}

impl TryFrom<Vec<DecCoin>> for DecCoins {
    type Error = CoinError;

    fn try_from(list: Vec<DecCoin>) -> Result<Self, Self::Error> {
        let mut coins = DecCoins::new();
        for coin in list {
            if coins.0.contains_key(&coin.denom) {
                return Err(CoinError::DuplicateDenom(coin.denom));
            }
            if coin.amount < Decimal::ZERO {
                return Err(CoinError::Negative {
                    denom: coin.denom,
                    amount: coin.amount,
                });
            }
            coins.set(coin.denom, coin.amount);
        }
        Ok(coins)
    }
}

impl From<DecCoins> for Vec<DecCoin> {
    fn from(coins: DecCoins) -> Self {
        coins
            .0
            .into_iter()
            .map(|(denom, amount)| DecCoin { denom, amount })
            .collect()
    }
}
