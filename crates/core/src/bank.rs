//! Token movement collaborator
//!
//! The money market never moves value itself; it asks a `Bank` to do so.
//! Implementations must apply each call atomically: a failed `send` leaves
//! every balance untouched.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::address::Address;
use crate::amount::Amount;
use crate::coins::{Coin, CoinError, Coins};
use crate::denom::Denom;

/// Bank errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("Insufficient funds in {account}: has {available}, needs {required}")]
    InsufficientFunds {
        account: String,
        available: String,
        required: String,
    },

    #[error("Module account not found: {0}")]
    UnknownModuleAccount(String),

    #[error(transparent)]
    Coin(#[from] CoinError),
}

/// Who holds a balance: an end user or a protocol-owned module account
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountId {
    User(Address),
    Module(String),
}

impl AccountId {
    pub fn module(name: impl Into<String>) -> Self {
        AccountId::Module(name.into())
    }
}

impl From<Address> for AccountId {
    fn from(addr: Address) -> Self {
        AccountId::User(addr)
    }
}

impl From<&Address> for AccountId {
    fn from(addr: &Address) -> Self {
        AccountId::User(addr.clone())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountId::User(addr) => write!(f, "{}", addr),
            AccountId::Module(name) => write!(f, "module:{}", name),
        }
    }
}

/// Bank trait - token transfer and account existence
///
/// Implementations can be:
/// - InMemoryBank: For tests and the standalone host
/// - a bridge to the chain's real bank module
pub trait Bank {
    /// Move coins between accounts; all-or-nothing
    fn send(&mut self, from: &AccountId, to: &AccountId, coins: &Coins) -> Result<(), BankError>;

    /// Create new coins directly in a module account
    fn mint_to_escrow(&mut self, module: &str, coins: &Coins) -> Result<(), BankError>;

    /// Destroy coins held by a module account
    fn burn_from_escrow(&mut self, module: &str, coins: &Coins) -> Result<(), BankError>;

    /// Spendable balance of one denom
    fn balance(&self, account: &AccountId, denom: &Denom) -> Amount;

    /// Whether a named module account has been registered
    fn account_exists(&self, module: &str) -> bool;

    /// Convenience wrapper for single-coin sends
    fn send_coin(&mut self, from: &AccountId, to: &AccountId, coin: &Coin) -> Result<(), BankError> {
        self.send(from, to, &Coins::from(coin.clone()))
    }
}

/// In-memory bank
///
/// Stores balances per account. Module accounts must be registered before
/// they can hold funds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryBank {
    balances: BTreeMap<AccountId, Coins>,
    modules: BTreeSet<String>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module account
    pub fn register_module(&mut self, name: impl Into<String>) {
        self.modules.insert(name.into());
    }

    /// Builder-style variant of `register_module`
    pub fn with_module(mut self, name: impl Into<String>) -> Self {
        self.register_module(name);
        self
    }

    /// Credit coins out of thin air (test funding, genesis balances)
    pub fn fund(&mut self, account: &AccountId, coins: &Coins) -> Result<(), BankError> {
        self.check_module(account)?;
        let mut next = self.all_balances(account);
        for coin in coins.iter() {
            next.add(&coin)?;
        }
        self.balances.insert(account.clone(), next);
        Ok(())
    }

    /// All balances of an account
    pub fn all_balances(&self, account: &AccountId) -> Coins {
        self.balances.get(account).cloned().unwrap_or_default()
    }

    fn check_module(&self, account: &AccountId) -> Result<(), BankError> {
        match account {
            AccountId::Module(name) if !self.modules.contains(name) => {
                Err(BankError::UnknownModuleAccount(name.clone()))
            }
            _ => Ok(()),
        }
    }

    fn debit(&self, account: &AccountId, coins: &Coins) -> Result<Coins, BankError> {
        let mut next = self.all_balances(account);
        for coin in coins.iter() {
            let available = next.amount_of(&coin.denom);
            next.sub(&coin).map_err(|_| BankError::InsufficientFunds {
                account: account.to_string(),
                available: Coin::new(coin.denom.clone(), available).to_string(),
                required: coin.to_string(),
            })?;
        }
        Ok(next)
    }

    fn store(&mut self, account: &AccountId, coins: Coins) {
        if coins.is_empty() {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), coins);
        }
    }
}

impl Bank for InMemoryBank {
    fn send(&mut self, from: &AccountId, to: &AccountId, coins: &Coins) -> Result<(), BankError> {
        self.check_module(from)?;
        self.check_module(to)?;

        // Compute both sides before writing either
        let from_next = self.debit(from, coins)?;
        let mut to_next = if from == to {
            from_next.clone()
        } else {
            self.all_balances(to)
        };
        for coin in coins.iter() {
            to_next.add(&coin)?;
        }

        self.store(from, from_next);
        self.store(to, to_next);
        Ok(())
    }

    fn mint_to_escrow(&mut self, module: &str, coins: &Coins) -> Result<(), BankError> {
        self.fund(&AccountId::module(module), coins)
    }

    fn burn_from_escrow(&mut self, module: &str, coins: &Coins) -> Result<(), BankError> {
        let account = AccountId::module(module);
        self.check_module(&account)?;
        let next = self.debit(&account, coins)?;
        self.store(&account, next);
        Ok(())
    }

    fn balance(&self, account: &AccountId, denom: &Denom) -> Amount {
        self.balances
            .get(account)
            .map(|c| c.amount_of(denom))
            .unwrap_or(Amount::ZERO)
    }

    fn account_exists(&self, module: &str) -> bool {
        self.modules.contains(module)
    }
}
