//! Market state and transactional write buffer
//!
//! `MarketStore` is the committed state. Every mutating operation runs
//! against a `StoreTx` that reads through to the committed state and buffers
//! its own writes; the buffer is applied only when the whole operation
//! succeeded, so a failure at any step leaves no trace.

use hard_core::{Address, Denom};
use std::collections::BTreeMap;

use crate::aggregates::Aggregates;
use crate::error::MarketResult;
use crate::interest::InterestFactors;
use crate::params::Params;
use crate::positions::{Borrow, Deposit};

/// Committed money market state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketStore {
    pub(crate) params: Params,
    pub(crate) factors: BTreeMap<Denom, InterestFactors>,
    pub(crate) deposits: BTreeMap<Address, BTreeMap<Denom, Deposit>>,
    pub(crate) borrows: BTreeMap<Address, Borrow>,
    pub(crate) totals: Aggregates,
}

impl MarketStore {
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn factors(&self, denom: &Denom) -> Option<&InterestFactors> {
        self.factors.get(denom)
    }

    pub fn totals(&self) -> &Aggregates {
        &self.totals
    }

    pub fn deposit(&self, owner: &Address, denom: &Denom) -> Option<&Deposit> {
        self.deposits.get(owner).and_then(|m| m.get(denom))
    }

    pub fn borrow(&self, owner: &Address) -> Option<&Borrow> {
        self.borrows.get(owner)
    }

    /// Every deposit, ordered by (owner, denom)
    pub fn deposits(&self) -> impl Iterator<Item = &Deposit> {
        self.deposits.values().flat_map(|m| m.values())
    }

    /// Every borrow, ordered by owner
    pub fn borrows(&self) -> impl Iterator<Item = &Borrow> {
        self.borrows.values()
    }

    fn apply(&mut self, writes: StoreWrites) {
        if let Some(params) = writes.params {
            self.params = params;
        }
        self.factors.extend(writes.factors);

        for ((owner, denom), deposit) in writes.deposits {
            match deposit {
                Some(deposit) => {
                    self.deposits.entry(owner).or_default().insert(denom, deposit);
                }
                None => {
                    if let Some(by_denom) = self.deposits.get_mut(&owner) {
                        by_denom.remove(&denom);
                        if by_denom.is_empty() {
                            self.deposits.remove(&owner);
                        }
                    }
                }
            }
        }

        for (owner, borrow) in writes.borrows {
            match borrow {
                Some(borrow) => {
                    self.borrows.insert(owner, borrow);
                }
                None => {
                    self.borrows.remove(&owner);
                }
            }
        }

        if let Some(totals) = writes.totals {
            self.totals = totals;
        }
    }
}

/// Buffered writes of one transaction; `None` entries are deletions
#[derive(Debug, Default)]
struct StoreWrites {
    params: Option<Params>,
    factors: BTreeMap<Denom, InterestFactors>,
    deposits: BTreeMap<(Address, Denom), Option<Deposit>>,
    borrows: BTreeMap<Address, Option<Borrow>>,
    totals: Option<Aggregates>,
}

/// Read-through view with buffered writes
pub struct StoreTx<'a> {
    base: &'a MarketStore,
    writes: StoreWrites,
}

impl<'a> StoreTx<'a> {
    fn new(base: &'a MarketStore) -> Self {
        Self {
            base,
            writes: StoreWrites::default(),
        }
    }

    pub fn params(&self) -> &Params {
        self.writes.params.as_ref().unwrap_or(&self.base.params)
    }

    pub fn set_params(&mut self, params: Params) {
        self.writes.params = Some(params);
    }

    pub fn factors(&self, denom: &Denom) -> Option<InterestFactors> {
        self.writes
            .factors
            .get(denom)
            .or_else(|| self.base.factors.get(denom))
            .cloned()
    }

    pub fn set_factors(&mut self, denom: &Denom, factors: InterestFactors) {
        self.writes.factors.insert(denom.clone(), factors);
    }

    pub fn totals(&self) -> &Aggregates {
        self.writes.totals.as_ref().unwrap_or(&self.base.totals)
    }

    pub fn totals_mut(&mut self) -> &mut Aggregates {
        let base = &self.base.totals;
        self.writes.totals.get_or_insert_with(|| base.clone())
    }

    pub fn deposit(&self, owner: &Address, denom: &Denom) -> Option<Deposit> {
        match self.writes.deposits.get(&(owner.clone(), denom.clone())) {
            Some(buffered) => buffered.clone(),
            None => self.base.deposit(owner, denom).cloned(),
        }
    }

    /// Write a deposit, deleting it when its principal is zero
    pub fn set_deposit(&mut self, deposit: Deposit) {
        let key = (deposit.depositor.clone(), deposit.denom().clone());
        let value = if deposit.amount.is_zero() {
            None
        } else {
            Some(deposit)
        };
        self.writes.deposits.insert(key, value);
    }

    /// An owner's deposits as seen by this transaction, ordered by denom
    pub fn deposits_of(&self, owner: &Address) -> Vec<Deposit> {
        let mut merged: BTreeMap<Denom, Deposit> =
            self.base.deposits.get(owner).cloned().unwrap_or_default();
        for ((o, denom), buffered) in &self.writes.deposits {
            if o != owner {
                continue;
            }
            match buffered {
                Some(deposit) => {
                    merged.insert(denom.clone(), deposit.clone());
                }
                None => {
                    merged.remove(denom);
                }
            }
        }
        merged.into_values().collect()
    }

    pub fn borrow(&self, owner: &Address) -> Option<Borrow> {
        match self.writes.borrows.get(owner) {
            Some(buffered) => buffered.clone(),
            None => self.base.borrow(owner).cloned(),
        }
    }

    /// Write a borrow, deleting it when every debt is repaid
    pub fn set_borrow(&mut self, borrow: Borrow) {
        let owner = borrow.borrower.clone();
        let value = if borrow.is_empty() { None } else { Some(borrow) };
        self.writes.borrows.insert(owner, value);
    }
}

/// Run `op` against a write buffer over `store`, committing only on success
pub fn transact<T>(
    store: &mut MarketStore,
    op: impl FnOnce(&mut StoreTx<'_>) -> MarketResult<T>,
) -> MarketResult<T> {
    let (value, writes) = {
        let mut tx = StoreTx::new(store);
        let value = op(&mut tx)?;
        (value, tx.writes)
    };
    store.apply(writes);
    Ok(value)
}

/// Run `op` against a write buffer over `store` and discard the writes
pub fn preview<T>(
    store: &MarketStore,
    op: impl FnOnce(&mut StoreTx<'_>) -> MarketResult<T>,
) -> MarketResult<T> {
    let mut tx = StoreTx::new(store);
    op(&mut tx)
}

/// Replace the committed state wholesale (genesis import)
pub(crate) fn replace(store: &mut MarketStore, next: MarketStore) {
    *store = next;
}
