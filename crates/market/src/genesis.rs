//! Money market genesis bundle
//!
//! The snapshot/restore interchange format: params, one accumulation time
//! per collateral type, every live position and the module totals.
//! `validate` reports every structural problem at once.

use chrono::{DateTime, Utc};
use hard_core::{Address, DecCoins, Denom};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::GenesisValidationError;
use crate::interest::InterestFactors;
use crate::params::Params;
use crate::positions::{normalize, Borrow, Deposit};

/// Export form of one collateral type's interest factors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccumulationTime {
    pub collateral_type: Denom,
    pub previous_accumulation_time: DateTime<Utc>,
    pub supply_interest_factor: Decimal,
    pub borrow_interest_factor: Decimal,
}

impl GenesisAccumulationTime {
    pub fn from_factors(collateral_type: Denom, factors: &InterestFactors) -> Self {
        Self {
            collateral_type,
            previous_accumulation_time: factors.previous_accrual_time,
            supply_interest_factor: factors.supply_interest_factor,
            borrow_interest_factor: factors.borrow_interest_factor,
        }
    }

    pub fn factors(&self) -> InterestFactors {
        InterestFactors {
            supply_interest_factor: self.supply_interest_factor,
            borrow_interest_factor: self.borrow_interest_factor,
            previous_accrual_time: self.previous_accumulation_time,
        }
    }
}

/// Complete money market state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    #[serde(default)]
    pub previous_accumulation_times: Vec<GenesisAccumulationTime>,
    #[serde(default)]
    pub deposits: Vec<Deposit>,
    #[serde(default)]
    pub borrows: Vec<Borrow>,
    #[serde(default)]
    pub total_supplied: DecCoins,
    #[serde(default)]
    pub total_borrowed: DecCoins,
    #[serde(default)]
    pub total_reserves: DecCoins,
}

impl GenesisState {
    /// Fail with every problem found, or succeed when there are none
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(GenesisValidationError { problems })
        }
    }

    /// Every structural problem in this bundle
    pub fn problems(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .params
            .problems()
            .into_iter()
            .map(|p| format!("params: {p}"))
            .collect();

        let factors = self.check_accumulation_times(&mut out);
        let live_supplied = self.check_deposits(&factors, &mut out);
        let live_borrowed = self.check_borrows(&factors, &mut out);

        check_totals("total supplied", &live_supplied, &self.total_supplied, &mut out);
        check_totals("total borrowed", &live_borrowed, &self.total_borrowed, &mut out);
        out
    }

    fn check_accumulation_times(&self, out: &mut Vec<String>) -> BTreeMap<Denom, InterestFactors> {
        let mut factors = BTreeMap::new();
        for gat in &self.previous_accumulation_times {
            let denom = &gat.collateral_type;
            if factors.contains_key(denom) {
                out.push(format!("duplicate accumulation time for {denom}"));
                continue;
            }
            if self.params.money_market(denom).is_none() {
                out.push(format!("accumulation time for unknown collateral type {denom}"));
            }
            if gat.supply_interest_factor < Decimal::ONE {
                out.push(format!(
                    "{denom}: supply interest factor below 1: {}",
                    gat.supply_interest_factor
                ));
            }
            if gat.borrow_interest_factor < Decimal::ONE {
                out.push(format!(
                    "{denom}: borrow interest factor below 1: {}",
                    gat.borrow_interest_factor
                ));
            }
            factors.insert(denom.clone(), gat.factors());
        }
        factors
    }

    fn check_deposits(
        &self,
        factors: &BTreeMap<Denom, InterestFactors>,
        out: &mut Vec<String>,
    ) -> BTreeMap<Denom, Decimal> {
        let mut seen: BTreeSet<(&Address, &Denom)> = BTreeSet::new();
        let mut live: BTreeMap<Denom, Decimal> = BTreeMap::new();

        for deposit in &self.deposits {
            let owner = &deposit.depositor;
            let denom = deposit.denom();
            if !seen.insert((owner, denom)) {
                out.push(format!("duplicate deposit of {denom} for {owner}"));
                continue;
            }
            if deposit.amount.is_zero() {
                out.push(format!("zero deposit of {denom} for {owner}"));
            }
            if self.params.money_market(denom).is_none() {
                out.push(format!("deposit of unknown collateral type {denom} for {owner}"));
                continue;
            }
            let current = factors
                .get(denom)
                .map(|f| f.supply_interest_factor)
                .unwrap_or(Decimal::ONE);
            if !index_in_range(deposit.index, current) {
                out.push(format!(
                    "deposit of {denom} for {owner}: index {} outside (0, {current}]",
                    deposit.index
                ));
                continue;
            }
            if let Ok(balance) = normalize(deposit.amount.amount, deposit.index, current) {
                tally(&mut live, denom, balance.value(), out);
            }
        }
        live
    }

    fn check_borrows(
        &self,
        factors: &BTreeMap<Denom, InterestFactors>,
        out: &mut Vec<String>,
    ) -> BTreeMap<Denom, Decimal> {
        let mut seen: BTreeSet<&Address> = BTreeSet::new();
        let mut live: BTreeMap<Denom, Decimal> = BTreeMap::new();

        for borrow in &self.borrows {
            let owner = &borrow.borrower;
            if !seen.insert(owner) {
                out.push(format!("duplicate borrow for {owner}"));
                continue;
            }
            if borrow.is_empty() {
                out.push(format!("empty borrow for {owner}"));
            }
            for denom in borrow.index.keys() {
                if borrow.amount.amount_of(denom).is_zero() {
                    out.push(format!("borrow for {owner} has an index for {denom} without debt"));
                }
            }
            for coin in borrow.amount.iter() {
                let denom = &coin.denom;
                if self.params.money_market(denom).is_none() {
                    out.push(format!("borrow of unknown collateral type {denom} for {owner}"));
                    continue;
                }
                let Some(&index) = borrow.index.get(denom) else {
                    out.push(format!("borrow of {denom} for {owner} has no index"));
                    continue;
                };
                let current = factors
                    .get(denom)
                    .map(|f| f.borrow_interest_factor)
                    .unwrap_or(Decimal::ONE);
                if !index_in_range(index, current) {
                    out.push(format!(
                        "borrow of {denom} for {owner}: index {index} outside (0, {current}]"
                    ));
                    continue;
                }
                if let Ok(balance) = normalize(coin.amount, index, current) {
                    tally(&mut live, denom, balance.value(), out);
                }
            }
        }
        live
    }
}

/// Snapshots sit in (0, current]; rebased positions carry one below 1
fn index_in_range(index: Decimal, current: Decimal) -> bool {
    index > Decimal::ZERO && index <= current
}

fn tally(live: &mut BTreeMap<Denom, Decimal>, denom: &Denom, value: Decimal, out: &mut Vec<String>) {
    let sum = live.entry(denom.clone()).or_default();
    match sum.checked_add(value) {
        Some(next) => *sum = next,
        None if *sum == Decimal::MAX => {}
        None => {
            out.push(format!("overflow summing positions of {denom}"));
            *sum = Decimal::MAX;
        }
    }
}

fn check_totals(
    name: &str,
    live: &BTreeMap<Denom, Decimal>,
    totals: &DecCoins,
    out: &mut Vec<String>,
) {
    for (denom, sum) in live {
        let total = totals.amount_of(denom);
        if *sum > total {
            out.push(format!(
                "{name} of {denom} is {total}, below the sum of positions {sum}"
            ));
        }
    }
}
