//! Aggregate Tracker
//!
//! Module-wide totals per denom. Pure additive bookkeeping; the accrual
//! engine and the position ledger are its only writers.

use hard_core::{CoinError, DecCoins, Denom};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AggregateKind, MarketError, MarketResult};

/// Total supplied, borrowed and reserved, keyed by denom
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    pub total_supplied: DecCoins,
    pub total_borrowed: DecCoins,
    pub total_reserves: DecCoins,
}

impl Aggregates {
    pub fn supplied(&self, denom: &Denom) -> Decimal {
        self.total_supplied.amount_of(denom)
    }

    pub fn borrowed(&self, denom: &Denom) -> Decimal {
        self.total_borrowed.amount_of(denom)
    }

    pub fn reserves(&self, denom: &Denom) -> Decimal {
        self.total_reserves.amount_of(denom)
    }

    pub fn adjust_supplied(&mut self, denom: &Denom, delta: Decimal) -> MarketResult<Decimal> {
        adjust(&mut self.total_supplied, AggregateKind::Supplied, denom, delta)
    }

    pub fn adjust_borrowed(&mut self, denom: &Denom, delta: Decimal) -> MarketResult<Decimal> {
        adjust(&mut self.total_borrowed, AggregateKind::Borrowed, denom, delta)
    }

    pub fn adjust_reserves(&mut self, denom: &Denom, delta: Decimal) -> MarketResult<Decimal> {
        adjust(&mut self.total_reserves, AggregateKind::Reserves, denom, delta)
    }
}

fn adjust(
    totals: &mut DecCoins,
    kind: AggregateKind,
    denom: &Denom,
    delta: Decimal,
) -> MarketResult<Decimal> {
    totals.adjust(denom, delta).map_err(|e| match e {
        CoinError::Negative { amount, .. } => {
            tracing::error!(%kind, %denom, %amount, "aggregate would become negative");
            MarketError::NegativeAggregate {
                kind,
                denom: denom.clone(),
                amount: amount.to_string(),
            }
        }
        _ => MarketError::ArithmeticOverflow("aggregate adjustment"),
    })
}
