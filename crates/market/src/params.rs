//! Money-market registry
//!
//! Static risk parameters per collateral type. Only changed through an
//! explicit parameter update, never by the engine itself.

use hard_core::{Amount, Denom};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Collateral rules for a money market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowLimit {
    /// Whether deposits of this denom count toward a borrower's limit
    pub collateral_enabled: bool,
    /// Fraction of collateral value that may be borrowed against, in [0, 1]
    pub loan_to_value: Decimal,
    /// Fraction of collateral value at which a position becomes liquidatable
    pub liquidation_threshold: Decimal,
}

impl BorrowLimit {
    pub fn new(
        collateral_enabled: bool,
        loan_to_value: Decimal,
        liquidation_threshold: Decimal,
    ) -> Self {
        Self {
            collateral_enabled,
            loan_to_value,
            liquidation_threshold,
        }
    }
}

/// Kinked linear interest rate curve (all values annualized)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRateModel {
    pub base_rate: Decimal,
    pub multiplier: Decimal,
    pub kink_utilization: Decimal,
    pub jump_multiplier: Decimal,
}

impl InterestRateModel {
    pub fn new(
        base_rate: Decimal,
        multiplier: Decimal,
        kink_utilization: Decimal,
        jump_multiplier: Decimal,
    ) -> Self {
        Self {
            base_rate,
            multiplier,
            kink_utilization,
            jump_multiplier,
        }
    }

    fn problems(&self, denom: &Denom, out: &mut Vec<String>) {
        for (name, value) in [
            ("base rate", self.base_rate),
            ("multiplier", self.multiplier),
            ("jump multiplier", self.jump_multiplier),
        ] {
            if value < Decimal::ZERO {
                out.push(format!("{denom}: {name} cannot be negative: {value}"));
            }
        }
        if !in_unit_interval(self.kink_utilization) {
            out.push(format!(
                "{denom}: kink utilization must be in [0, 1]: {}",
                self.kink_utilization
            ));
        }
    }
}

/// Parameters of one collateral type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyMarket {
    pub denom: Denom,
    pub borrow_limit: BorrowLimit,
    /// Price feed market id, e.g. `bnb:usd`
    pub price_pair_key: String,
    /// Raw units per whole token, used to value positions
    pub conversion_factor: Amount,
    /// Cap on total borrowed of this denom; zero means uncapped
    pub max_borrow_limit: Amount,
    pub interest_rate_model: InterestRateModel,
    /// Fraction of borrow interest kept as protocol reserves, in [0, 1]
    pub reserve_factor: Decimal,
    pub keeper_reward_percentage: Decimal,
}

impl MoneyMarket {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        denom: Denom,
        borrow_limit: BorrowLimit,
        price_pair_key: impl Into<String>,
        conversion_factor: Amount,
        max_borrow_limit: Amount,
        interest_rate_model: InterestRateModel,
        reserve_factor: Decimal,
        keeper_reward_percentage: Decimal,
    ) -> Self {
        Self {
            denom,
            borrow_limit,
            price_pair_key: price_pair_key.into(),
            conversion_factor,
            max_borrow_limit,
            interest_rate_model,
            reserve_factor,
            keeper_reward_percentage,
        }
    }

    fn problems(&self, out: &mut Vec<String>) {
        let denom = &self.denom;
        let limit = &self.borrow_limit;

        if !in_unit_interval(limit.loan_to_value) {
            out.push(format!(
                "{denom}: loan-to-value must be in [0, 1]: {}",
                limit.loan_to_value
            ));
        }
        if limit.liquidation_threshold < limit.loan_to_value {
            out.push(format!(
                "{denom}: liquidation threshold {} is below loan-to-value {}",
                limit.liquidation_threshold, limit.loan_to_value
            ));
        }
        if self.price_pair_key.trim().is_empty() {
            out.push(format!("{denom}: price pair key cannot be empty"));
        }
        if self.conversion_factor.is_zero() {
            out.push(format!("{denom}: conversion factor must be positive"));
        }
        self.interest_rate_model.problems(denom, out);
        if !in_unit_interval(self.reserve_factor) {
            out.push(format!(
                "{denom}: reserve factor must be in [0, 1]: {}",
                self.reserve_factor
            ));
        }
        if self.keeper_reward_percentage < Decimal::ZERO {
            out.push(format!(
                "{denom}: keeper reward percentage cannot be negative: {}",
                self.keeper_reward_percentage
            ));
        }
    }
}

/// Registry of all money markets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub money_markets: Vec<MoneyMarket>,
}

impl Params {
    pub fn new(money_markets: Vec<MoneyMarket>) -> Self {
        Self { money_markets }
    }

    /// Every structural problem with these params
    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        for mm in &self.money_markets {
            if !seen.insert(&mm.denom) {
                out.push(format!("duplicate money market denom: {}", mm.denom));
            }
            mm.problems(&mut out);
        }
        out
    }

    pub fn money_market(&self, denom: &Denom) -> Option<&MoneyMarket> {
        self.money_markets.iter().find(|mm| &mm.denom == denom)
    }
}

fn in_unit_interval(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE
}
