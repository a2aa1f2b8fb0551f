//! Claim/Reward Accumulator
//!
//! For every reward period, the emission since the last accumulation is
//! split across owners in proportion to their share of the period's basis
//! (see `RewardType::basis`) and added to their claims.

use chrono::{DateTime, Utc};
use hard_core::{Address, Amount, DecCoins, Denom};
use hard_market::{HardKeeper, MarketError};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, error};

use crate::claim::ClaimKey;
use crate::error::{IncentiveError, IncentiveResult};
use crate::params::{Params, RewardPeriod};
use crate::reward::RewardType;

/// Read-only view of live positions per collateral type
pub trait PositionSource {
    /// Live deposit per owner of `collateral_type` at `now`
    fn deposit_balances(
        &self,
        collateral_type: &Denom,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<Address, Amount>, MarketError>;

    /// Live debt per owner of `collateral_type` at `now`
    fn borrow_balances(
        &self,
        collateral_type: &Denom,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<Address, Amount>, MarketError>;
}

/// Collateral types without a money market have no positions
impl PositionSource for HardKeeper {
    fn deposit_balances(
        &self,
        collateral_type: &Denom,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<Address, Amount>, MarketError> {
        if self.params().money_market(collateral_type).is_none() {
            return Ok(BTreeMap::new());
        }
        HardKeeper::deposit_balances(self, collateral_type, now)
    }

    fn borrow_balances(
        &self,
        collateral_type: &Denom,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<Address, Amount>, MarketError> {
        if self.params().money_market(collateral_type).is_none() {
            return Ok(BTreeMap::new());
        }
        HardKeeper::borrow_balances(self, collateral_type, now)
    }
}

/// Mutable accumulator state, staged by the keeper and committed on success
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub claims: BTreeMap<ClaimKey, DecCoins>,
    pub accumulation_times: BTreeMap<(RewardType, Denom), DateTime<Utc>>,
}

/// Accrue every reward period up to `now`
pub fn accumulate(
    ledger: &mut Ledger,
    params: &Params,
    positions: &dyn PositionSource,
    now: DateTime<Utc>,
) -> IncentiveResult<()> {
    for period in &params.reward_periods {
        accumulate_period(ledger, period, positions, now)?;
    }
    Ok(())
}

fn accumulate_period(
    ledger: &mut Ledger,
    period: &RewardPeriod,
    positions: &dyn PositionSource,
    now: DateTime<Utc>,
) -> IncentiveResult<()> {
    let key = (period.reward_type, period.collateral_type.clone());
    let Some(previous) = ledger.accumulation_times.insert(key, now) else {
        // First sighting: start the clock, no retroactive emission
        return Ok(());
    };

    if now < previous {
        error!(
            reward_type = %period.reward_type,
            collateral_type = %period.collateral_type,
            %previous,
            %now,
            "reward accumulation time moved backwards"
        );
        return Err(IncentiveError::InvalidTimeOrdering {
            reward_type: period.reward_type,
            collateral_type: period.collateral_type.clone(),
            previous,
            now,
        });
    }

    let seconds = period.overlap_seconds(previous, now);
    if seconds == 0 || period.rewards_per_second.is_zero() {
        return Ok(());
    }

    let emission = period
        .rewards_per_second
        .amount
        .value()
        .checked_mul(Decimal::from(seconds))
        .ok_or(IncentiveError::ArithmeticOverflow("reward emission"))?;

    let shares = basis(period, positions, now)?;
    let total = shares
        .values()
        .try_fold(Decimal::ZERO, |sum, a| sum.checked_add(a.value()))
        .ok_or(IncentiveError::ArithmeticOverflow("reward basis total"))?;
    if total.is_zero() {
        return Ok(());
    }

    let denom = &period.rewards_per_second.denom;
    for (owner, amount) in shares {
        if amount.is_zero() {
            continue;
        }
        let reward = emission
            .checked_mul(amount.value())
            .and_then(|v| v.checked_div(total))
            .ok_or(IncentiveError::ArithmeticOverflow("reward share"))?;
        if reward.is_zero() {
            continue;
        }
        let claim = ledger
            .claims
            .entry((owner, period.collateral_type.clone(), period.reward_type))
            .or_default();
        claim
            .adjust(denom, reward)
            .map_err(|_| IncentiveError::ArithmeticOverflow("claim accumulation"))?;
    }

    debug!(
        reward_type = %period.reward_type,
        collateral_type = %period.collateral_type,
        seconds,
        %emission,
        "rewards accumulated"
    );
    Ok(())
}

/// Per-owner basis of a period's reward type
fn basis(
    period: &RewardPeriod,
    positions: &dyn PositionSource,
    now: DateTime<Utc>,
) -> IncentiveResult<BTreeMap<Address, Amount>> {
    let which = period.reward_type.basis();
    let mut out: BTreeMap<Address, Amount> = BTreeMap::new();
    let mut sources = Vec::new();
    if which.deposits {
        sources.push(positions.deposit_balances(&period.collateral_type, now)?);
    }
    if which.borrows {
        sources.push(positions.borrow_balances(&period.collateral_type, now)?);
    }
    for source in sources {
        for (owner, amount) in source {
            let entry = out.entry(owner).or_default();
            *entry = entry
                .checked_add(&amount)
                .ok_or(IncentiveError::ArithmeticOverflow("reward basis"))?;
        }
    }
    Ok(out)
}
