//! Claim records
//!
//! A claim is owed-but-unpaid reward for one (owner, collateral type,
//! reward type). Amounts stay exact decimals until paid out.

use hard_core::{Address, Amount, Coins, DecCoins, Denom};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{IncentiveError, IncentiveResult};
use crate::reward::RewardType;

/// Store key; its ordering is the query ordering
pub type ClaimKey = (Address, Denom, RewardType);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub owner: Address,
    pub collateral_type: Denom,
    pub reward_type: RewardType,
    pub reward: DecCoins,
}

impl Claim {
    pub fn from_entry(key: &ClaimKey, reward: &DecCoins) -> Self {
        let (owner, collateral_type, reward_type) = key;
        Self {
            owner: owner.clone(),
            collateral_type: collateral_type.clone(),
            reward_type: *reward_type,
            reward: reward.clone(),
        }
    }

    pub fn key(&self) -> ClaimKey {
        (
            self.owner.clone(),
            self.collateral_type.clone(),
            self.reward_type,
        )
    }
}

/// Whole units payable from a set of decimal rewards; fractions stay behind
pub fn payable(rewards: &DecCoins) -> IncentiveResult<Coins> {
    let mut out = Coins::new();
    for (denom, amount) in rewards.iter() {
        let whole = Amount::from_decimal_trunc(amount)
            .map_err(|_| IncentiveError::ArithmeticOverflow("claim payout"))?;
        out.set(denom.clone(), whole);
    }
    Ok(out)
}

/// Take up to `owed` out of `reward`, reducing `owed` by what was taken
pub fn deduct(reward: &mut DecCoins, owed: &mut DecCoins) -> IncentiveResult<()> {
    let due: Vec<(Denom, Decimal)> = owed.iter().map(|(d, a)| (d.clone(), a)).collect();
    for (denom, amount) in due {
        let taken = reward.amount_of(&denom).min(amount);
        if taken.is_zero() {
            continue;
        }
        reward
            .adjust(&denom, -taken)
            .and_then(|_| owed.adjust(&denom, -taken))
            .map_err(|_| IncentiveError::ArithmeticOverflow("claim deduction"))?;
    }
    Ok(())
}
