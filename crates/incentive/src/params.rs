//! Reward emission schedule

use chrono::{DateTime, Utc};
use hard_core::{Coin, Denom};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::reward::RewardType;

/// Emission of one reward type for one collateral type over a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPeriod {
    pub reward_type: RewardType,
    pub collateral_type: Denom,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub rewards_per_second: Coin,
}

impl RewardPeriod {
    pub fn new(
        reward_type: RewardType,
        collateral_type: Denom,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        rewards_per_second: Coin,
    ) -> Self {
        Self {
            reward_type,
            collateral_type,
            start,
            end,
            rewards_per_second,
        }
    }

    /// Active when `start <= t < end`
    pub fn is_active(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Whole seconds of `[from, to)` that fall inside this period
    pub fn overlap_seconds(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
        let lo = from.max(self.start);
        let hi = to.min(self.end);
        (hi - lo).num_seconds().max(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub reward_periods: Vec<RewardPeriod>,
}

impl Params {
    pub fn new(reward_periods: Vec<RewardPeriod>) -> Self {
        Self { reward_periods }
    }

    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        for period in &self.reward_periods {
            let key = (period.reward_type, &period.collateral_type);
            if !seen.insert(key) {
                out.push(format!(
                    "duplicate reward period for {}/{}",
                    period.reward_type, period.collateral_type
                ));
            }
            if period.start >= period.end {
                out.push(format!(
                    "reward period {}/{} ends at {} before it starts at {}",
                    period.reward_type, period.collateral_type, period.end, period.start
                ));
            }
        }
        out
    }

    pub fn period(&self, reward_type: RewardType, collateral_type: &Denom) -> Option<&RewardPeriod> {
        self.reward_periods
            .iter()
            .find(|p| p.reward_type == reward_type && &p.collateral_type == collateral_type)
    }
}
