//! Incentive genesis bundle

use chrono::{DateTime, Utc};
use hard_core::Denom;
use hard_market::GenesisValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::claim::Claim;
use crate::params::Params;
use crate::reward::RewardType;

/// Last reward accumulation of one (reward type, collateral type)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisRewardAccumulationTime {
    pub reward_type: RewardType,
    pub collateral_type: Denom,
    pub previous_accumulation_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    #[serde(default)]
    pub previous_accumulation_times: Vec<GenesisRewardAccumulationTime>,
    #[serde(default)]
    pub claims: Vec<Claim>,
}

impl GenesisState {
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(GenesisValidationError { problems })
        }
    }

    pub fn problems(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .params
            .problems()
            .into_iter()
            .map(|p| format!("incentive params: {p}"))
            .collect();

        let mut times = BTreeSet::new();
        for t in &self.previous_accumulation_times {
            if !times.insert((t.reward_type, &t.collateral_type)) {
                out.push(format!(
                    "duplicate reward accumulation time for {}/{}",
                    t.reward_type, t.collateral_type
                ));
            }
        }

        let mut claims = BTreeSet::new();
        for claim in &self.claims {
            let key = claim.key();
            if !claims.insert(key) {
                out.push(format!(
                    "duplicate claim for {} on {}/{}",
                    claim.owner, claim.reward_type, claim.collateral_type
                ));
            }
            if claim.reward.is_empty() {
                out.push(format!(
                    "empty claim for {} on {}/{}",
                    claim.owner, claim.reward_type, claim.collateral_type
                ));
            }
        }
        out
    }
}
