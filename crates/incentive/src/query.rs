//! Rewards query
//!
//! Raw request fields are parsed into a typed filter first, so malformed
//! owners and reward types are rejected before any state is read.

use hard_core::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::claim::Claim;
use crate::error::{IncentiveError, IncentiveResult};
use crate::reward::RewardType;

/// Request as received from a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsRequest {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub reward_type: Option<String>,
    #[serde(default = "first_page")]
    pub page: u64,
    #[serde(default)]
    pub limit: u64,
}

fn first_page() -> u64 {
    1
}

/// Validated rewards filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardsFilter {
    pub owner: Option<Address>,
    pub reward_type: Option<RewardType>,
    /// 1-indexed; page 0 selects nothing
    pub page: u64,
    pub limit: u64,
}

impl RewardsFilter {
    /// Parse a request; `limit` 0 falls back to `default_limit`
    pub fn parse(
        request: &RewardsRequest,
        address_prefix: &str,
        default_limit: u64,
    ) -> IncentiveResult<Self> {
        let owner = request
            .owner
            .as_deref()
            .map(|s| Address::parse_with_prefix(s, address_prefix))
            .transpose()?;
        let reward_type = request
            .reward_type
            .as_deref()
            .map(|s| {
                RewardType::from_str(s).map_err(|_| IncentiveError::InvalidRewardType(s.to_string()))
            })
            .transpose()?;
        let limit = if request.limit == 0 {
            default_limit
        } else {
            request.limit
        };
        Ok(Self {
            owner,
            reward_type,
            page: request.page,
            limit,
        })
    }

    pub fn matches(&self, claim: &Claim) -> bool {
        self.owner.as_ref().map_or(true, |o| o == &claim.owner)
            && self.reward_type.map_or(true, |t| t == claim.reward_type)
    }

    /// Select this filter's page out of already-filtered, ordered claims
    pub fn page_of<I>(&self, claims: I) -> Vec<Claim>
    where
        I: Iterator<Item = Claim>,
    {
        if self.page == 0 || self.limit == 0 {
            return Vec::new();
        }
        let Some(skip) = (self.page - 1).checked_mul(self.limit) else {
            return Vec::new();
        };
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let take = usize::try_from(self.limit).unwrap_or(usize::MAX);
        claims.skip(skip).take(take).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(owner: Option<&str>, reward_type: Option<&str>) -> RewardsRequest {
        RewardsRequest {
            owner: owner.map(String::from),
            reward_type: reward_type.map(String::from),
            page: 1,
            limit: 0,
        }
    }

    #[test]
    fn test_parse_defaults() {
        let filter = RewardsFilter::parse(&request(None, None), "kava", 100).unwrap();
        assert_eq!(filter.limit, 100);
        assert!(filter.owner.is_none());
        assert!(filter.reward_type.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_owner() {
        let err = RewardsFilter::parse(&request(Some("kava1nope"), None), "kava", 100).unwrap_err();
        assert!(matches!(err, IncentiveError::InvalidAddress(_)));

        let other_chain = "cosmos1v9kxjcm9qqqqqqqqqqqqqqqqqqqqqqqqy22mj3";
        let err = RewardsFilter::parse(&request(Some(other_chain), None), "kava", 100).unwrap_err();
        assert!(matches!(err, IncentiveError::InvalidAddress(_)));
    }

    #[test]
    fn test_parse_rejects_bad_reward_type() {
        let err = RewardsFilter::parse(&request(None, Some("swap")), "kava", 100).unwrap_err();
        assert_eq!(err, IncentiveError::InvalidRewardType("swap".into()));
    }

    #[test]
    fn test_request_json_defaults() {
        let req: RewardsRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 0);
    }
}
