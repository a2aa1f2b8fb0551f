//! Combined genesis bundle
//!
//! The money market and incentive halves are validated together so a
//! rejected bundle lists every problem from both at once.

use chrono::{DateTime, Utc};
use hard_market::GenesisValidationError;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppGenesis {
    pub genesis_time: DateTime<Utc>,
    #[serde(default)]
    pub hard: hard_market::GenesisState,
    #[serde(default)]
    pub incentive: hard_incentive::GenesisState,
}

impl AppGenesis {
    pub fn new(genesis_time: DateTime<Utc>) -> Self {
        Self {
            genesis_time,
            hard: hard_market::GenesisState::default(),
            incentive: hard_incentive::GenesisState::default(),
        }
    }

    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json).map_err(|e| AppError::Json(e.to_string()))
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Json(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    pub fn problems(&self) -> Vec<String> {
        self.hard
            .problems()
            .into_iter()
            .map(|p| format!("hard: {p}"))
            .chain(
                self.incentive
                    .problems()
                    .into_iter()
                    .map(|p| format!("incentive: {p}")),
            )
            .collect()
    }

    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(GenesisValidationError { problems })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hard_core::{Address, Coin};
    use hard_incentive::{Claim, RewardType};
    use hard_market::Deposit;
    use rust_decimal_macros::dec;

    fn alice() -> Address {
        "kava1v9kxjcm9qqqqqqqqqqqqqqqqqqqqqqqqcl7xyk".parse().unwrap()
    }

    #[test]
    fn test_minimal_json() {
        let genesis = AppGenesis::from_json(r#"{ "genesis_time": "2021-01-01T00:00:00Z" }"#).unwrap();
        assert!(genesis.validate().is_ok());
        assert!(genesis.hard.deposits.is_empty());
        assert!(genesis.incentive.claims.is_empty());
    }

    #[test]
    fn test_malformed_json() {
        let err = AppGenesis::from_json(r#"{ "genesis_time": 7 }"#).unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_problems_from_both_halves() {
        let mut genesis = AppGenesis::new(chrono::Utc::now());
        // deposit for a denom without a money market
        genesis.hard.deposits.push(Deposit {
            depositor: alice(),
            amount: "10bnb".parse::<Coin>().unwrap(),
            index: dec!(1),
        });
        // empty claim
        genesis.incentive.claims.push(Claim {
            owner: alice(),
            collateral_type: "bnb".parse().unwrap(),
            reward_type: RewardType::Hard,
            reward: Default::default(),
        });

        let problems = genesis.validate().unwrap_err().problems;
        assert!(problems.iter().any(|p| p.starts_with("hard: ")), "{problems:?}");
        assert!(problems.iter().any(|p| p.starts_with("incentive: ")), "{problems:?}");
    }
}
