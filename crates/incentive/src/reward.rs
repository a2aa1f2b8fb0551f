//! Reward types
//!
//! A closed set: each variant decides which positions earn its emission.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Kind of incentive a claim accrues under
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RewardType {
    /// Lending activity: supplied plus borrowed balances
    Hard,
    /// Minting activity: outstanding debt only
    UsdxMinting,
}

/// Which side of a money market a reward type counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardBasis {
    pub deposits: bool,
    pub borrows: bool,
}

impl RewardType {
    pub fn basis(self) -> RewardBasis {
        match self {
            RewardType::Hard => RewardBasis {
                deposits: true,
                borrows: true,
            },
            RewardType::UsdxMinting => RewardBasis {
                deposits: false,
                borrows: true,
            },
        }
    }
}
