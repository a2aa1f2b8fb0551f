//! Hard Incentive - Reward claims
//!
//! Accumulates rewards for money market participants from configured
//! emission periods, pays them out on claim and serves the rewards query.

pub mod accumulator;
pub mod claim;
pub mod config;
pub mod error;
pub mod genesis;
pub mod keeper;
pub mod params;
pub mod query;
pub mod reward;

pub use accumulator::PositionSource;
pub use claim::Claim;
pub use config::IncentiveConfig;
pub use error::{IncentiveError, IncentiveGenesisError, IncentiveResult};
pub use genesis::{GenesisRewardAccumulationTime, GenesisState};
pub use keeper::IncentiveKeeper;
pub use params::{Params, RewardPeriod};
pub use query::{RewardsFilter, RewardsRequest};
pub use reward::RewardType;
