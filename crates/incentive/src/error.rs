//! Incentive errors

use chrono::{DateTime, Utc};
use hard_core::{AddressError, BankError, Denom};
use hard_market::{ErrorKind, GenesisValidationError, MarketError};
use thiserror::Error;

use crate::reward::RewardType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncentiveError {
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("Invalid reward type: {0}")]
    InvalidRewardType(String),

    #[error("Invalid params: {}", .0.join("; "))]
    InvalidParams(Vec<String>),

    #[error("Nothing to claim for {owner} under {reward_type}")]
    NothingToClaim {
        owner: String,
        reward_type: RewardType,
    },

    #[error("Invalid time ordering for {reward_type}/{collateral_type}: previous {previous}, now {now}")]
    InvalidTimeOrdering {
        reward_type: RewardType,
        collateral_type: Denom,
        previous: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Bank error: {0}")]
    Bank(#[from] BankError),
}

impl IncentiveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IncentiveError::InvalidAddress(_)
            | IncentiveError::InvalidRewardType(_)
            | IncentiveError::InvalidParams(_) => ErrorKind::Validation,
            IncentiveError::NothingToClaim { .. } => ErrorKind::Business,
            IncentiveError::InvalidTimeOrdering { .. }
            | IncentiveError::ArithmeticOverflow(_)
            | IncentiveError::Bank(_) => ErrorKind::Invariant,
            IncentiveError::Market(inner) => inner.kind(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Invariant
    }
}

/// Errors at the incentive genesis boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncentiveGenesisError {
    #[error(transparent)]
    Validation(#[from] GenesisValidationError),

    #[error("{0} module account has not been set")]
    MissingModuleAccount(String),
}

impl IncentiveGenesisError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, IncentiveGenesisError::MissingModuleAccount(_))
    }
}

pub type IncentiveResult<T> = Result<T, IncentiveError>;
