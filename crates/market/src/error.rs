//! Money market errors
//!
//! Errors fall into three classes:
//! - validation: malformed input, rejected before any state is touched
//! - business: expected rejections (balances, limits), no partial effect
//! - invariant: state could become inconsistent; the host must halt

use chrono::{DateTime, Utc};
use hard_core::{BankError, Denom, PriceError};
use std::fmt;
use thiserror::Error;

/// Classification of an error for the host process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Business,
    Invariant,
}

/// Which module-wide total an adjustment targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Supplied,
    Borrowed,
    Reserves,
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateKind::Supplied => "total supplied",
            AggregateKind::Borrowed => "total borrowed",
            AggregateKind::Reserves => "total reserves",
        };
        f.write_str(name)
    }
}

/// Errors from money market operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    // === Validation ===
    #[error("Unknown collateral type: {0}")]
    UnknownCollateralType(Denom),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid params: {}", .0.join("; "))]
    InvalidParams(Vec<String>),

    // === Business rules ===
    #[error("Insufficient balance for {account}: {reason}")]
    InsufficientBalance { account: String, reason: String },

    #[error("No deposit of {denom} for {owner}")]
    DepositNotFound { owner: String, denom: Denom },

    #[error("No borrow for {0}")]
    BorrowNotFound(String),

    #[error("Withdrawal of {requested}{denom} exceeds deposit balance {available}")]
    ExcessWithdrawal {
        denom: Denom,
        requested: String,
        available: String,
    },

    #[error("Repayment of {requested}{denom} exceeds outstanding debt {owed}")]
    ExcessRepayment {
        denom: Denom,
        requested: String,
        owed: String,
    },

    #[error("Borrow limit exceeded: debt value {debt_value} > borrow limit {limit}")]
    BorrowLimitExceeded { debt_value: String, limit: String },

    #[error("Max borrow limit for {denom} exceeded: total would be {proposed}, max {max}")]
    MaxBorrowLimitExceeded {
        denom: Denom,
        proposed: String,
        max: String,
    },

    #[error("Insufficient liquidity for {denom}: available {available}, requested {requested}")]
    InsufficientLiquidity {
        denom: Denom,
        available: String,
        requested: String,
    },

    #[error("Price error: {0}")]
    Price(#[from] PriceError),

    // === Invariant violations ===
    #[error("Invalid time ordering for {denom}: previous accrual {previous}, now {now}")]
    InvalidTimeOrdering {
        denom: Denom,
        previous: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("{kind} for {denom} would become negative: {amount}")]
    NegativeAggregate {
        kind: AggregateKind,
        denom: Denom,
        amount: String,
    },

    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("Corrupt position: {0}")]
    CorruptPosition(String),

    #[error("Bank error: {0}")]
    Bank(#[from] BankError),
}

impl MarketError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::UnknownCollateralType(_)
            | MarketError::InvalidAmount(_)
            | MarketError::InvalidParams(_) => ErrorKind::Validation,

            MarketError::InsufficientBalance { .. }
            | MarketError::DepositNotFound { .. }
            | MarketError::BorrowNotFound(_)
            | MarketError::ExcessWithdrawal { .. }
            | MarketError::ExcessRepayment { .. }
            | MarketError::BorrowLimitExceeded { .. }
            | MarketError::MaxBorrowLimitExceeded { .. }
            | MarketError::InsufficientLiquidity { .. }
            | MarketError::Price(_) => ErrorKind::Business,

            MarketError::InvalidTimeOrdering { .. }
            | MarketError::NegativeAggregate { .. }
            | MarketError::ArithmeticOverflow(_)
            | MarketError::CorruptPosition(_)
            | MarketError::Bank(_) => ErrorKind::Invariant,
        }
    }

    /// Whether the host process must stop instead of continuing
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Invariant
    }
}

/// Structural problems found in a genesis bundle, all of them at once
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("genesis validation failed with {} problem(s): {}", .problems.len(), .problems.join("; "))]
pub struct GenesisValidationError {
    pub problems: Vec<String>,
}

/// Errors at the genesis boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenesisError {
    #[error(transparent)]
    Validation(#[from] GenesisValidationError),

    #[error("{0} module account has not been set")]
    MissingModuleAccount(String),
}

impl GenesisError {
    /// Missing protocol accounts are fatal startup errors; a bad bundle can
    /// be corrected and resubmitted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GenesisError::MissingModuleAccount(_))
    }
}

/// Result type for money market operations
pub type MarketResult<T> = Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let bnb: Denom = "bnb".parse().unwrap();
        assert_eq!(
            MarketError::UnknownCollateralType(bnb.clone()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            MarketError::BorrowNotFound("a".into()).kind(),
            ErrorKind::Business
        );
        let err = MarketError::NegativeAggregate {
            kind: AggregateKind::Supplied,
            denom: bnb,
            amount: "-1".into(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "total supplied for bnb would become negative: -1");
    }

    #[test]
    fn test_genesis_error_lists_every_problem() {
        let err = GenesisValidationError {
            problems: vec!["first".into(), "second".into()],
        };
        assert_eq!(
            err.to_string(),
            "genesis validation failed with 2 problem(s): first; second"
        );
        assert!(!GenesisError::from(err).is_fatal());
        assert!(GenesisError::MissingModuleAccount("hard".into()).is_fatal());
    }
}
