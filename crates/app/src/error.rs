//! Application errors

use hard_incentive::{IncentiveError, IncentiveGenesisError};
use hard_market::{ErrorKind, GenesisError, GenesisValidationError, MarketError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Incentive(#[from] IncentiveError),

    #[error(transparent)]
    Genesis(#[from] GenesisValidationError),

    #[error("{0} module account has not been set")]
    MissingModuleAccount(String),

    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("State encoding failed: {0}")]
    Encoding(String),

    #[error("Export is not reproducible: {first} != {second}")]
    RoundTripMismatch { first: String, second: String },
}

impl From<GenesisError> for AppError {
    fn from(err: GenesisError) -> Self {
        match err {
            GenesisError::Validation(v) => AppError::Genesis(v),
            GenesisError::MissingModuleAccount(name) => AppError::MissingModuleAccount(name),
        }
    }
}

impl From<IncentiveGenesisError> for AppError {
    fn from(err: IncentiveGenesisError) -> Self {
        match err {
            IncentiveGenesisError::Validation(v) => AppError::Genesis(v),
            IncentiveGenesisError::MissingModuleAccount(name) => {
                AppError::MissingModuleAccount(name)
            }
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Market(e) => e.kind(),
            AppError::Incentive(e) => e.kind(),
            AppError::Genesis(_) | AppError::Json(_) => ErrorKind::Validation,
            AppError::MissingModuleAccount(_)
            | AppError::Encoding(_)
            | AppError::RoundTripMismatch { .. } => ErrorKind::Invariant,
        }
    }

    /// Whether the host process must stop instead of continuing
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Invariant
    }
}

pub type AppResult<T> = Result<T, AppError>;
