//! Hard Market - Money market accounting engine
//!
//! Tracks collateral supplied and debt borrowed per collateral type, with
//! interest realized lazily through cumulative factors:
//! - `params`: money-market registry
//! - `accrual`: per-collateral-type interest factor accrual
//! - `ledger`: supply / withdraw / borrow / repay
//! - `aggregates`: module-wide totals
//! - `genesis`: snapshot and restore
//!
//! Every mutation is all-or-nothing through `store::transact`.

pub mod accrual;
pub mod aggregates;
pub mod config;
pub mod error;
pub mod genesis;
pub mod interest;
pub mod keeper;
pub mod ledger;
pub mod limits;
pub mod params;
pub mod positions;
pub mod store;

pub use aggregates::Aggregates;
pub use config::MarketConfig;
pub use error::{
    AggregateKind, ErrorKind, GenesisError, GenesisValidationError, MarketError, MarketResult,
};
pub use genesis::{GenesisAccumulationTime, GenesisState};
pub use interest::InterestFactors;
pub use keeper::HardKeeper;
pub use params::{BorrowLimit, InterestRateModel, MoneyMarket, Params};
pub use positions::{Borrow, Deposit};
pub use store::MarketStore;
