//! Hard App - Application wiring
//!
//! Glues the money market and incentive modules into one host: combined
//! genesis, once-per-block driver, state hash and the query surface used by
//! the `hardd` binary.

pub mod config;
pub mod context;
pub mod error;
pub mod genesis;
pub mod query;

pub use config::AppConfig;
pub use context::{module_bank, AppContext};
pub use error::{AppError, AppResult};
pub use genesis::AppGenesis;
