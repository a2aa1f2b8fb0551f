//! Hard Core - Domain types
//!
//! This crate contains the fundamental types used across the money market:
//! - `Amount`: Non-negative whole number of raw units
//! - `Denom`: Validated asset identifier
//! - `Address`: bech32 account address
//! - `Coin`, `Coins`, `DecCoins`: Denom-keyed amounts
//! - `Bank`, `PriceFeed`: Collaborators the engine delegates to

pub mod address;
pub mod amount;
pub mod bank;
pub mod coins;
pub mod denom;
pub mod price;

pub use address::{Address, AddressError};
pub use amount::{Amount, AmountError};
pub use bank::{AccountId, Bank, BankError, InMemoryBank};
pub use coins::{Coin, CoinError, Coins, DecCoin, DecCoins};
pub use denom::{Denom, DenomError};
pub use price::{FixedPriceFeed, PriceError, PriceFeed};
