//! Price feed collaborator
//!
//! Borrow limits value collateral and debt in a common quote asset. Prices
//! are looked up by the market id stored in each money market's params
//! (e.g. `bnb:usd`).

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;

/// Price lookup errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Market id not found
    #[error("Price not found for market: {0}")]
    NotFound(String),

    /// Price data is invalid
    #[error("Invalid price for {market}: {reason}")]
    InvalidPrice { market: String, reason: String },
}

/// Price feed trait - interface for spot prices
pub trait PriceFeed {
    /// Current price for a market id
    fn price(&self, market_id: &str) -> Result<Decimal, PriceError>;
}

/// Fixed price feed
///
/// Stores prices that can be updated programmatically.
#[derive(Debug, Clone, Default)]
pub struct FixedPriceFeed {
    prices: BTreeMap<String, Decimal>,
}

impl FixedPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed price for a market id
    pub fn set_price(&mut self, market_id: impl Into<String>, price: Decimal) {
        self.prices.insert(market_id.into(), price);
    }

    /// Builder-style variant of `set_price`
    pub fn with_price(mut self, market_id: impl Into<String>, price: Decimal) -> Self {
        self.set_price(market_id, price);
        self
    }

    /// Remove a price (for testing the not-found path)
    pub fn remove_price(&mut self, market_id: &str) {
        self.prices.remove(market_id);
    }
}

impl PriceFeed for FixedPriceFeed {
    fn price(&self, market_id: &str) -> Result<Decimal, PriceError> {
        let price = self
            .prices
            .get(market_id)
            .copied()
            .ok_or_else(|| PriceError::NotFound(market_id.to_string()))?;

        if price <= Decimal::ZERO {
            return Err(PriceError::InvalidPrice {
                market: market_id.to_string(),
                reason: "price must be positive".to_string(),
            });
        }
        Ok(price)
    }
}
