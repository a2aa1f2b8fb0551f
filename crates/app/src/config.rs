//! Application configuration
//!
//! Composes the per-module configs. Every field has a default, so a partial
//! (or empty) JSON file is a valid configuration.

use hard_incentive::IncentiveConfig;
use hard_market::MarketConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub market: MarketConfig,

    #[serde(default)]
    pub incentive: IncentiveConfig,

    /// bech32 prefix accepted at the query surface
    #[serde(default = "default_address_prefix")]
    pub address_prefix: String,
}

fn default_address_prefix() -> String {
    "kava".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            market: MarketConfig::default(),
            incentive: IncentiveConfig::default(),
            address_prefix: default_address_prefix(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Every module account the host must register before import
    pub fn module_accounts(&self) -> Vec<&str> {
        let mut accounts = self.market.required_module_accounts().to_vec();
        accounts.push(self.incentive.payout_account.as_str());
        accounts
    }
}
