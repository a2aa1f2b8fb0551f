//! Incentive configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for reward accumulation and payout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveConfig {
    /// Module account rewards are paid out of
    #[serde(default = "default_payout_account")]
    pub payout_account: String,

    /// Page size used when a rewards query passes limit 0
    #[serde(default = "default_query_limit")]
    pub default_query_limit: u64,
}

fn default_payout_account() -> String {
    "incentive".to_string()
}

fn default_query_limit() -> u64 {
    100
}

impl Default for IncentiveConfig {
    fn default() -> Self {
        Self {
            payout_account: default_payout_account(),
            default_query_limit: default_query_limit(),
        }
    }
}

impl IncentiveConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
