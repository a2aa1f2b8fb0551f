//! Money market configuration
//!
//! Values that are protocol constants on a real chain but need to be
//! overridable for tests and alternative deployments.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the money market engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Length of the interest year used to scale annual rates
    #[serde(default = "default_seconds_per_year")]
    pub seconds_per_year: u64,

    /// Module account that custodies supplied collateral
    #[serde(default = "default_custody_account")]
    pub custody_account: String,

    /// Module account that receives seized collateral
    #[serde(default = "default_liquidator_account")]
    pub liquidator_account: String,
}

fn default_seconds_per_year() -> u64 {
    31_536_000 // 365 days
}

fn default_custody_account() -> String {
    "hard".to_string()
}

fn default_liquidator_account() -> String {
    "hard_liquidator".to_string()
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            seconds_per_year: default_seconds_per_year(),
            custody_account: default_custody_account(),
            liquidator_account: default_liquidator_account(),
        }
    }
}

impl MarketConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Protocol-owned accounts that must exist before the engine can run
    pub fn required_module_accounts(&self) -> [&str; 2] {
        [self.custody_account.as_str(), self.liquidator_account.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MarketConfig::default();
        assert_eq!(config.seconds_per_year, 31_536_000);
        assert_eq!(config.custody_account, "hard");
        assert_eq!(config.liquidator_account, "hard_liquidator");
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "custody_account": "deposit-custody" }"#;
        let config: MarketConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.custody_account, "deposit-custody");
        assert_eq!(config.seconds_per_year, 31_536_000); // default
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "liquidator_account": "liquidator" }}"#).unwrap();

        let config = MarketConfig::from_file(file.path()).unwrap();
        assert_eq!(config.liquidator_account, "liquidator");
        assert_eq!(
            config.required_module_accounts(),
            ["hard", "liquidator"]
        );
    }
}
