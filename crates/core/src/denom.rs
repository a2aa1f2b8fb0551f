//! Denom - Validated asset identifiers
//!
//! Collateral types and reward denoms are keyed by denom strings. Instead of
//! passing raw strings around, every denom is parsed once at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 128;

/// Errors that can occur when parsing denoms
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DenomError {
    #[error("Empty denom")]
    Empty,

    #[error("Denom length must be between {MIN_LEN} and {MAX_LEN} chars: {0}")]
    InvalidLength(String),

    #[error("Invalid denom format: {0}")]
    InvalidFormat(String),
}

/// Asset denomination
///
/// Must start with an ASCII letter, followed by letters, digits or one of
/// `/ : . _ -`.
///
/// # Examples
/// ```
/// use hard_core::Denom;
///
/// let bnb: Denom = "bnb".parse().unwrap();
/// assert_eq!(bnb.as_str(), "bnb");
///
/// assert!("1bnb".parse::<Denom>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Denom(String);

impl Denom {
    /// Returns the denom as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), DenomError> {
        if s.is_empty() {
            return Err(DenomError::Empty);
        }

        if s.len() < MIN_LEN || s.len() > MAX_LEN {
            return Err(DenomError::InvalidLength(s.to_string()));
        }

        let mut chars = s.chars();
        let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let rest_ok =
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
        if !first_ok || !rest_ok {
            return Err(DenomError::InvalidFormat(s.to_string()));
        }

        Ok(())
    }
}

impl fmt::Display for Denom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Denom {
    type Err = DenomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)?;
        Ok(Denom(s.to_string()))
    }
}

impl TryFrom<String> for Denom {
    type Error = DenomError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Denom(s))
    }
}

impl From<Denom> for String {
    fn from(d: Denom) -> Self {
        d.0
    }
}

impl AsRef<str> for Denom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
