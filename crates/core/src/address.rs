//! Address - bech32 account addresses
//!
//! Format: `<hrp>1<data><checksum>` (BIP-173). Only the lowercase form is
//! accepted so that one account has exactly one textual representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const GENERATOR: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
const CHECKSUM_LEN: usize = 6;
const MAX_LEN: usize = 90;

/// Errors that can occur when parsing addresses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Empty address")]
    Empty,

    #[error("Address too long (max {MAX_LEN} chars): {0}")]
    TooLong(String),

    #[error("Address must be lowercase: {0}")]
    MixedCase(String),

    #[error("Missing human-readable prefix separator: {0}")]
    MissingSeparator(String),

    #[error("Invalid character {ch:?} in address {address}")]
    InvalidCharacter { address: String, ch: char },

    #[error("Invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("Unexpected prefix for {address}: expected {expected}")]
    WrongPrefix { address: String, expected: String },
}

/// A bech32 account address
///
/// # Examples
/// ```
/// use hard_core::Address;
///
/// let addr: Address = "kava15qdefkmwswysgg4qxgqpqr35k3m49pkx2jdfnw".parse().unwrap();
/// assert_eq!(addr.hrp(), "kava");
///
/// assert!("kava15qdefkmwswysgg4qxgqpqr35k3m49pkx2jdfnq".parse::<Address>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Returns the address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable prefix (the part before the last `1`)
    pub fn hrp(&self) -> &str {
        match self.0.rfind('1') {
            Some(pos) => &self.0[..pos],
            None => "",
        }
    }

    /// Parse an address and require a specific prefix
    pub fn parse_with_prefix(s: &str, prefix: &str) -> Result<Self, AddressError> {
        let addr: Address = s.parse()?;
        if addr.hrp() != prefix {
            return Err(AddressError::WrongPrefix {
                address: s.to_string(),
                expected: prefix.to_string(),
            });
        }
        Ok(addr)
    }

    fn validate(s: &str) -> Result<(), AddressError> {
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        if s.len() > MAX_LEN {
            return Err(AddressError::TooLong(s.to_string()));
        }
        if s.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(AddressError::MixedCase(s.to_string()));
        }

        let pos = s
            .rfind('1')
            .filter(|&p| p >= 1 && p + 1 + CHECKSUM_LEN <= s.len())
            .ok_or_else(|| AddressError::MissingSeparator(s.to_string()))?;

        let (hrp, data) = (&s[..pos], &s[pos + 1..]);

        if let Some(ch) = hrp.chars().find(|c| !(33..=126).contains(&(*c as u32))) {
            return Err(AddressError::InvalidCharacter {
                address: s.to_string(),
                ch,
            });
        }

        let mut values = hrp_expand(hrp);
        for ch in data.chars() {
            let v = CHARSET
                .iter()
                .position(|&c| c as char == ch)
                .ok_or_else(|| AddressError::InvalidCharacter {
                    address: s.to_string(),
                    ch,
                })?;
            values.push(v as u8);
        }

        if polymod(&values) != 1 {
            return Err(AddressError::InvalidChecksum(s.to_string()));
        }

        Ok(())
    }
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() * 2 + 1);
    out.extend(bytes.iter().map(|b| b >> 5));
    out.push(0);
    out.extend(bytes.iter().map(|b| b & 0x1f));
    out
}

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for &v in values {
        let top = chk >> 25;
        chk = ((chk & 0x1ff_ffff) << 5) ^ u32::from(v);
        for (i, g) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)?;
        Ok(Address(s.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Address(s))
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0
    }
}
