//! Public address validation and display helpers.

use crate::constants::SHORT_ADDRESS_CHARS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of an ed25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("address must be a non-empty string")]
    Empty,

    #[error("base58 decode error: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("public key must be {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },
}

/// A base58-encoded 32-byte public key, as reported by a connected backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicAddress(String);

impl PublicAddress {
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        let bytes = bs58::decode(s).into_vec()?;
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(AddressError::InvalidKeySize {
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self(s.to_string()))
    }

    /// Encode raw public key bytes.
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bs58::encode(bytes).into_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `abcd...wxyz` form used in notifications.
    pub fn short(&self) -> String {
        shorten_address(&self.0, SHORT_ADDRESS_CHARS)
    }
}

impl std::fmt::Display for PublicAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PublicAddress {
    type Error = AddressError;
    fn try_from(s: String) -> Result<Self, AddressError> {
        Self::parse(&s)
    }
}

impl From<PublicAddress> for String {
    fn from(a: PublicAddress) -> String {
        a.0
    }
}

/// Keep `chars` characters from each end of `address`, joined by `...`.
///
/// Empty input stays empty, and addresses too short to abbreviate are
/// returned unchanged.
pub fn shorten_address(address: &str, chars: usize) -> String {
    let count = address.chars().count();
    if count == 0 || count <= chars * 2 {
        return address.to_string();
    }
    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(count - chars).collect();
    format!("{}...{}", head, tail)
}
