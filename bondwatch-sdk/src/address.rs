//! MultiversX account addresses.
//!
//! On chain an address is a raw 32-byte public key (or contract id). Humans,
//! APIs and explorers use the bech32 rendering with the `erd` prefix.

use bech32::{Bech32, Hrp};
use std::fmt;
use std::str::FromStr;

/// Human-readable part of every MultiversX bech32 address.
pub const ADDRESS_HRP: Hrp = Hrp::parse_unchecked("erd");

/// Errors produced when converting between raw and bech32 addresses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("unexpected bech32 prefix {0:?}")]
    InvalidPrefix(String),
    #[error("bech32 error: {0}")]
    Bech32(String),
}

/// A 32-byte MultiversX address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; Address::LEN]);

impl Address {
    pub const LEN: usize = 32;

    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Build an address from a slice, which must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let raw: [u8; Self::LEN] = bytes.try_into().map_err(|_| AddressError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Render as `erd1…`.
    pub fn to_bech32(&self) -> String {
        // A 32-byte payload under a three-letter hrp never hits the length limit.
        bech32::encode::<Bech32>(ADDRESS_HRP, &self.0).unwrap_or_else(|_| hex::encode(self.0))
    }

    /// Parse an `erd1…` string.
    pub fn from_bech32(encoded: &str) -> Result<Self, AddressError> {
        let (hrp, data) =
            bech32::decode(encoded).map_err(|e| AddressError::Bech32(e.to_string()))?;
        if hrp != ADDRESS_HRP {
            return Err(AddressError::InvalidPrefix(hrp.as_str().to_string()));
        }
        Self::from_slice(&data)
    }

    /// Whether this is a smart contract address (eight leading zero bytes).
    pub fn is_smart_contract(&self) -> bool {
        self.0[..8].iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bech32())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_bech32())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}
