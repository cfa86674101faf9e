//! Fixed-width identifiers used throughout the exit game.
//!
//! All identifiers are raw byte arrays that serialize as `0x`-prefixed hex
//! strings, so persisted records and config files stay human-readable.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{ExitGameError, OutputCoordinate, constants};

/// Serde adapter for `[u8; N]` as a `0x`-prefixed hex string.
mod hex_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_hex::<N>(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_hex<const N: usize>(s: &str) -> crate::Result<[u8; N]> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| ExitGameError::Serialization(format!("bad hex {s:?}: {e}")))?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Account that posts exits and receives payouts (20 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(#[serde(with = "hex_array")] pub [u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Fixture address whose every byte is `byte`.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn repeat(byte: u8) -> Self {
        Self([byte; 20])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ExitGameError;

    fn from_str(s: &str) -> crate::Result<Self> {
        parse_hex(s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// TxHash
// ---------------------------------------------------------------------------

/// SHA-256 digest of a serialized transaction. Also used for block roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TxHash(#[serde(with = "hex_array")] pub [u8; 32]);

impl TxHash {
    /// Hash raw transaction bytes.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First four bytes as hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Commitment root of a block.
pub type BlockRoot = TxHash;

// ---------------------------------------------------------------------------
// ExitId
// ---------------------------------------------------------------------------

/// Identity of an exit claim: `SHA-256(domain || tx_ref || owner || coordinate)`.
///
/// Two claims by the same owner on the same output of the same transaction
/// always collide, which is what makes duplicate exits detectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ExitId(#[serde(with = "hex_array")] pub [u8; 32]);

impl ExitId {
    #[must_use]
    pub fn derive(transaction_ref: &TxHash, owner: &Address, coordinate: &OutputCoordinate) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::EXIT_ID_DOMAIN);
        hasher.update(transaction_ref.0);
        hasher.update(owner.0);
        hasher.update(coordinate.block_number.to_be_bytes());
        hasher.update(coordinate.tx_index.to_be_bytes());
        hasher.update([coordinate.output_index]);
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for ExitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit:{}", hex::encode(&self.0[..8]))
    }
}
