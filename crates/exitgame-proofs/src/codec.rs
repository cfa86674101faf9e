//! Transaction encoding port.
//!
//! The exit game treats serialized transactions as opaque bytes except where
//! it must read an output (to exit it) or an input (to prove a spend).

use exitgame_types::{ExitGameError, Result, Transaction};

/// Converts between transaction bytes and the decoded [`Transaction`] view.
pub trait TransactionCodec: Send + Sync {
    /// Decode serialized bytes.
    ///
    /// # Errors
    /// [`ExitGameError::MalformedTransaction`] if the bytes are not a transaction.
    fn decode(&self, bytes: &[u8]) -> Result<Transaction>;

    /// Serialize a transaction.
    fn encode(&self, tx: &Transaction) -> Result<Vec<u8>>;
}

/// Reference codec: canonical `serde_json` bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl TransactionCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Transaction> {
        serde_json::from_slice(bytes).map_err(|e| ExitGameError::MalformedTransaction {
            reason: e.to_string(),
        })
    }

    fn encode(&self, tx: &Transaction) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(tx)?)
    }
}
