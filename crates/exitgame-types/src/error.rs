//! Error types for the exit game.
//!
//! All errors use the `EG_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by operation:
//! - 1xx: start-exit errors
//! - 2xx: challenge errors
//! - 3xx: finalize / payout errors
//! - 4xx: block registry errors
//! - 9xx: storage / serialization / configuration / internal errors
//!
//! Every rejected operation leaves exit game state exactly as it was.

use primitive_types::U256;
use thiserror::Error;

use crate::{Address, ExitId, OutputCoordinate};

/// Central error enum for all exit game operations.
#[derive(Debug, Error)]
pub enum ExitGameError {
    // =================================================================
    // Start-exit Errors (1xx)
    // =================================================================
    /// Posted bond differs from the configured collateral.
    #[error("EG_ERR_100: Insufficient bond: required {required}, posted {posted}")]
    InsufficientBond { required: U256, posted: U256 },

    /// The referenced block was never committed.
    #[error("EG_ERR_101: Unknown block {0}")]
    UnknownBlock(u32),

    /// The inclusion or spend proof is malformed or does not verify.
    #[error("EG_ERR_102: Invalid proof: {reason}")]
    InvalidProof { reason: String },

    /// The claimed output index is past the end of the output list.
    #[error("EG_ERR_103: Output index {index} out of range ({outputs} outputs)")]
    OutputIndexOutOfRange { index: u8, outputs: usize },

    /// An exit with this identity already exists.
    #[error("EG_ERR_104: Duplicate exit {0}")]
    DuplicateExit(ExitId),

    /// The transaction bytes could not be decoded.
    #[error("EG_ERR_105: Malformed transaction: {reason}")]
    MalformedTransaction { reason: String },

    /// Only the recipient of an output may exit it.
    #[error("EG_ERR_106: Caller {caller} does not own output (owner {owner})")]
    NotOutputOwner { caller: Address, owner: Address },

    // =================================================================
    // Challenge Errors (2xx)
    // =================================================================
    /// No exit with this identifier exists.
    #[error("EG_ERR_200: Unknown exit {0}")]
    UnknownExit(ExitId),

    /// The exit was already invalidated.
    #[error("EG_ERR_201: Exit already invalid {0}")]
    AlreadyInvalid(ExitId),

    /// The spending transaction does not sit after the exited output.
    #[error(
        "EG_ERR_202: Spend at {spend_block}:{spend_tx_index} is not after exited output {exited}"
    )]
    SpendNotAfterExit {
        exited: OutputCoordinate,
        spend_block: u32,
        spend_tx_index: u32,
    },

    /// The selected input does not reference the exited output.
    #[error("EG_ERR_203: Input {input_index} does not spend {expected}")]
    InputMismatch {
        input_index: u8,
        expected: OutputCoordinate,
    },

    /// The exit has already been settled and left the queue.
    #[error("EG_ERR_204: Exit already finalized {0}")]
    ExitAlreadyFinalized(ExitId),

    // =================================================================
    // Finalize / Payout Errors (3xx)
    // =================================================================
    /// No queue entry could be settled: queue empty or head not mature.
    #[error("EG_ERR_300: Nothing to finalize (queue length {queue_len}, head matures at {head_matures_at:?})")]
    NothingToFinalize {
        queue_len: usize,
        head_matures_at: Option<u64>,
    },

    /// The funds-transfer primitive rejected the payout batch.
    #[error("EG_ERR_301: Payout failed: {reason}")]
    PayoutFailed { reason: String },

    /// Amount arithmetic overflowed.
    #[error("EG_ERR_302: Amount overflow: {reason}")]
    AmountOverflow { reason: String },

    // =================================================================
    // Block Registry Errors (4xx)
    // =================================================================
    /// A block commitment cannot be replaced.
    #[error("EG_ERR_400: Block {0} already committed")]
    BlockAlreadyCommitted(u32),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("EG_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("EG_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("EG_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Key-value store error.
    #[error("EG_ERR_903: Storage error: {0}")]
    Storage(String),
}

impl ExitGameError {
    /// Whether retrying the same call later might succeed.
    ///
    /// Only temporal rejections qualify; malformed input and conflicts never
    /// become valid by waiting.
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::NothingToFinalize { .. })
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ExitGameError>;

impl From<serde_json::Error> for ExitGameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
