//! Notifications emitted by the exit game for off-chain indexers.
//!
//! Events are not needed for correctness; they form an append-only trail an
//! embedder drains after each call.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{Address, ExitId, OutputCoordinate, PriorityKey, TxHash};

/// Where a forfeited bond went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondDisposition {
    Burned,
    Swept(Address),
}

/// A single exit game notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitEvent {
    /// The full transaction backing a new exit, so indexers can reconstruct it.
    ExitTransactionPublished {
        transaction_ref: TxHash,
        tx_data: Vec<u8>,
    },
    /// Settlement priority assigned to a new exit.
    ExitPriorityAssigned {
        exit_id: ExitId,
        priority: PriorityKey,
    },
    /// A new exit entered the queue.
    ExitStarted {
        exit_id: ExitId,
        owner: Address,
        coordinate: OutputCoordinate,
    },
    /// An exit was shown to be spent and is now invalid.
    ExitChallenged {
        exit_id: ExitId,
        spend_block_number: u32,
        spend_tx_index: u32,
    },
    /// An exit left the queue.
    ExitFinalized {
        exit_id: ExitId,
        paid: bool,
        payout: U256,
    },
    /// The bond of an invalid exit was forfeited.
    BondForfeited {
        exit_id: ExitId,
        bond: U256,
        disposition: BondDisposition,
    },
}

impl ExitEvent {
    /// Exit this event concerns, if any.
    #[must_use]
    pub fn exit_id(&self) -> Option<ExitId> {
        match self {
            Self::ExitTransactionPublished { .. } => None,
            Self::ExitPriorityAssigned { exit_id, .. }
            | Self::ExitStarted { exit_id, .. }
            | Self::ExitChallenged { exit_id, .. }
            | Self::ExitFinalized { exit_id, .. }
            | Self::BondForfeited { exit_id, .. } => Some(*exit_id),
        }
    }
}
