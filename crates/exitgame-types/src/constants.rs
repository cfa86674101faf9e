//! System-wide constants for the exit game.

/// Default challenge window in seconds (one week).
pub const DEFAULT_EXIT_DELAY_SECS: u64 = 7 * 24 * 60 * 60;

/// Default collateral bond, in the smallest unit of the settlement asset.
pub const DEFAULT_EXIT_BOND: u64 = 100_000_000_000_000_000;

/// Default number of queue entries processed by one finalize call when the
/// caller does not supply its own budget.
pub const DEFAULT_FINALIZE_BUDGET: usize = 100;

/// Bit offset of the block number inside a [`crate::PriorityKey`].
pub const PRIORITY_BLOCK_SHIFT: u32 = 40;

/// Bit offset of the transaction index inside a [`crate::PriorityKey`].
pub const PRIORITY_TX_SHIFT: u32 = 8;

/// Domain tag for exit identifier hashing.
pub const EXIT_ID_DOMAIN: &[u8] = b"exitgame:exit_id:v1:";

/// Length in bytes of the tx-index prefix of an encoded inclusion proof.
pub const PROOF_INDEX_LEN: usize = 4;

/// Length in bytes of one sibling hash in an encoded inclusion proof.
pub const PROOF_NODE_LEN: usize = 32;

/// Maximum Merkle depth accepted from a proof (2^32 transactions per block).
pub const MAX_PROOF_DEPTH: usize = 32;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
