//! Committed block roots.
//!
//! Block submission lives outside the exit game. The game only asks whether
//! a block number has a committed root, and which one.

use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

use exitgame_types::{BlockRoot, ExitGameError, Result};

/// Lookup of committed block roots.
pub trait BlockRoots: Send + Sync {
    /// Root of `block_number`, or `None` if it was never committed.
    fn root_of(&self, block_number: u32) -> Option<BlockRoot>;
}

/// Shared in-memory registry of block commitments.
///
/// Cloning yields another handle onto the same registry, so the party that
/// submits blocks and the exit game observe the same commitments.
#[derive(Debug, Clone, Default)]
pub struct CommittedBlocks {
    roots: Arc<RwLock<BTreeMap<u32, BlockRoot>>>,
}

impl CommittedBlocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the root of `block_number`.
    ///
    /// # Errors
    /// [`ExitGameError::BlockAlreadyCommitted`] if the block already has a
    /// root; commitments are immutable.
    pub fn commit(&self, block_number: u32, root: BlockRoot) -> Result<()> {
        let mut roots = self.roots.write().unwrap_or_else(PoisonError::into_inner);
        if roots.contains_key(&block_number) {
            return Err(ExitGameError::BlockAlreadyCommitted(block_number));
        }
        roots.insert(block_number, root);
        tracing::debug!(block = block_number, root = %root.short(), "Block committed");
        Ok(())
    }

    /// Highest committed block number.
    #[must_use]
    pub fn latest(&self) -> Option<u32> {
        self.roots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .next_back()
            .copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlockRoots for CommittedBlocks {
    fn root_of(&self, block_number: u32) -> Option<BlockRoot> {
        self.roots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&block_number)
            .copied()
    }
}
