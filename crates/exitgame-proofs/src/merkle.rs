//! SHA-256 binary Merkle tree over the serialized transactions of a block.
//!
//! - Leaf: `SHA-256(0x00 || tx_bytes)`
//! - Node: `SHA-256(0x01 || left || right)`
//! - Leaves are padded with [`EMPTY_LEAF`] up to the next power of two.
//!
//! The domain prefixes keep a leaf from ever being reinterpreted as an
//! inner node.

use exitgame_types::BlockRoot;
use sha2::{Digest, Sha256};

use crate::proof::InclusionProof;

/// Padding value for unused leaf slots.
pub const EMPTY_LEAF: [u8; 32] = [0u8; 32];

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Hash a serialized transaction into a leaf.
#[must_use]
pub fn leaf_hash(tx_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(tx_bytes);
    hasher.finalize().into()
}

/// Hash two children into their parent.
#[must_use]
pub fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Fold a leaf up through the proof's siblings.
///
/// Returns `None` if the index does not fit in a tree of the proof's depth.
#[must_use]
pub fn compute_root(leaf: [u8; 32], proof: &InclusionProof) -> Option<[u8; 32]> {
    let depth = u32::try_from(proof.depth()).ok()?;
    if u64::from(proof.tx_index).checked_shr(depth).unwrap_or(0) != 0 {
        return None;
    }

    let mut node = leaf;
    let mut index = proof.tx_index;
    for sibling in &proof.siblings {
        node = if index & 1 == 0 {
            node_hash(&node, sibling)
        } else {
            node_hash(sibling, &node)
        };
        index >>= 1;
    }
    Some(node)
}

/// A fully built block tree, kept by whoever commits blocks so it can hand
/// out proofs.
#[derive(Debug, Clone)]
pub struct BlockTree {
    /// `levels[0]` are the padded leaves, the last level holds the root.
    levels: Vec<Vec<[u8; 32]>>,
    tx_count: usize,
}

impl BlockTree {
    /// Build the tree over serialized transactions in block order.
    #[must_use]
    pub fn build<T: AsRef<[u8]>>(transactions: &[T]) -> Self {
        let tx_count = transactions.len();
        let width = tx_count.max(1).next_power_of_two();

        let mut leaves: Vec<[u8; 32]> = transactions
            .iter()
            .map(|tx| leaf_hash(tx.as_ref()))
            .collect();
        leaves.resize(width, EMPTY_LEAF);

        let mut levels = vec![leaves];
        while levels.last().is_some_and(|level| level.len() > 1) {
            let parent = levels
                .last()
                .map(|level| {
                    level
                        .chunks_exact(2)
                        .map(|pair| node_hash(&pair[0], &pair[1]))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            levels.push(parent);
        }

        Self { levels, tx_count }
    }

    #[must_use]
    pub fn root(&self) -> BlockRoot {
        let root = self
            .levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(EMPTY_LEAF);
        BlockRoot::from_bytes(root)
    }

    /// Number of real (unpadded) transactions.
    #[must_use]
    pub fn tx_count(&self) -> usize {
        self.tx_count
    }

    /// Proof for the transaction at `tx_index`, or `None` if out of range.
    #[must_use]
    pub fn proof(&self, tx_index: u32) -> Option<InclusionProof> {
        let mut position = usize::try_from(tx_index).ok()?;
        if position >= self.tx_count {
            return None;
        }

        let depth = self.levels.len() - 1;
        let mut siblings = Vec::with_capacity(depth);
        for level in &self.levels[..depth] {
            siblings.push(level[position ^ 1]);
            position >>= 1;
        }
        Some(InclusionProof { tx_index, siblings })
    }
}
