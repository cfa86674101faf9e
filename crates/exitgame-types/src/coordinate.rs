//! Output coordinates and the priority key derived from them.
//!
//! An output is located by `(block_number, tx_index, output_index)`. The
//! [`PriorityKey`] packs that triple into one unsigned integer with the block
//! number most significant, so a lower key always means an older output and
//! an earlier settlement slot, independent of when the exit was submitted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{PRIORITY_BLOCK_SHIFT, PRIORITY_TX_SHIFT};

/// Location of a transaction output inside a committed block.
///
/// Field order matters: the derived `Ord` is lexicographic and must agree
/// with [`PriorityKey`] ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OutputCoordinate {
    pub block_number: u32,
    pub tx_index: u32,
    pub output_index: u8,
}

impl OutputCoordinate {
    #[must_use]
    pub fn new(block_number: u32, tx_index: u32, output_index: u8) -> Self {
        Self {
            block_number,
            tx_index,
            output_index,
        }
    }

    #[must_use]
    pub fn priority(&self) -> PriorityKey {
        PriorityKey::from(*self)
    }

    /// Whether a transaction at `(block_number, tx_index)` sits strictly after
    /// the transaction that created this output.
    ///
    /// Within one block, position decides: a spender must have a higher
    /// transaction index than the creator.
    #[must_use]
    pub fn is_created_before(&self, block_number: u32, tx_index: u32) -> bool {
        (self.block_number, self.tx_index) < (block_number, tx_index)
    }
}

impl fmt::Display for OutputCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.block_number, self.tx_index, self.output_index
        )
    }
}

/// Total-order settlement key. Lower key = higher priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PriorityKey(pub u128);

impl PriorityKey {
    /// Big-endian bytes, whose byte order matches numeric order.
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    /// Recover the coordinate this key was built from.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn coordinate(self) -> OutputCoordinate {
        OutputCoordinate {
            block_number: (self.0 >> PRIORITY_BLOCK_SHIFT) as u32,
            tx_index: (self.0 >> PRIORITY_TX_SHIFT) as u32,
            output_index: self.0 as u8,
        }
    }
}

impl From<OutputCoordinate> for PriorityKey {
    fn from(c: OutputCoordinate) -> Self {
        Self(
            (u128::from(c.block_number) << PRIORITY_BLOCK_SHIFT)
                | (u128::from(c.tx_index) << PRIORITY_TX_SHIFT)
                | u128::from(c.output_index),
        )
    }
}

impl fmt::Display for PriorityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_number_dominates() {
        let old = OutputCoordinate::new(1, u32::MAX, u8::MAX).priority();
        let new = OutputCoordinate::new(2, 0, 0).priority();
        assert!(old < new);
    }

    #[test]
    fn tx_index_then_output_index() {
        let a = OutputCoordinate::new(5, 1, 200).priority();
        let b = OutputCoordinate::new(5, 2, 0).priority();
        let c = OutputCoordinate::new(5, 2, 1).priority();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn key_order_matches_coordinate_order() {
        let coords = [
            OutputCoordinate::new(0, 0, 0),
            OutputCoordinate::new(0, 0, 255),
            OutputCoordinate::new(0, 9, 0),
            OutputCoordinate::new(3, 0, 7),
            OutputCoordinate::new(u32::MAX, u32::MAX, u8::MAX),
        ];
        for pair in coords.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].priority() < pair[1].priority());
        }
    }

    #[test]
    fn key_decodes_back_to_coordinate() {
        let c = OutputCoordinate::new(u32::MAX, 123_456, 9);
        assert_eq!(c.priority().coordinate(), c);
    }

    #[test]
    fn be_bytes_preserve_order() {
        let a = OutputCoordinate::new(1, 0, 0).priority();
        let b = OutputCoordinate::new(1, 256, 0).priority();
        assert!(a.to_be_bytes() < b.to_be_bytes());
        assert_eq!(PriorityKey::from_be_bytes(b.to_be_bytes()), b);
    }

    #[test]
    fn same_block_spend_must_come_later() {
        let c = OutputCoordinate::new(4, 2, 0);
        assert!(c.is_created_before(4, 3));
        assert!(!c.is_created_before(4, 2));
        assert!(!c.is_created_before(4, 1));
        assert!(c.is_created_before(5, 0));
        assert!(!c.is_created_before(3, 9));
    }

    #[test]
    fn display_format() {
        assert_eq!(OutputCoordinate::new(1, 2, 3).to_string(), "1:2:3");
    }
}
