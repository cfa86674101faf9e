//! Decoded view of a layer-two transaction.
//!
//! The exit game never builds transactions itself; it only needs to read the
//! inputs a transaction consumes and the outputs it creates. Byte encoding is
//! left to a pluggable codec.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{Address, OutputCoordinate};

/// Kind of layer-two transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    /// Operator-issued funding transaction backed by a deposit.
    Fund,
    /// Spends one input into one or more outputs.
    Split,
    /// Spends several inputs into one output.
    Merge,
}

impl std::fmt::Display for TxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fund => write!(f, "FUND"),
            Self::Split => write!(f, "SPLIT"),
            Self::Merge => write!(f, "MERGE"),
        }
    }
}

/// A single transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub owner: Address,
    pub amount: U256,
}

/// A transaction: the outputs it consumes and the outputs it creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_type: TxType,
    pub inputs: Vec<OutputCoordinate>,
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Output at `index`, if in range.
    #[must_use]
    pub fn output(&self, index: u8) -> Option<&TxOutput> {
        self.outputs.get(usize::from(index))
    }

    /// Input at `index`, if in range.
    #[must_use]
    pub fn input(&self, index: u8) -> Option<&OutputCoordinate> {
        self.inputs.get(usize::from(index))
    }

    /// Whether this transaction consumes `coordinate` at input `index`.
    #[must_use]
    pub fn spends_at(&self, index: u8, coordinate: &OutputCoordinate) -> bool {
        self.input(index) == Some(coordinate)
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Transaction {
    /// Funding transaction paying `amount` to `owner`.
    ///
    /// Carries the conventional all-zero placeholder input.
    #[must_use]
    pub fn fund(owner: Address, amount: u64) -> Self {
        Self {
            tx_type: TxType::Fund,
            inputs: vec![OutputCoordinate::new(0, 0, 0)],
            outputs: vec![TxOutput {
                owner,
                amount: U256::from(amount),
            }],
        }
    }

    /// Single-input transaction moving `input` to `owner`.
    #[must_use]
    pub fn split(input: OutputCoordinate, owner: Address, amount: u64) -> Self {
        Self {
            tx_type: TxType::Split,
            inputs: vec![input],
            outputs: vec![TxOutput {
                owner,
                amount: U256::from(amount),
            }],
        }
    }
}
