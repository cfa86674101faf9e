//! # exitgame-proofs
//!
//! The exit game's view of the outside world's commitments.
//!
//! ## Ports
//!
//! - [`ProofVerifier`]: is a transaction committed at a position, and does
//!   it consume a given output?
//! - [`BlockRoots`]: which root was committed for a block number?
//! - [`TransactionCodec`]: bytes to [`exitgame_types::Transaction`] and back.
//!
//! ## Reference adapters
//!
//! - [`MerkleVerifier`] over SHA-256 [`BlockTree`]s
//! - [`CommittedBlocks`] shared in-memory registry
//! - [`JsonCodec`]
//!
//! Proofs travel as bytes in the [`InclusionProof`] wire format, which
//! embeds the transaction's position inside its block.

pub mod blocks;
pub mod codec;
pub mod merkle;
pub mod proof;
pub mod verifier;

pub use blocks::{BlockRoots, CommittedBlocks};
pub use codec::{JsonCodec, TransactionCodec};
pub use merkle::{BlockTree, compute_root, leaf_hash, node_hash};
pub use proof::InclusionProof;
pub use verifier::{MerkleVerifier, ProofVerifier};
