//! Inclusion and spend verification port, and its Merkle adapter.

use exitgame_types::{BlockRoot, OutputCoordinate};

use crate::{
    codec::TransactionCodec,
    merkle::{compute_root, leaf_hash},
    proof::InclusionProof,
};

/// Verifies that transactions are committed in blocks.
///
/// Implementations must be pure: the same arguments always give the same
/// answer, so a rejected call can be replayed for diagnosis.
pub trait ProofVerifier: Send + Sync {
    /// Does `tx_bytes` sit at `coordinate`'s transaction position under `root`?
    fn verify_inclusion(
        &self,
        root: &BlockRoot,
        coordinate: &OutputCoordinate,
        tx_bytes: &[u8],
        proof: &InclusionProof,
    ) -> bool;

    /// Is `spending_tx` committed under `root`, consuming `target` at input
    /// `input_index`?
    fn verify_spend(
        &self,
        root: &BlockRoot,
        input_index: u8,
        spending_tx: &[u8],
        proof: &InclusionProof,
        target: &OutputCoordinate,
    ) -> bool;
}

/// [`ProofVerifier`] over [`crate::BlockTree`] commitments.
#[derive(Debug, Clone, Default)]
pub struct MerkleVerifier<C> {
    codec: C,
}

impl<C: TransactionCodec> MerkleVerifier<C> {
    #[must_use]
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    fn is_committed(root: &BlockRoot, tx_bytes: &[u8], proof: &InclusionProof) -> bool {
        compute_root(leaf_hash(tx_bytes), proof).is_some_and(|computed| computed == root.0)
    }
}

impl<C: TransactionCodec> ProofVerifier for MerkleVerifier<C> {
    fn verify_inclusion(
        &self,
        root: &BlockRoot,
        coordinate: &OutputCoordinate,
        tx_bytes: &[u8],
        proof: &InclusionProof,
    ) -> bool {
        proof.tx_index == coordinate.tx_index && Self::is_committed(root, tx_bytes, proof)
    }

    fn verify_spend(
        &self,
        root: &BlockRoot,
        input_index: u8,
        spending_tx: &[u8],
        proof: &InclusionProof,
        target: &OutputCoordinate,
    ) -> bool {
        let spends = match self.codec.decode(spending_tx) {
            Ok(tx) => tx.spends_at(input_index, target),
            Err(err) => {
                tracing::debug!(%err, "Spend proof carries undecodable transaction");
                false
            }
        };
        spends && Self::is_committed(root, spending_tx, proof)
    }
}
