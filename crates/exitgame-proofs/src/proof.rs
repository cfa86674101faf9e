//! Inclusion proof wire format.
//!
//! ```text
//! tx_index (u32, big-endian) || sibling_0 (32 bytes) || ... || sibling_n (32 bytes)
//! ```
//!
//! Siblings run leaf-to-root. The proof carries its own position, which is
//! how the exit game learns the transaction index of a claimed output.

use exitgame_types::{
    ExitGameError, Result,
    constants::{MAX_PROOF_DEPTH, PROOF_INDEX_LEN, PROOF_NODE_LEN},
};

/// A decoded Merkle inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    /// Position of the leaf inside the block.
    pub tx_index: u32,
    /// Sibling hashes from the leaf level up to just below the root.
    pub siblings: Vec<[u8; 32]>,
}

impl InclusionProof {
    /// Decode a proof from its wire bytes.
    ///
    /// # Errors
    /// [`ExitGameError::InvalidProof`] if the buffer is shorter than the
    /// index prefix, has a trailing partial node, or is deeper than
    /// [`MAX_PROOF_DEPTH`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let Some((index, rest)) = bytes.split_first_chunk::<PROOF_INDEX_LEN>() else {
            return Err(ExitGameError::InvalidProof {
                reason: format!("proof too short: {} bytes", bytes.len()),
            });
        };
        if rest.len() % PROOF_NODE_LEN != 0 {
            return Err(ExitGameError::InvalidProof {
                reason: format!("trailing {} bytes after sibling list", rest.len() % PROOF_NODE_LEN),
            });
        }
        let depth = rest.len() / PROOF_NODE_LEN;
        if depth > MAX_PROOF_DEPTH {
            return Err(ExitGameError::InvalidProof {
                reason: format!("proof depth {depth} exceeds {MAX_PROOF_DEPTH}"),
            });
        }

        let siblings = rest
            .chunks_exact(PROOF_NODE_LEN)
            .map(|chunk| {
                let mut node = [0u8; 32];
                node.copy_from_slice(chunk);
                node
            })
            .collect();

        Ok(Self {
            tx_index: u32::from_be_bytes(*index),
            siblings,
        })
    }

    /// Encode to wire bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PROOF_INDEX_LEN + self.siblings.len() * PROOF_NODE_LEN);
        out.extend_from_slice(&self.tx_index.to_be_bytes());
        for node in &self.siblings {
            out.extend_from_slice(node);
        }
        out
    }

    /// Tree depth implied by the sibling count.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_index_only() {
        let proof = InclusionProof::decode(&7u32.to_be_bytes()).unwrap();
        assert_eq!(proof.tx_index, 7);
        assert!(proof.siblings.is_empty());
    }

    #[test]
    fn decode_with_siblings() {
        let mut bytes = 3u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[1u8; 32]);
        bytes.extend_from_slice(&[2u8; 32]);
        let proof = InclusionProof::decode(&bytes).unwrap();
        assert_eq!(proof.tx_index, 3);
        assert_eq!(proof.siblings, vec![[1u8; 32], [2u8; 32]]);
        assert_eq!(proof.encode(), bytes);
    }

    #[test]
    fn short_buffer_rejected() {
        let err = InclusionProof::decode(&[0, 1]).unwrap_err();
        assert!(matches!(err, ExitGameError::InvalidProof { .. }));
    }

    #[test]
    fn partial_node_rejected() {
        let mut bytes = 0u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[9u8; 31]);
        let err = InclusionProof::decode(&bytes).unwrap_err();
        assert!(matches!(err, ExitGameError::InvalidProof { .. }));
    }

    #[test]
    fn too_deep_rejected() {
        let mut bytes = 0u32.to_be_bytes().to_vec();
        bytes.extend(std::iter::repeat_n(0u8, (MAX_PROOF_DEPTH + 1) * PROOF_NODE_LEN));
        let err = InclusionProof::decode(&bytes).unwrap_err();
        assert!(matches!(err, ExitGameError::InvalidProof { .. }));
    }
}
