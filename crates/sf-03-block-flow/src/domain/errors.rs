//! # Store Errors

use sf_02_chain_model::TxOutputRef;
use shared_types::{ChainIndex, Hash};
use thiserror::Error;

/// Errors from the multi-chain store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// No header or block with this hash.
    #[error("Block not found: {}", hex::encode(.0))]
    BlockNotFound(Hash),

    /// Only the header is known; the body was never stored.
    #[error("Block body not stored: {}", hex::encode(.0))]
    BodyNotStored(Hash),

    /// A dependency of the block is not in the store.
    #[error("Missing dependency {} of block {}", hex::encode(.dep), hex::encode(.hash))]
    MissingDependency { hash: Hash, dep: Hash },

    /// Deps length does not match the store's group count.
    #[error("Invalid deps length: expected {expected}, got {actual}")]
    InvalidDeps { expected: usize, actual: usize },

    /// The chain has no tip (the store was built for another group count).
    #[error("Unknown chain {0}")]
    UnknownChain(ChainIndex),

    /// Genesis blocks are installed at construction only.
    #[error("Genesis blocks cannot be added")]
    GenesisImmutable,

    /// An input is not in the UTXO set when the block is applied.
    #[error("Input {}:{} already spent", hex::encode(.0.tx_id), .0.index)]
    InputSpent(TxOutputRef),

    /// A transfer of zero.
    #[error("Transfer amount must be positive")]
    InvalidAmount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlowError::BlockNotFound([0xab; 32]);
        assert!(err.to_string().starts_with("Block not found: abab"));
        let err = FlowError::UnknownChain(ChainIndex::new(1, 2));
        assert_eq!(err.to_string(), "Unknown chain 1->2");
        let err = FlowError::InputSpent(TxOutputRef {
            tx_id: [0xcd; 32],
            index: 1,
        });
        assert!(err.to_string().ends_with(":1 already spent"));
    }
}
