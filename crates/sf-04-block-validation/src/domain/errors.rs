//! Error types for block validation.

use sf_02_chain_model::{Target, TxOutputRef};
use sf_03_block_flow::FlowError;
use shared_types::{ChainIndex, Hash};
use thiserror::Error;

/// Why a block was rejected.
///
/// Header variants come first, in the order the rules are checked; body
/// variants follow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidBlockReason {
    #[error("Block hashes to chain {actual}, handler serves {expected}")]
    WrongChain {
        expected: ChainIndex,
        actual: ChainIndex,
    },

    #[error("Genesis blocks are not accepted from the network")]
    GenesisBlock,

    #[error("Invalid deps length: expected {expected}, got {actual}")]
    InvalidDepsLength { expected: usize, actual: usize },

    #[error("Target {target} is easier than the maximum {max}")]
    TargetTooEasy { target: Target, max: Target },

    #[error("Block hash does not meet its target")]
    InsufficientWork,

    #[error("Timestamp {timestamp} is too far in the future (now {now})")]
    FutureTimestamp { timestamp: u64, now: u64 },

    #[error("Unknown dependency {}", hex::encode(.0))]
    MissingDependency(Hash),

    #[error("Dependency {} lives on chain {actual}", hex::encode(.dep))]
    DependencyOnWrongChain { dep: Hash, actual: ChainIndex },

    #[error("Timestamp {timestamp} not after parent timestamp {parent}")]
    NonIncreasingTimestamp { timestamp: u64, parent: u64 },

    #[error("Block has no transactions")]
    EmptyBlock,

    #[error("Last transaction is not a coinbase")]
    MissingCoinbase,

    #[error("Coinbase-shaped transaction at index {0}")]
    MisplacedCoinbase(usize),

    #[error("Duplicate transaction {}", hex::encode(.0))]
    DuplicateTransaction(Hash),

    #[error("Transactions do not match the header's merkle root")]
    InvalidMerkleRoot,

    #[error("Coinbase pays {actual}, expected {expected}")]
    InvalidCoinbaseReward {
        expected: primitive_types::U256,
        actual: primitive_types::U256,
    },

    #[error("Coinbase data does not carry chain {0}")]
    InvalidCoinbaseChain(ChainIndex),

    #[error("Malformed transaction {}: {reason}", hex::encode(.tx))]
    MalformedTransaction { tx: Hash, reason: &'static str },

    #[error("Transaction {} belongs to another chain", hex::encode(.0))]
    TransactionOnWrongChain(Hash),

    #[error("Output {}:{} spent twice", hex::encode(.0.tx_id), .0.index)]
    DoubleSpend(TxOutputRef),

    #[error("Input {}:{} is not an unspent output", hex::encode(.0.tx_id), .0.index)]
    MissingInput(TxOutputRef),

    #[error("Input {}:{} is not owned by its public key", hex::encode(.0.tx_id), .0.index)]
    InvalidInputOwner(TxOutputRef),

    #[error("Invalid signature on transaction {}", hex::encode(.0))]
    InvalidSignature(Hash),

    #[error("Transaction {} spends more than its inputs", hex::encode(.0))]
    InsufficientInputs(Hash),

    #[error("Store error: {0}")]
    Store(#[from] FlowError),
}

impl InvalidBlockReason {
    /// True for failures of the header rules.
    pub fn is_header_error(&self) -> bool {
        matches!(
            self,
            Self::WrongChain { .. }
                | Self::GenesisBlock
                | Self::InvalidDepsLength { .. }
                | Self::TargetTooEasy { .. }
                | Self::InsufficientWork
                | Self::FutureTimestamp { .. }
                | Self::MissingDependency(_)
                | Self::DependencyOnWrongChain { .. }
                | Self::NonIncreasingTimestamp { .. }
        )
    }
}

/// Failures talking to the per-chain processors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("Processor for chain {0} has stopped")]
    ProcessorStopped(ChainIndex),

    #[error("Chain {0} is outside the group configuration")]
    UnknownChain(ChainIndex),
}
