//! Messages a chain processor receives and the replies it sends.

use crate::domain::errors::InvalidBlockReason;
use sf_02_chain_model::Block;
use shared_types::{DataOrigin, Hash};
use tokio::sync::oneshot;

/// Reply to the sender of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReply {
    /// Stored, or already known, or acknowledged for another broker.
    BlockAdded(Hash),
    /// Rejected; nothing was persisted or broadcast.
    InvalidBlock(Hash),
}

impl BlockReply {
    /// The block hash the reply concerns.
    pub fn hash(&self) -> Hash {
        match self {
            Self::BlockAdded(hash) | Self::InvalidBlock(hash) => *hash,
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, Self::BlockAdded(_))
    }
}

/// How a processor classified a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Passed every rule and was persisted.
    Valid,
    /// Already in the store.
    AlreadyKnown,
    /// Belongs to a chain another broker validates; the header was acknowledged.
    OutOfBroker,
    /// Failed a rule.
    Invalid(InvalidBlockReason),
}

impl ValidationOutcome {
    /// The reply the sender receives for this outcome.
    pub fn reply(&self, hash: Hash) -> BlockReply {
        match self {
            Self::Invalid(_) => BlockReply::InvalidBlock(hash),
            _ => BlockReply::BlockAdded(hash),
        }
    }
}

/// Request to validate a block.
#[derive(Debug)]
pub struct ValidateBlock {
    pub block: Block,
    pub origin: DataOrigin,
    pub reply_to: oneshot::Sender<BlockReply>,
}

/// Inbox message of a chain processor.
#[derive(Debug)]
pub enum ChainMessage {
    Validate(ValidateBlock),
    /// The node's sync status changed.
    SyncedResult(bool),
}
