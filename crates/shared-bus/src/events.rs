//! # Node Events
//!
//! Every event that flows through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{ChainIndex, DataOrigin, Hash};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeEvent {
    // =========================================================================
    // VALIDATION OUTCOMES
    // =========================================================================
    /// A block is now known to the store (freshly persisted or already present).
    BlockAdded {
        /// Hash of the block.
        hash: Hash,
        /// Chain the block belongs to.
        chain_index: ChainIndex,
        /// Where the block came from.
        origin: DataOrigin,
    },

    /// A block failed validation and was discarded.
    InvalidBlock {
        /// Hash of the block.
        hash: Hash,
        /// Chain the block claims to belong to.
        chain_index: ChainIndex,
        /// Where the block came from.
        origin: DataOrigin,
        /// Human-readable rejection reason.
        reason: String,
    },

    // =========================================================================
    // BROADCAST REQUESTS
    // =========================================================================
    /// Forward the block to the other brokers of this clique.
    BroadcastIntraClique {
        /// Hash of the block.
        hash: Hash,
        /// Chain the block belongs to.
        chain_index: ChainIndex,
        /// Where the block came from; the sender is excluded from the fan-out.
        origin: DataOrigin,
        /// Serialized block.
        block: Vec<u8>,
    },

    /// Forward the block to peers in other cliques.
    BroadcastInterClique {
        /// Hash of the block.
        hash: Hash,
        /// Chain the block belongs to.
        chain_index: ChainIndex,
        /// Where the block came from; the sender is excluded from the fan-out.
        origin: DataOrigin,
        /// Serialized block.
        block: Vec<u8>,
    },

    // =========================================================================
    // MINING
    // =========================================================================
    /// The local miner found a block and handed it to validation.
    BlockMined {
        /// Hash of the mined block.
        hash: Hash,
        /// Chain the block was mined for.
        chain_index: ChainIndex,
    },

    /// The miner was switched on or off.
    MiningStatusChanged {
        /// True when mining is now running.
        active: bool,
    },

    // =========================================================================
    // CRITICAL EVENTS
    // =========================================================================
    /// Error requiring operator attention.
    CriticalError {
        /// Component that hit the error.
        component: String,
        /// Error description.
        error: String,
    },
}

impl NodeEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockAdded { .. } | Self::InvalidBlock { .. } => EventTopic::Validation,
            Self::BroadcastIntraClique { .. } | Self::BroadcastInterClique { .. } => {
                EventTopic::Broadcast
            }
            Self::BlockMined { .. } | Self::MiningStatusChanged { .. } => EventTopic::Mining,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }

    /// The chain this event concerns, if any.
    #[must_use]
    pub fn chain_index(&self) -> Option<ChainIndex> {
        match self {
            Self::BlockAdded { chain_index, .. }
            | Self::InvalidBlock { chain_index, .. }
            | Self::BroadcastIntraClique { chain_index, .. }
            | Self::BroadcastInterClique { chain_index, .. }
            | Self::BlockMined { chain_index, .. } => Some(*chain_index),
            Self::MiningStatusChanged { .. } | Self::CriticalError { .. } => None,
        }
    }

    /// The block hash this event concerns, if any.
    #[must_use]
    pub fn block_hash(&self) -> Option<Hash> {
        match self {
            Self::BlockAdded { hash, .. }
            | Self::InvalidBlock { hash, .. }
            | Self::BroadcastIntraClique { hash, .. }
            | Self::BroadcastInterClique { hash, .. }
            | Self::BlockMined { hash, .. } => Some(*hash),
            Self::MiningStatusChanged { .. } | Self::CriticalError { .. } => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// `BlockAdded` / `InvalidBlock`.
    Validation,
    /// Intra- and inter-clique broadcast requests.
    Broadcast,
    /// Miner activity.
    Mining,
    /// Critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Chains to include. Empty means all chains; events without a chain
    /// always pass.
    pub chain_indexes: Vec<ChainIndex>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            chain_indexes: Vec::new(),
        }
    }

    /// Create a filter for events about specific chains.
    #[must_use]
    pub fn chains(chain_indexes: Vec<ChainIndex>) -> Self {
        Self {
            topics: Vec::new(),
            chain_indexes,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &NodeEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let chain_match = self.chain_indexes.is_empty()
            || event
                .chain_index()
                .map_or(true, |ci| self.chain_indexes.contains(&ci));

        topic_match && chain_match
    }
}
