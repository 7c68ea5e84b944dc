//! # Core Entities
//!
//! Identity types shared across the node.
//!
//! ## Clusters
//!
//! - **Chain**: `Hash`, `GroupIndex`
//! - **Accounts**: `Address`, `PublicKey`, `SignatureBytes`
//! - **Networking**: `PeerId`, `CliqueId`, `DataOrigin`

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte hash (BLAKE3 output).
pub type Hash = [u8; 32];

/// The all-zero hash. Used as the deps of genesis headers.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Renders a hash as lowercase hex. Used in logs and RPC payloads.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Index of a group (shard row/column), always in `[0, G)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupIndex(pub usize);

impl GroupIndex {
    /// Raw index value.
    pub fn value(self) -> usize {
        self.0
    }
}

impl fmt::Display for GroupIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CLUSTER B: ACCOUNTS
// =============================================================================

/// A 32-byte address: the hash of an Ed25519 public key.
pub type Address = [u8; 32];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type SignatureBytes = [u8; 64];

// =============================================================================
// CLUSTER C: NETWORKING
// =============================================================================

/// Identifier of a remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PeerId(pub [u8; 32]);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

/// Identifier of a clique (a cluster of brokers serving every shard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CliqueId(pub [u8; 32]);

/// Where a block handed to validation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataOrigin {
    /// Produced by this node (miner or RPC).
    Local,
    /// Received from a peer in another clique.
    InterClique(PeerId),
    /// Received from a broker of this node's own clique.
    IntraClique(PeerId),
}

impl DataOrigin {
    /// True for blocks produced by this node.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// True for blocks received from another clique.
    pub fn is_inter_clique(&self) -> bool {
        matches!(self, Self::InterClique(_))
    }

    /// True for blocks received from this node's own clique.
    pub fn is_intra_clique(&self) -> bool {
        matches!(self, Self::IntraClique(_))
    }

    /// The sending peer, if any.
    pub fn peer(&self) -> Option<PeerId> {
        match self {
            Self::Local => None,
            Self::InterClique(peer) | Self::IntraClique(peer) => Some(*peer),
        }
    }
}
