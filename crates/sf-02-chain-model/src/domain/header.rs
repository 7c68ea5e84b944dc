//! # Block Header
//!
//! ## Wire layout
//!
//! ```text
//! u32 deps count ++ deps (32 bytes each) ++ txs_hash (32)
//!   ++ u64 timestamp ++ target (4) ++ nonce (32, big-endian)
//! ```
//!
//! The nonce is fixed-width so the header size never changes while mining.
//! The hash is recomputed from these bytes on every call.

use crate::domain::block_deps::BlockDeps;
use crate::domain::target::Target;
use primitive_types::U256;
use shared_crypto::double_hash;
use shared_types::{ChainIndex, Decode, Encode, FormatError, GroupConfig, GroupIndex, Hash, Reader};

/// Timestamp (ms) shared by every genesis header. Nothing else may use it.
pub const GENESIS_TIMESTAMP: u64 = 1_231_006_505_000;

/// Block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub block_deps: BlockDeps,
    pub txs_hash: Hash,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub target: Target,
    pub nonce: U256,
}

impl BlockHeader {
    /// Genesis header: all-zero deps and the genesis timestamp.
    pub fn genesis(groups: &GroupConfig, txs_hash: Hash, target: Target, nonce: U256) -> Self {
        Self {
            block_deps: BlockDeps::genesis(groups),
            txs_hash,
            timestamp: GENESIS_TIMESTAMP,
            target,
            nonce,
        }
    }

    /// Assemble a header from already-built deps.
    pub fn unsafe_new(
        block_deps: BlockDeps,
        txs_hash: Hash,
        timestamp: u64,
        target: Target,
        nonce: U256,
    ) -> Self {
        Self {
            block_deps,
            txs_hash,
            timestamp,
            target,
            nonce,
        }
    }

    /// `blake3(blake3(header bytes))`.
    pub fn hash(&self) -> Hash {
        double_hash(&self.to_bytes())
    }

    /// The chain this header belongs to, derived from its hash.
    pub fn chain_index(&self, groups: &GroupConfig) -> ChainIndex {
        ChainIndex::from_hash(&self.hash(), groups)
    }

    /// True for genesis headers.
    pub fn is_genesis(&self) -> bool {
        self.timestamp == GENESIS_TIMESTAMP
    }

    /// In-deps. Panics on genesis headers.
    pub fn in_deps(&self) -> &[Hash] {
        assert!(!self.is_genesis(), "genesis header has no deps");
        self.block_deps.in_deps()
    }

    /// Out-deps. Panics on genesis headers.
    pub fn out_deps(&self) -> &[Hash] {
        assert!(!self.is_genesis(), "genesis header has no deps");
        self.block_deps.out_deps()
    }

    /// Parent on the header's own chain. Panics on genesis headers.
    pub fn parent_hash(&self, groups: &GroupConfig) -> Hash {
        assert!(!self.is_genesis(), "genesis header has no parent");
        self.block_deps.parent_hash(self.chain_index(groups))
    }

    /// Tip of chain `(from, to)` seen by this header. Panics on genesis headers.
    pub fn uncle_hash(&self, to: GroupIndex) -> Hash {
        assert!(!self.is_genesis(), "genesis header has no deps");
        self.block_deps.uncle_hash(to)
    }

    /// Tip of the intra-group chain. Panics on genesis headers.
    pub fn intra_dep(&self, groups: &GroupConfig) -> Hash {
        assert!(!self.is_genesis(), "genesis header has no deps");
        self.block_deps.intra_dep(self.chain_index(groups))
    }
}

impl Encode for BlockHeader {
    fn encode(&self, out: &mut Vec<u8>) {
        (self.block_deps.len() as u32).encode(out);
        for dep in self.block_deps.deps() {
            dep.encode(out);
        }
        self.txs_hash.encode(out);
        self.timestamp.encode(out);
        self.target.encode(out);
        self.nonce.encode(out);
    }
}

impl Decode for BlockHeader {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        let count = reader.length(32)?;
        let mut deps = Vec::with_capacity(count);
        for _ in 0..count {
            deps.push(reader.array::<32>()?);
        }
        Ok(Self {
            block_deps: BlockDeps::from_wire(deps),
            txs_hash: reader.array::<32>()?,
            timestamp: reader.u64()?,
            target: Target::decode(reader)?,
            nonce: U256::decode(reader)?,
        })
    }
}
