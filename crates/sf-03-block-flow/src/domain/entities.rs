//! Stored entries.

use primitive_types::U256;
use sf_02_chain_model::{Block, BlockHeader};
use shared_types::{Address, ChainIndex};

/// A header known to the store, with its body when this broker holds it.
#[derive(Debug, Clone)]
pub struct BlockEntry {
    pub header: BlockHeader,
    /// `None` for headers acknowledged from chains another broker serves.
    pub block: Option<Block>,
    pub chain_index: ChainIndex,
    /// Genesis is 0; every other block sits one above its parent.
    pub height: u64,
}

/// Coins credited at genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenesisAllocation {
    pub address: Address,
    pub amount: U256,
}
