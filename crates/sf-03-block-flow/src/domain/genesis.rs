//! Genesis blocks, one per chain.
//!
//! Intra-group chain `(g, g)` credits every allocation whose address lives
//! in group `g`; the other chains start empty.

use crate::domain::entities::GenesisAllocation;
use sf_02_chain_model::{group_of, mine_genesis, Block, Transaction, GENESIS_TIMESTAMP};
use shared_types::GroupConfig;

/// Genesis blocks for every chain, in row-major order.
pub fn genesis_blocks(groups: &GroupConfig, allocations: &[GenesisAllocation]) -> Vec<Block> {
    groups
        .chain_indexes()
        .into_iter()
        .map(|ci| {
            let transactions = if ci.is_intra_group() {
                allocations
                    .iter()
                    .filter(|a| group_of(&a.address, groups) == ci.to)
                    .map(|a| Transaction::coinbase(ci, GENESIS_TIMESTAMP, a.address, a.amount))
                    .collect()
            } else {
                Vec::new()
            };
            mine_genesis(groups, ci, transactions)
        })
        .collect()
}
