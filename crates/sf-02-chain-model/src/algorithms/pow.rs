//! # Proof of Work
//!
//! A header satisfies its target when its hash, read as a big-endian
//! `U256`, does not exceed the target value. Mining for a chain also
//! requires the hash to derive that chain's index, so the nonce search keeps
//! going until both hold.

use crate::domain::block::Block;
use crate::domain::block_deps::BlockDeps;
use crate::domain::header::BlockHeader;
use crate::domain::target::Target;
use crate::domain::transaction::Transaction;
use primitive_types::U256;
use shared_types::{hash_hex, ChainIndex, GroupConfig, Hash};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// True when `hash` meets `target`.
pub fn check_work(hash: &Hash, target: &Target) -> bool {
    U256::from_big_endian(hash) <= target.value()
}

/// Everything of a block except its nonce.
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    pub block_deps: BlockDeps,
    pub transactions: Vec<Transaction>,
    pub timestamp: u64,
    pub target: Target,
}

/// Search nonces from `start_nonce` for a block on `chain_index`.
///
/// Gives up after `max_attempts` nonces, or as soon as `cancel` is set.
#[tracing::instrument(skip(template, groups, cancel), fields(chain = %chain_index))]
pub fn mine_block(
    template: BlockTemplate,
    chain_index: ChainIndex,
    groups: &GroupConfig,
    start_nonce: U256,
    max_attempts: u64,
    cancel: Option<&AtomicBool>,
) -> Option<Block> {
    let txs_hash = Block::txs_root(&template.transactions);
    let mut header = BlockHeader::unsafe_new(
        template.block_deps,
        txs_hash,
        template.timestamp,
        template.target,
        start_nonce,
    );

    for attempt in 0..max_attempts {
        if attempt % 4096 == 0 && cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            trace!(attempt, "Nonce search cancelled");
            return None;
        }
        let hash = header.hash();
        if ChainIndex::from_hash(&hash, groups) == chain_index && check_work(&hash, &header.target)
        {
            debug!(attempt, hash = %hash_hex(&hash), "Found block");
            return Some(Block::new(header, template.transactions));
        }
        header.nonce = header.nonce.overflowing_add(U256::one()).0;
    }
    trace!(max_attempts, "Nonce search exhausted");
    None
}

/// Genesis block of `chain_index`. Genesis headers skip the work check; only
/// the chain index has to match.
pub fn mine_genesis(
    groups: &GroupConfig,
    chain_index: ChainIndex,
    transactions: Vec<Transaction>,
) -> Block {
    let txs_hash = Block::txs_root(&transactions);
    let mut header = BlockHeader::genesis(groups, txs_hash, Target::MAX, U256::zero());
    while header.chain_index(groups) != chain_index {
        header.nonce = header.nonce + 1;
    }
    Block::new(header, transactions)
}
