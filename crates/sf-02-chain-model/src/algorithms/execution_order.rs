//! # Execution Order
//!
//! Canonical order in which the VM runs a block's non-coinbase transactions.
//!
//! 1. Scripted transactions first, then the rest.
//! 2. Inside each partition, ascending `blake3(seed ++ tx.id)`.
//! 3. Remaining ties by body position.
//!
//! `seed` is the parent hash, or 32 zero bytes for genesis blocks. The body
//! position never decides the order unless two transactions share an id, so
//! every node derives the same order whatever order it received them in.

use crate::domain::block::Block;
use crate::domain::transaction::Transaction;
use shared_crypto::blake3_hash_many;
use shared_types::{GroupConfig, Hash, ZERO_HASH};

/// Permutation of `0..n`, `n = transactions.len() - 1`, in execution order.
pub fn non_coinbase_execution_order(block: &Block, groups: &GroupConfig) -> Vec<usize> {
    let seed: Hash = if block.is_genesis() {
        ZERO_HASH
    } else {
        block.parent_hash(groups)
    };

    let mut keyed: Vec<(bool, Hash, usize)> = block
        .non_coinbase()
        .iter()
        .enumerate()
        .map(|(index, tx)| {
            let key = blake3_hash_many(&[&seed, &tx.id()]);
            (!tx.has_script(), key, index)
        })
        .collect();
    keyed.sort_unstable();
    keyed.into_iter().map(|(_, _, index)| index).collect()
}

/// Non-coinbase transactions in execution order.
pub fn ordered_non_coinbase<'a>(block: &'a Block, groups: &GroupConfig) -> Vec<&'a Transaction> {
    let txs = block.non_coinbase();
    non_coinbase_execution_order(block, groups)
        .into_iter()
        .map(|index| &txs[index])
        .collect()
}
