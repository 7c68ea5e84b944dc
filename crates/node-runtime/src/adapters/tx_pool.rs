//! # Transaction Pool
//!
//! Signed transfers waiting for a block, bucketed by chain. Two pooled
//! transactions never spend the same output; the first one wins until it is
//! mined or evicted.

use sf_02_chain_model::{Transaction, TxOutputRef};
use shared_types::{hash_hex, ChainIndex, Hash};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Default number of pooled transactions.
pub const DEFAULT_POOL_CAPACITY: usize = 10_000;

/// Pool admission errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Transaction already pooled: {}", hex::encode(.0))]
    Duplicate(Hash),

    #[error("Output {}:{} is already spent by a pooled transaction", hex::encode(.0.tx_id), .0.index)]
    ConflictingInput(TxOutputRef),

    #[error("Coinbase transactions cannot be pooled")]
    Coinbase,

    #[error("Pool is full ({capacity} transactions)")]
    PoolFull { capacity: usize },
}

#[derive(Debug, Clone)]
struct PooledTransaction {
    tx: Transaction,
    chain_index: ChainIndex,
}

/// Pending transactions per chain, in arrival order.
#[derive(Debug)]
pub struct TransactionPool {
    capacity: usize,
    txs: HashMap<Hash, PooledTransaction>,
    by_chain: HashMap<ChainIndex, Vec<Hash>>,
    spent: HashMap<TxOutputRef, Hash>,
}

impl Default for TransactionPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl TransactionPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            txs: HashMap::new(),
            by_chain: HashMap::new(),
            spent: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.txs.contains_key(id)
    }

    /// Pending count of one chain.
    pub fn chain_len(&self, chain_index: ChainIndex) -> usize {
        self.by_chain.get(&chain_index).map_or(0, Vec::len)
    }

    /// Queue `tx` for `chain_index`.
    pub fn add(&mut self, chain_index: ChainIndex, tx: Transaction) -> Result<Hash, PoolError> {
        if tx.is_coinbase() {
            return Err(PoolError::Coinbase);
        }
        let id = tx.id();
        if self.txs.contains_key(&id) {
            return Err(PoolError::Duplicate(id));
        }
        if self.txs.len() >= self.capacity {
            return Err(PoolError::PoolFull {
                capacity: self.capacity,
            });
        }
        if let Some(input) = tx
            .unsigned
            .inputs
            .iter()
            .find(|input| self.spent.contains_key(&input.output_ref))
        {
            return Err(PoolError::ConflictingInput(input.output_ref));
        }

        for input in &tx.unsigned.inputs {
            self.spent.insert(input.output_ref, id);
        }
        self.by_chain.entry(chain_index).or_default().push(id);
        self.txs.insert(id, PooledTransaction { tx, chain_index });
        debug!(tx = %hash_hex(&id), chain = %chain_index, "Transaction pooled");
        Ok(id)
    }

    /// Up to `max` pending transactions of a chain, oldest first.
    pub fn get_for_block(&self, chain_index: ChainIndex, max: usize) -> Vec<Transaction> {
        self.by_chain
            .get(&chain_index)
            .into_iter()
            .flatten()
            .filter_map(|id| self.txs.get(id))
            .take(max)
            .map(|pooled| pooled.tx.clone())
            .collect()
    }

    pub fn remove(&mut self, id: &Hash) -> Option<Transaction> {
        let pooled = self.txs.remove(id)?;
        for input in &pooled.tx.unsigned.inputs {
            self.spent.remove(&input.output_ref);
        }
        if let Some(ids) = self.by_chain.get_mut(&pooled.chain_index) {
            ids.retain(|other| other != id);
            if ids.is_empty() {
                self.by_chain.remove(&pooled.chain_index);
            }
        }
        Some(pooled.tx)
    }

    /// Drop the block's transactions and everything that conflicts with
    /// them. Returns how many pooled entries were removed.
    pub fn remove_included(&mut self, transactions: &[Transaction]) -> usize {
        let mut removed = 0;
        for tx in transactions {
            if self.remove(&tx.id()).is_some() {
                removed += 1;
            }
            for input in &tx.unsigned.inputs {
                if let Some(conflict) = self.spent.get(&input.output_ref).copied() {
                    if self.remove(&conflict).is_some() {
                        removed += 1;
                    }
                }
            }
        }
        removed
    }
}
