//! # Inbound Port
//!
//! What chain processors, the miner and the RPC layer may ask of the store.
//!
//! Calls are synchronous. A chain processor treats each one as blocking and
//! finishes it before taking its next message.

use crate::domain::errors::FlowError;
use primitive_types::U256;
use sf_02_chain_model::{Block, BlockDeps, BlockHeader, Transaction, TxOutput, TxOutputRef};
use shared_crypto::Ed25519KeyPair;
use shared_types::{Address, ChainIndex, GroupConfig, GroupIndex, Hash};

/// Multi-chain store contract.
pub trait BlockFlow: Send + Sync {
    /// Group context the store was built for.
    fn group_config(&self) -> GroupConfig;

    /// True when the header is known (with or without body).
    fn contains(&self, hash: &Hash) -> bool;

    /// Header by hash.
    fn get_header(&self, hash: &Hash) -> Result<BlockHeader, FlowError>;

    /// Full block by hash.
    fn get_block(&self, hash: &Hash) -> Result<Block, FlowError>;

    /// Height of a known header.
    fn get_height(&self, header: &BlockHeader) -> Result<u64, FlowError>;

    /// Every known header matching `predicate`. Unordered.
    fn get_headers_unsafe(&self, predicate: &dyn Fn(&BlockHeader) -> bool) -> Vec<BlockHeader>;

    /// Current tip of a chain.
    fn get_tip(&self, chain_index: ChainIndex) -> Result<Hash, FlowError>;

    /// Deps a new block on a chain starting at `from` should commit to.
    fn best_deps(&self, from: GroupIndex) -> Result<BlockDeps, FlowError>;

    /// Store a validated block and apply it to the UTXO set.
    fn add_block(&self, block: Block) -> Result<(), FlowError>;

    /// Store a header whose body another broker holds.
    fn add_header(&self, header: BlockHeader) -> Result<(), FlowError>;

    /// An unspent output.
    fn get_output(&self, output_ref: &TxOutputRef) -> Option<TxOutput>;

    /// Unspent outputs locked to `address`.
    fn get_utxos(&self, address: &Address) -> Vec<(TxOutputRef, TxOutput)>;

    /// Sum of `address`'s unspent outputs.
    fn get_balance(&self, address: &Address) -> U256 {
        self.get_utxos(address)
            .iter()
            .fold(U256::zero(), |acc, (_, output)| acc.saturating_add(output.amount))
    }

    /// Build and sign a transfer of `value` from `from_key`'s address to `to`.
    ///
    /// `Ok(None)` when the balance does not cover `value`.
    fn prepare_transaction(
        &self,
        from_key: &Ed25519KeyPair,
        to: Address,
        value: U256,
    ) -> Result<Option<Transaction>, FlowError>;
}
