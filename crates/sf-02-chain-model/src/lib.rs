//! # SF-02: Chain Model
//!
//! The multi-chain block DAG data model.
//!
//! ## Architecture
//!
//! - **Domain**: `BlockDeps`, `BlockHeader`, `Block`, `Transaction`, `Target`
//! - **Algorithms**: non-coinbase execution order, proof-of-work check and
//!   nonce search
//! - **Config**: `ConsensusConfig`, passed explicitly to every rule that
//!   needs a threshold
//!
//! Every structure has a bit-exact wire form through the `shared-types`
//! codec; a block's identity is the double BLAKE3 hash of its header bytes.

pub mod algorithms;
pub mod config;
pub mod domain;

pub use algorithms::execution_order::{non_coinbase_execution_order, ordered_non_coinbase};
pub use algorithms::pow::{check_work, mine_block, mine_genesis, BlockTemplate};
pub use config::ConsensusConfig;
pub use domain::block::Block;
pub use domain::block_deps::BlockDeps;
pub use domain::header::{BlockHeader, GENESIS_TIMESTAMP};
pub use domain::target::Target;
pub use domain::transaction::{
    address_of, group_of, Script, Transaction, TxInput, TxOutput, TxOutputRef,
    UnsignedTransaction,
};
