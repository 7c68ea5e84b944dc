//! # Adapters
//!
//! Node-side implementations of the ports other crates define.

pub mod rpc;
pub mod tx_pool;

pub use rpc::NodeRpc;
pub use tx_pool::{PoolError, TransactionPool, DEFAULT_POOL_CAPACITY};
