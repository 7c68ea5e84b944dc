//! # Node Runtime Library
//!
//! The pieces of the Shard-Flow node binary, exposed for integration tests.
//!
//! ```text
//!   NodeConfig ─► NodeContainer ─┬─► AllHandlers (one task per chain)
//!                                ├─► Miner ───────► AllHandlers::validate
//!                                └─► NodeRpc ◄──── ApiGatewayService
//! ```
//!
//! - `container/` - configuration and the shared components
//! - `adapters/` - `RpcServer` implementation and the transaction pool
//! - `miner` - round-robin block production
//! - `runtime` - startup and graceful shutdown

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod container;
pub mod miner;
pub mod runtime;

pub use adapters::{NodeRpc, PoolError, TransactionPool};
pub use container::{GenesisAccount, NodeConfig, NodeConfigError, NodeContainer};
pub use miner::{Miner, MinerDependencies, MiningError};
pub use runtime::NodeRuntime;
