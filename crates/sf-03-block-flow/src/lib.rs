//! # SF-03: Block Flow
//!
//! The multi-chain store shared by every chain processor, the miner and the
//! RPC layer.
//!
//! ## Architecture
//!
//! - **Domain**: stored entries, genesis allocation, `FlowError`
//! - **Ports**: `BlockFlow`, the query/update contract
//! - **Adapters**: `InMemoryBlockFlow`, guarded by a single `RwLock` so each
//!   write is observed atomically by readers
//!
//! Every chain owns its tip. Blocks are accepted only once all of their
//! dependencies are present, so the stored DAG is always closed under deps.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::memory::InMemoryBlockFlow;
pub use domain::entities::{BlockEntry, GenesisAllocation};
pub use domain::errors::FlowError;
pub use ports::inbound::BlockFlow;
