//! # SF-04: Block Validation
//!
//! Per-chain validation and broadcast gating.
//!
//! ## Architecture
//!
//! - **Domain**: rejection reasons, replies, outcomes and the broadcast plan
//! - **Validation**: `BlockValidator`, the ordered header and body rules
//! - **Ports**: `TimeSource` for the future-timestamp rule
//! - **Service**: `ChainHandler` (one chain) and `AllHandlers` (one tokio
//!   task per chain)
//!
//! ## Message flow
//!
//! ```text
//! Validate{block, origin} ──→ ChainHandler
//!     ├─ wrong chain            → InvalidBlock
//!     ├─ other broker's chain   → store header, BlockAdded
//!     ├─ already stored         → BlockAdded
//!     ├─ header/body rule fails → InvalidBlock
//!     └─ valid                  → persist, BlockAdded, then broadcasts
//! ```
//!
//! Broadcasts are bus events (`BroadcastIntraClique`, `BroadcastInterClique`);
//! the transport that carries them to peers listens on the bus.

pub mod domain;
pub mod ports;
pub mod service;
pub mod validation;

#[cfg(test)]
mod testing;

pub use domain::{
    BlockReply, BroadcastPlan, ChainMessage, HandlerError, InvalidBlockReason, ValidateBlock,
    ValidationOutcome,
};
pub use ports::{FixedTimeSource, SystemTimeSource, TimeSource};
pub use service::{AllHandlers, ChainHandler, HandlerDependencies, DEFAULT_INBOX_CAPACITY};
pub use validation::BlockValidator;
