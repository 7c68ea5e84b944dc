//! # Shared Types Crate
//!
//! Primitives every Shard-Flow crate agrees on.
//!
//! ## Contents
//!
//! - **entities**: hashes, addresses, group indexes, peer identities, block origins
//! - **chain_index**: the `(from, to)` shard coordinate and its derivation from a hash
//! - **config**: explicit group/broker contexts passed to every group-aware function
//! - **codec**: the bit-exact big-endian wire codec (`Encode`/`Decode`)
//! - **errors**: configuration and format errors
//!
//! ## Design Principles
//!
//! - **No ambient configuration**: nothing here reads global state. Functions that
//!   depend on the group count take a `&GroupConfig`.
//! - **Wire stability**: the codec layout is an interchange format. Changing an
//!   encoding is a protocol change.

pub mod chain_index;
pub mod codec;
pub mod config;
pub mod entities;
pub mod errors;

pub use chain_index::ChainIndex;
pub use codec::{Decode, Encode, Reader};
pub use config::{BrokerConfig, GroupConfig};
pub use entities::*;
pub use errors::{ConfigError, FormatError};
