//! Domain module for the chain model.

pub mod block;
pub mod block_deps;
pub mod header;
pub mod target;
pub mod transaction;
