//! Store implementations.

pub mod memory;
