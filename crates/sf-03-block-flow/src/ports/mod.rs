//! Ports for the multi-chain store.

pub mod inbound;
