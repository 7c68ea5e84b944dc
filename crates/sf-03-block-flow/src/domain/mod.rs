//! Domain module for the multi-chain store.

pub mod entities;
pub mod errors;
pub mod genesis;
