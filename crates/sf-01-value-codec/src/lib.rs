//! # SF-01: Value Codec
//!
//! Script-level values exchanged with the VM: `Bool`, `I256`, `U256`,
//! `ByteVec` and `Address`. Each value serializes as one tag byte from a
//! fixed table followed by its payload.
//!
//! ## Architecture
//!
//! - **Domain**: `Val`, `ValType`, the `I256` two's-complement integer
//! - **Codec**: `Encode`/`Decode` impls from `shared-types`

pub mod domain;

pub use domain::i256::I256;
pub use domain::val::{Val, ValType};
