//! # Shared Crypto
//!
//! Cryptographic primitives used by the chain model and the validators.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | BLAKE3 | Block hashes, tx ids, ordering keys, addresses |
//! | `merkle` | BLAKE3 pairwise | Transaction commitments in headers |
//! | `signatures` | Ed25519 | Transaction authorization |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod merkle;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{blake3_hash, blake3_hash_many, double_hash, Blake3Hasher, Hash};
pub use merkle::merkle_root;
pub use signatures::{verify_raw, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
