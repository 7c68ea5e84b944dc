//! # Merkle Root
//!
//! Binary BLAKE3 tree over leaf hashes. An odd level duplicates its last
//! node; an empty list commits to the zero hash.

use crate::hashing::{blake3_hash_many, Hash};

/// Root of the binary Merkle tree over `leaves`.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return [0u8; 32];
    }
    let mut level: Vec<Hash> = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                blake3_hash_many(&[&pair[0], right])
            })
            .collect();
    }
    level[0]
}
