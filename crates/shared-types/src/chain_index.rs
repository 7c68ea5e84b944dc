//! # Chain Index
//!
//! The `(from, to)` coordinate of a chain in the `G×G` matrix, and its
//! derivation from a block hash.
//!
//! The derivation is consensus-critical: every implementation must agree on
//! the chain any hash belongs to, or the network forks.
//!
//! ```text
//! big  = (hash[30] << 8) | hash[31]
//! idx  = big mod G²
//! from = idx / G
//! to   = idx mod G
//! ```

use crate::config::GroupConfig;
use crate::entities::{GroupIndex, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain coordinate `(from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainIndex {
    /// Group whose state the chain's transactions spend from.
    pub from: GroupIndex,
    /// Group the chain's transactions pay into.
    pub to: GroupIndex,
}

impl ChainIndex {
    /// Build from raw group numbers. Callers guarantee both are `< G`.
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from: GroupIndex(from),
            to: GroupIndex(to),
        }
    }

    /// Derive the chain a hash belongs to. Total: every hash has one.
    pub fn from_hash(hash: &Hash, groups: &GroupConfig) -> Self {
        let big = ((hash[30] as usize) << 8) | hash[31] as usize;
        let idx = big % groups.chain_num();
        Self::new(idx / groups.groups(), idx % groups.groups())
    }

    /// Row-major position of this chain, `from * G + to`.
    pub fn flatten(&self, groups: &GroupConfig) -> usize {
        self.from.0 * groups.groups() + self.to.0
    }

    /// True for chains inside a single group (`from == to`).
    pub fn is_intra_group(&self) -> bool {
        self.from == self.to
    }

    /// True when both coordinates are `< G`.
    pub fn is_valid(&self, groups: &GroupConfig) -> bool {
        self.from.0 < groups.groups() && self.to.0 < groups.groups()
    }
}

impl fmt::Display for ChainIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from.0, self.to.0)
    }
}
