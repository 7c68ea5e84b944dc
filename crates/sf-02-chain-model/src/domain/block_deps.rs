//! # Block Dependencies
//!
//! The `2G - 1` tip hashes a block commits to.
//!
//! ## Layout
//!
//! For a block in chain `(from, to)`:
//!
//! ```text
//! position:  0 ........ G-2 | G-1 ................ 2G-2
//! content:   in-deps        | out-deps
//!            one per group  | tip of chain (from, t)
//!            g != from      | for t = 0..G
//! ```
//!
//! In-dep for group `g` sits at `g` when `g < from`, else at `g - 1`.
//! Out-dep `t` sits at `G - 1 + t`. The parent is `out[to]`, the intra-group
//! dependency is `out[from]`.
//!
//! The layout is wire format. Changing a slot forks the network.

use shared_types::{ChainIndex, ConfigError, GroupConfig, GroupIndex, Hash, ZERO_HASH};

/// Ordered dependency hashes of a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockDeps {
    deps: Vec<Hash>,
}

impl BlockDeps {
    /// Validate the length against `G` and wrap.
    pub fn build(deps: Vec<Hash>, groups: &GroupConfig) -> Result<Self, ConfigError> {
        if deps.len() != groups.deps_num() {
            return Err(ConfigError::ConfigMismatch {
                expected: groups.deps_num(),
                actual: deps.len(),
            });
        }
        Ok(Self { deps })
    }

    /// All-zero deps carried by genesis headers.
    pub fn genesis(groups: &GroupConfig) -> Self {
        Self {
            deps: vec![ZERO_HASH; groups.deps_num()],
        }
    }

    /// Wrap decoded deps without a length check. Header validation rejects
    /// lengths that do not match the node's group count.
    pub(crate) fn from_wire(deps: Vec<Hash>) -> Self {
        Self { deps }
    }

    /// Every dep in layout order.
    pub fn deps(&self) -> &[Hash] {
        &self.deps
    }

    /// Number of deps.
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    /// True when there are no deps at all (never the case for a built value).
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Group count implied by the length.
    pub fn groups(&self) -> usize {
        (self.deps.len() + 1) / 2
    }

    /// Tips of the other groups, `G - 1` hashes.
    pub fn in_deps(&self) -> &[Hash] {
        &self.deps[..self.groups() - 1]
    }

    /// Tips of chains `(from, t)` for every `t`, `G` hashes.
    pub fn out_deps(&self) -> &[Hash] {
        &self.deps[self.groups() - 1..]
    }

    /// Position of the in-dep for `group` in a block whose chain starts at `from`.
    pub fn in_dep_position(group: GroupIndex, from: GroupIndex) -> usize {
        assert!(group != from, "a block has no in-dep for its own group");
        if group.0 < from.0 {
            group.0
        } else {
            group.0 - 1
        }
    }

    /// In-dep for `group`, in a block whose chain starts at `from`.
    pub fn in_dep(&self, group: GroupIndex, from: GroupIndex) -> Hash {
        self.in_deps()[Self::in_dep_position(group, from)]
    }

    /// Tip of chain `(from, to)` as seen by this block.
    pub fn uncle_hash(&self, to: GroupIndex) -> Hash {
        self.out_deps()[to.0]
    }

    /// The previous block on the block's own chain.
    pub fn parent_hash(&self, chain_index: ChainIndex) -> Hash {
        self.uncle_hash(chain_index.to)
    }

    /// Tip of the intra-group chain `(from, from)`.
    pub fn intra_dep(&self, chain_index: ChainIndex) -> Hash {
        self.uncle_hash(chain_index.from)
    }

    /// Every dep paired with the chain it must belong to.
    ///
    /// In-deps only pin the `from` group, so their `to` is reported as the
    /// block's own `from`.
    pub fn expected_chains(&self, chain_index: ChainIndex) -> Vec<(Hash, ExpectedChain)> {
        let groups = self.groups();
        let mut out = Vec::with_capacity(self.deps.len());
        for g in (0..groups).filter(|g| *g != chain_index.from.0) {
            let hash = self.in_dep(GroupIndex(g), chain_index.from);
            out.push((hash, ExpectedChain::FromGroup(GroupIndex(g))));
        }
        for (t, hash) in self.out_deps().iter().enumerate() {
            out.push((*hash, ExpectedChain::Exact(ChainIndex::new(chain_index.from.0, t))));
        }
        out
    }
}

/// Where a dep is required to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedChain {
    /// Any chain whose `from` group is this one.
    FromGroup(GroupIndex),
    /// Exactly this chain.
    Exact(ChainIndex),
}

impl ExpectedChain {
    /// True when a dep found in `actual` satisfies the requirement.
    pub fn accepts(&self, actual: ChainIndex) -> bool {
        match self {
            Self::FromGroup(group) => actual.from == *group,
            Self::Exact(expected) => actual == *expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbered(n: usize) -> Vec<Hash> {
        (0..n).map(|i| [i as u8; 32]).collect()
    }

    #[test]
    fn test_build_checks_length() {
        let groups = GroupConfig::new(3).unwrap();
        assert!(BlockDeps::build(numbered(5), &groups).is_ok());
        assert_eq!(
            BlockDeps::build(numbered(4), &groups).unwrap_err(),
            ConfigError::ConfigMismatch {
                expected: 5,
                actual: 4
            }
        );
    }

    #[test]
    fn test_layout_for_three_groups() {
        let groups = GroupConfig::new(3).unwrap();
        let deps = BlockDeps::build(numbered(5), &groups).unwrap();
        let ci = ChainIndex::new(1, 2);

        assert_eq!(deps.in_deps(), &numbered(5)[..2]);
        assert_eq!(deps.out_deps(), &numbered(5)[2..]);
        // group 0 < from 1 -> slot 0; group 2 > from 1 -> slot 1
        assert_eq!(deps.in_dep(GroupIndex(0), ci.from), [0u8; 32]);
        assert_eq!(deps.in_dep(GroupIndex(2), ci.from), [1u8; 32]);
        assert_eq!(deps.parent_hash(ci), [4u8; 32]);
        assert_eq!(deps.intra_dep(ci), [3u8; 32]);
        assert_eq!(deps.uncle_hash(GroupIndex(0)), [2u8; 32]);
    }

    #[test]
    fn test_single_group_has_only_parent() {
        let groups = GroupConfig::new(1).unwrap();
        let deps = BlockDeps::build(numbered(1), &groups).unwrap();
        assert!(deps.in_deps().is_empty());
        assert_eq!(deps.parent_hash(ChainIndex::new(0, 0)), [0u8; 32]);
    }

    #[test]
    #[should_panic]
    fn test_own_group_in_dep_is_a_contract_violation() {
        BlockDeps::in_dep_position(GroupIndex(1), GroupIndex(1));
    }

    #[test]
    fn test_expected_chains() {
        let groups = GroupConfig::new(2).unwrap();
        let deps = BlockDeps::build(numbered(3), &groups).unwrap();
        let expected = deps.expected_chains(ChainIndex::new(1, 0));
        assert_eq!(expected.len(), 3);
        assert!(expected[0].1.accepts(ChainIndex::new(0, 1)));
        assert!(!expected[0].1.accepts(ChainIndex::new(1, 1)));
        assert!(expected[1].1.accepts(ChainIndex::new(1, 0)));
        assert!(expected[2].1.accepts(ChainIndex::new(1, 1)));
    }

    proptest! {
        #[test]
        fn prop_slots_are_a_partition(g in 1usize..=8, from in 0usize..8, to in 0usize..8) {
            prop_assume!(from < g && to < g);
            let groups = GroupConfig::new(g).unwrap();
            let deps = BlockDeps::build(numbered(2 * g - 1), &groups).unwrap();
            let ci = ChainIndex::new(from, to);

            let mut seen: Vec<Hash> = (0..g)
                .filter(|x| *x != from)
                .map(|x| deps.in_dep(GroupIndex(x), ci.from))
                .collect();
            seen.extend((0..g).map(|t| deps.uncle_hash(GroupIndex(t))));
            prop_assert_eq!(seen, numbered(2 * g - 1));
            prop_assert_eq!(deps.parent_hash(ci), numbered(2 * g - 1)[g - 1 + to]);
            prop_assert_eq!(deps.intra_dep(ci), numbered(2 * g - 1)[g - 1 + from]);
        }
    }
}
