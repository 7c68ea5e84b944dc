//! # Group and Broker Contexts
//!
//! Explicit configuration objects. Every function that depends on the group
//! count or on the broker layout takes one of these as an argument, so the
//! same logic runs against several configurations in one process.

use crate::chain_index::ChainIndex;
use crate::entities::GroupIndex;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Largest supported group count. `G²` must fit the 16-bit hash suffix.
pub const MAX_GROUPS: usize = 256;

/// Number of groups `G`; the ledger is a `G×G` matrix of chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    groups: usize,
}

impl GroupConfig {
    /// Create a group context. Fails for `G == 0` or `G > 256`.
    pub fn new(groups: usize) -> Result<Self, ConfigError> {
        if groups == 0 || groups > MAX_GROUPS {
            return Err(ConfigError::InvalidGroups(groups));
        }
        Ok(Self { groups })
    }

    /// `G`.
    pub fn groups(&self) -> usize {
        self.groups
    }

    /// `G²`, the number of chains.
    pub fn chain_num(&self) -> usize {
        self.groups * self.groups
    }

    /// `2G - 1`, the length of every block's dependency vector.
    pub fn deps_num(&self) -> usize {
        2 * self.groups - 1
    }

    /// Every group index in ascending order.
    pub fn group_indexes(&self) -> impl Iterator<Item = GroupIndex> {
        (0..self.groups).map(GroupIndex)
    }

    /// Every chain index in row-major order.
    pub fn chain_indexes(&self) -> Vec<ChainIndex> {
        let groups = self.groups;
        (0..groups)
            .flat_map(|from| (0..groups).map(move |to| ChainIndex::new(from, to)))
            .collect()
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self { groups: 3 }
    }
}

/// Which contiguous slice of groups this node's broker serves.
///
/// A clique of `broker_num` brokers splits the `G` groups evenly; broker `i`
/// serves groups `[i * G / broker_num, (i + 1) * G / broker_num)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    broker_id: usize,
    broker_num: usize,
    groups_per_broker: usize,
}

impl BrokerConfig {
    /// Create a broker context. `broker_num` must divide `G`.
    pub fn new(
        broker_id: usize,
        broker_num: usize,
        groups: &GroupConfig,
    ) -> Result<Self, ConfigError> {
        if broker_num == 0 || groups.groups() % broker_num != 0 {
            return Err(ConfigError::InvalidBroker(format!(
                "broker_num {} does not divide {} groups",
                broker_num,
                groups.groups()
            )));
        }
        if broker_id >= broker_num {
            return Err(ConfigError::InvalidBroker(format!(
                "broker_id {} out of range for broker_num {}",
                broker_id, broker_num
            )));
        }
        Ok(Self {
            broker_id,
            broker_num,
            groups_per_broker: groups.groups() / broker_num,
        })
    }

    /// A single broker serving every group.
    pub fn single(groups: &GroupConfig) -> Self {
        Self {
            broker_id: 0,
            broker_num: 1,
            groups_per_broker: groups.groups(),
        }
    }

    /// This broker's id within its clique.
    pub fn broker_id(&self) -> usize {
        self.broker_id
    }

    /// Number of brokers in the clique.
    pub fn broker_num(&self) -> usize {
        self.broker_num
    }

    /// First served group (inclusive).
    pub fn group_from(&self) -> usize {
        self.broker_id * self.groups_per_broker
    }

    /// Last served group (exclusive).
    pub fn group_until(&self) -> usize {
        (self.broker_id + 1) * self.groups_per_broker
    }

    /// True when `group` is served by this broker.
    pub fn contains(&self, group: GroupIndex) -> bool {
        group.0 >= self.group_from() && group.0 < self.group_until()
    }

    /// True when the chain's `from` group is served by this broker.
    pub fn serves(&self, chain_index: ChainIndex) -> bool {
        self.contains(chain_index.from)
    }

    /// Chains whose blocks this broker validates in full.
    pub fn chain_indexes(&self, groups: &GroupConfig) -> Vec<ChainIndex> {
        groups
            .chain_indexes()
            .into_iter()
            .filter(|ci| self.serves(*ci))
            .collect()
    }
}
