//! Consensus thresholds, passed explicitly to validation and mining.

use crate::domain::target::Target;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Consensus configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Easiest target a block may declare.
    pub max_mining_target: Target,
    /// Exact amount every coinbase pays.
    pub mining_reward: U256,
    /// How far past local time a block timestamp may be (ms).
    pub max_future_drift_ms: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_mining_target: Target::MAX,
            mining_reward: U256::from(1_000_000_000_000_000_000u64),
            max_future_drift_ms: 15_000,
        }
    }
}
