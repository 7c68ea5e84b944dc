//! Block Validation - Pure Rules
//!
//! Header and body rules, checked in a fixed order so the first failing rule
//! decides the reported reason. The only state consulted is the store passed
//! in; nothing is written.

mod body;
mod header;

use crate::domain::errors::InvalidBlockReason;
use sf_02_chain_model::{Block, ConsensusConfig};
use sf_03_block_flow::BlockFlow;
use shared_types::GroupConfig;

/// Block validator for one group configuration.
#[derive(Debug, Clone)]
pub struct BlockValidator {
    groups: GroupConfig,
    consensus: ConsensusConfig,
}

impl BlockValidator {
    pub fn new(groups: GroupConfig, consensus: ConsensusConfig) -> Self {
        Self { groups, consensus }
    }

    pub fn groups(&self) -> &GroupConfig {
        &self.groups
    }

    pub fn consensus(&self) -> &ConsensusConfig {
        &self.consensus
    }

    /// Header rules, then body rules.
    pub fn validate(
        &self,
        block: &Block,
        flow: &dyn BlockFlow,
        now_millis: u64,
    ) -> Result<(), InvalidBlockReason> {
        self.validate_header(&block.header, flow, now_millis)?;
        self.validate_body(block, flow)
    }
}
