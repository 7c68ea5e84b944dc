//! Header rules.

use super::BlockValidator;
use crate::domain::errors::InvalidBlockReason;
use sf_02_chain_model::{check_work, BlockHeader};
use sf_03_block_flow::{BlockFlow, FlowError};

impl BlockValidator {
    /// Target ceiling and proof of work. The only rules applied to headers of
    /// chains this broker does not serve.
    pub fn validate_work(&self, header: &BlockHeader) -> Result<(), InvalidBlockReason> {
        let max = self.consensus.max_mining_target;
        if header.target.value() > max.value() {
            return Err(InvalidBlockReason::TargetTooEasy {
                target: header.target,
                max,
            });
        }
        if !check_work(&header.hash(), &header.target) {
            return Err(InvalidBlockReason::InsufficientWork);
        }
        Ok(())
    }

    /// Check a header against the consensus rules and the known DAG.
    pub fn validate_header(
        &self,
        header: &BlockHeader,
        flow: &dyn BlockFlow,
        now_millis: u64,
    ) -> Result<(), InvalidBlockReason> {
        if header.is_genesis() {
            return Err(InvalidBlockReason::GenesisBlock);
        }

        let expected = self.groups.deps_num();
        if header.block_deps.len() != expected {
            return Err(InvalidBlockReason::InvalidDepsLength {
                expected,
                actual: header.block_deps.len(),
            });
        }

        self.validate_work(header)?;

        let limit = now_millis.saturating_add(self.consensus.max_future_drift_ms);
        if header.timestamp > limit {
            return Err(InvalidBlockReason::FutureTimestamp {
                timestamp: header.timestamp,
                now: now_millis,
            });
        }

        if let Some(dep) = header.block_deps.deps().iter().find(|dep| !flow.contains(dep)) {
            return Err(InvalidBlockReason::MissingDependency(*dep));
        }

        let chain_index = header.chain_index(&self.groups);
        for (dep, expected) in header.block_deps.expected_chains(chain_index) {
            let actual = flow.get_header(&dep)?.chain_index(&self.groups);
            if !expected.accepts(actual) {
                return Err(InvalidBlockReason::DependencyOnWrongChain { dep, actual });
            }
        }

        let parent = flow
            .get_header(&header.parent_hash(&self.groups))
            .map_err(|err| match err {
                FlowError::BlockNotFound(hash) => InvalidBlockReason::MissingDependency(hash),
                other => other.into(),
            })?;
        if header.timestamp <= parent.timestamp {
            return Err(InvalidBlockReason::NonIncreasingTimestamp {
                timestamp: header.timestamp,
                parent: parent.timestamp,
            });
        }

        Ok(())
    }
}
