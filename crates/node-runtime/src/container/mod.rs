//! # Node Container
//!
//! Builds the shared components once, from a validated configuration, and
//! hands out the dependency bundles the services need.

pub mod config;

pub use config::{
    BrokerSettings, GenesisAccount, MiningConfig, NetworkConfig, NodeConfig, NodeConfigError,
};

use crate::adapters::TransactionPool;
use parking_lot::Mutex;
use sf_03_block_flow::InMemoryBlockFlow;
use sf_04_block_validation::{HandlerDependencies, SystemTimeSource, TimeSource};
use shared_bus::InMemoryEventBus;
use shared_types::{hash_hex, Address, BrokerConfig, GroupConfig};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, instrument};

/// Shared components of a running node.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub groups: GroupConfig,
    pub broker: BrokerConfig,
    pub flow: Arc<InMemoryBlockFlow>,
    pub bus: Arc<InMemoryEventBus>,
    pub pool: Arc<Mutex<TransactionPool>>,
    pub time_source: Arc<dyn TimeSource>,
    /// Node sync status read by every chain processor.
    pub synced: Arc<AtomicBool>,
    pub miner_address: Address,
}

impl NodeContainer {
    #[instrument(skip_all, fields(groups = config.groups))]
    pub fn new(config: NodeConfig) -> Result<Self, NodeConfigError> {
        config.validate()?;
        let groups = config.group_config()?;
        let broker = config.broker_config()?;
        let allocations = config.genesis_allocations()?;
        let flow = Arc::new(InMemoryBlockFlow::new(groups, &allocations));
        info!(
            chains = groups.chain_num(),
            allocations = allocations.len(),
            "Genesis installed"
        );

        let miner_address = match config.miner_address()? {
            Some(address) => address,
            None => {
                let key = shared_crypto::Ed25519KeyPair::generate();
                let address = sf_02_chain_model::address_of(key.public_key().as_bytes());
                info!(miner = %hash_hex(&address), "No miner address configured, generated one");
                address
            }
        };

        Ok(Self {
            groups,
            broker,
            flow,
            bus: Arc::new(InMemoryEventBus::new()),
            pool: Arc::new(Mutex::new(TransactionPool::default())),
            time_source: Arc::new(SystemTimeSource),
            synced: Arc::new(AtomicBool::new(config.network.synced_at_start)),
            miner_address,
            config,
        })
    }

    /// Replace the wall clock, for deterministic runs.
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn handler_dependencies(&self) -> HandlerDependencies {
        HandlerDependencies {
            flow: self.flow.clone(),
            publisher: self.bus.clone(),
            time_source: Arc::clone(&self.time_source),
            groups: self.groups,
            broker: self.broker,
            consensus: self.config.consensus.clone(),
            synced: Arc::clone(&self.synced),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;
    use sf_03_block_flow::BlockFlow;

    #[test]
    fn test_container_installs_genesis() {
        let mut config = NodeConfig {
            groups: 2,
            ..NodeConfig::default()
        };
        config.network.genesis.push(GenesisAccount {
            address: "01".repeat(32),
            amount: U256::from(50u64),
        });
        config.mining.miner_address = Some("02".repeat(32));

        let container = NodeContainer::new(config).unwrap();
        assert_eq!(container.groups.chain_num(), 4);
        assert_eq!(container.flow.get_balance(&[1; 32]), U256::from(50u64));
        assert_eq!(container.miner_address, [2; 32]);
        assert_eq!(container.handler_dependencies().broker.broker_num(), 1);
    }

    #[test]
    fn test_container_rejects_invalid_config() {
        let config = NodeConfig {
            groups: 300,
            ..NodeConfig::default()
        };
        assert!(NodeContainer::new(config).is_err());
    }
}
