//! # Node Configuration
//!
//! Unified configuration for the store, the chain processors, the miner and
//! the RPC gateway. Defaults describe a single-broker, three-group devnet;
//! `SF_*` environment variables override individual fields.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sf_02_chain_model::ConsensusConfig;
use sf_03_block_flow::GenesisAllocation;
use sf_05_api_gateway::GatewayConfig;
use shared_types::{Address, BrokerConfig, GroupConfig};
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Number of groups `G`.
    pub groups: usize,
    /// This node's slice of the clique.
    pub broker: BrokerSettings,
    /// Consensus thresholds.
    pub consensus: ConsensusConfig,
    /// Genesis and sync settings.
    pub network: NetworkConfig,
    /// Block production.
    pub mining: MiningConfig,
    /// JSON-RPC and WebSocket listeners.
    pub rpc: GatewayConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            groups: GroupConfig::default().groups(),
            broker: BrokerSettings::default(),
            consensus: ConsensusConfig::default(),
            network: NetworkConfig::default(),
            mining: MiningConfig::default(),
            rpc: GatewayConfig::default(),
        }
    }
}

/// Broker position inside the clique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerSettings {
    pub broker_id: usize,
    pub broker_num: usize,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            broker_id: 0,
            broker_num: 1,
        }
    }
}

/// Genesis allocations and the initial sync flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Coins credited on the intra-group genesis chains.
    pub genesis: Vec<GenesisAccount>,
    /// Whether the node considers itself synced at startup.
    pub synced_at_start: bool,
}

/// One genesis credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// Hex-encoded 32-byte address.
    pub address: String,
    pub amount: U256,
}

/// Block production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Start mining as soon as the node is up.
    pub autostart: bool,
    /// Hex-encoded address credited by coinbases. A fresh key is generated
    /// when unset.
    pub miner_address: Option<String>,
    /// Pause between two mining rounds in milliseconds.
    pub interval_ms: u64,
    /// Nonces tried per round before moving to the next chain.
    pub nonce_batch: u64,
    /// Largest number of pooled transactions put in one block.
    pub max_block_txs: usize,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            autostart: false,
            miner_address: None,
            interval_ms: 1_000,
            nonce_batch: 1_000_000,
            max_block_txs: 256,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum NodeConfigError {
    #[error(transparent)]
    Layout(#[from] shared_types::ConfigError),

    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid genesis address {0:?}")]
    InvalidGenesisAddress(String),

    #[error("Invalid miner address {0:?}")]
    InvalidMinerAddress(String),

    #[error("Invalid mining settings: {0}")]
    Mining(String),

    #[error("Invalid RPC settings: {0}")]
    Rpc(String),
}

impl NodeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, NodeConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Override fields from `SF_*` variables looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), NodeConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(groups) = parse_env(&lookup, "SF_GROUPS")? {
            self.groups = groups;
        }
        if let Some(id) = parse_env(&lookup, "SF_BROKER_ID")? {
            self.broker.broker_id = id;
        }
        if let Some(num) = parse_env(&lookup, "SF_BROKER_NUM")? {
            self.broker.broker_num = num;
        }
        if let Some(port) = parse_env(&lookup, "SF_RPC_PORT")? {
            self.rpc.http_port = port;
        }
        if let Some(port) = parse_env(&lookup, "SF_WS_PORT")? {
            self.rpc.ws_port = port;
        }
        if let Some(interval) = parse_env(&lookup, "SF_MINING_INTERVAL_MS")? {
            self.mining.interval_ms = interval;
        }
        if let Some(key) = lookup("SF_MINER_KEY") {
            self.mining.miner_address = Some(key);
        }
        Ok(())
    }

    pub fn group_config(&self) -> Result<GroupConfig, NodeConfigError> {
        Ok(GroupConfig::new(self.groups)?)
    }

    pub fn broker_config(&self) -> Result<BrokerConfig, NodeConfigError> {
        let groups = self.group_config()?;
        Ok(BrokerConfig::new(
            self.broker.broker_id,
            self.broker.broker_num,
            &groups,
        )?)
    }

    /// Decoded genesis credits.
    pub fn genesis_allocations(&self) -> Result<Vec<GenesisAllocation>, NodeConfigError> {
        self.network
            .genesis
            .iter()
            .map(|account| {
                let address = decode_address(&account.address).ok_or_else(|| {
                    NodeConfigError::InvalidGenesisAddress(account.address.clone())
                })?;
                Ok(GenesisAllocation {
                    address,
                    amount: account.amount,
                })
            })
            .collect()
    }

    /// Decoded coinbase address, if configured.
    pub fn miner_address(&self) -> Result<Option<Address>, NodeConfigError> {
        self.mining
            .miner_address
            .as_deref()
            .map(|hex| {
                decode_address(hex)
                    .ok_or_else(|| NodeConfigError::InvalidMinerAddress(hex.to_string()))
            })
            .transpose()
    }

    /// Check every field before anything is started.
    pub fn validate(&self) -> Result<(), NodeConfigError> {
        self.broker_config()?;
        self.genesis_allocations()?;
        self.miner_address()?;
        if self.mining.nonce_batch == 0 {
            return Err(NodeConfigError::Mining("nonce_batch must be positive".into()));
        }
        if self.mining.max_block_txs == 0 {
            return Err(NodeConfigError::Mining("max_block_txs must be positive".into()));
        }
        self.rpc.validate().map_err(NodeConfigError::Rpc)
    }
}

fn parse_env<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, NodeConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| NodeConfigError::InvalidEnv { var, value })
        })
        .transpose()
}

fn decode_address(value: &str) -> Option<Address> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(digits).ok()?;
    Address::try_from(bytes.as_slice()).ok()
}
