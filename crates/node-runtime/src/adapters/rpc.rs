//! # RPC Adapter
//!
//! Implements the gateway's `RpcServer` port on top of the store, the
//! transaction pool and the miner.

use crate::adapters::tx_pool::TransactionPool;
use crate::miner::Miner;
use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use sf_02_chain_model::BlockHeader;
use sf_03_block_flow::{BlockFlow, FlowError};
use sf_05_api_gateway::{
    ApiError, Balance, BlockHeaderEntry, ChainInfo, CliqueInfo, FetchResponse, RpcServer,
    TransferResult,
};
use shared_crypto::Ed25519KeyPair;
use shared_types::{hash_hex, Address, BrokerConfig, GroupConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// The node as seen by RPC clients.
pub struct NodeRpc {
    flow: Arc<dyn BlockFlow>,
    pool: Arc<Mutex<TransactionPool>>,
    miner: Miner,
    groups: GroupConfig,
    broker: BrokerConfig,
    synced: Arc<AtomicBool>,
}

impl NodeRpc {
    pub fn new(
        flow: Arc<dyn BlockFlow>,
        pool: Arc<Mutex<TransactionPool>>,
        miner: Miner,
        groups: GroupConfig,
        broker: BrokerConfig,
        synced: Arc<AtomicBool>,
    ) -> Self {
        Self {
            flow,
            pool,
            miner,
            groups,
            broker,
            synced,
        }
    }

    fn header_entry(&self, header: &BlockHeader) -> Result<BlockHeaderEntry, ApiError> {
        let chain_index = header.chain_index(&self.groups);
        Ok(BlockHeaderEntry {
            hash: hash_hex(&header.hash()),
            timestamp: header.timestamp,
            chain_from: chain_index.from.0,
            chain_to: chain_index.to.0,
            height: self.flow.get_height(header).map_err(flow_error)?,
            deps: header.block_deps.deps().iter().map(hash_hex).collect(),
        })
    }
}

fn flow_error(err: FlowError) -> ApiError {
    match err {
        FlowError::BlockNotFound(_) | FlowError::BodyNotStored(_) | FlowError::UnknownChain(_) => {
            ApiError::resource_not_found(err.to_string())
        }
        FlowError::InvalidAmount => ApiError::invalid_params(err.to_string()),
        _ => ApiError::internal(err.to_string()),
    }
}

#[async_trait]
impl RpcServer for NodeRpc {
    async fn fetch_blocks(&self, from_ts: u64, to_ts: u64) -> Result<FetchResponse, ApiError> {
        let mut headers = self
            .flow
            .get_headers_unsafe(&|header| header.timestamp >= from_ts && header.timestamp <= to_ts);
        headers.sort_by_key(|header| (header.timestamp, header.hash()));
        let headers = headers
            .iter()
            .map(|header| self.header_entry(header))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FetchResponse { headers })
    }

    async fn clique_info(&self) -> Result<CliqueInfo, ApiError> {
        let chains = self
            .groups
            .chain_indexes()
            .into_iter()
            .map(|chain_index| {
                let tip = self.flow.get_tip(chain_index).map_err(flow_error)?;
                let header = self.flow.get_header(&tip).map_err(flow_error)?;
                Ok(ChainInfo {
                    chain_from: chain_index.from.0,
                    chain_to: chain_index.to.0,
                    height: self.flow.get_height(&header).map_err(flow_error)?,
                    tip: hash_hex(&tip),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(CliqueInfo {
            groups: self.groups.groups(),
            broker_id: self.broker.broker_id(),
            broker_num: self.broker.broker_num(),
            group_from: self.broker.group_from(),
            group_until: self.broker.group_until(),
            synced: self.synced.load(Ordering::Acquire),
            mining: self.miner.is_active(),
            chains,
        })
    }

    async fn get_balance(&self, address: Address) -> Result<Balance, ApiError> {
        let utxos = self.flow.get_utxos(&address);
        let balance = utxos
            .iter()
            .fold(U256::zero(), |acc, (_, output)| acc.saturating_add(output.amount));
        Ok(Balance {
            address: hash_hex(&address),
            balance,
            utxo_count: utxos.len(),
        })
    }

    async fn transfer(
        &self,
        from_private_key: [u8; 32],
        to: Address,
        value: U256,
    ) -> Result<TransferResult, ApiError> {
        let key = Ed25519KeyPair::from_seed(from_private_key);
        let tx = self
            .flow
            .prepare_transaction(&key, to, value)
            .map_err(flow_error)?
            .ok_or_else(|| ApiError::transaction_rejected("Insufficient balance"))?;
        let chain_index = tx
            .chain_index(&self.groups)
            .ok_or_else(|| ApiError::internal("Prepared transaction has no inputs"))?;
        if !self.broker.serves(chain_index) {
            return Err(ApiError::transaction_rejected(format!(
                "Chain {} is not served by this broker",
                chain_index
            )));
        }

        let tx_id = self
            .pool
            .lock()
            .add(chain_index, tx)
            .map_err(|e| ApiError::transaction_rejected(e.to_string()))?;
        info!(tx = %hash_hex(&tx_id), chain = %chain_index, %value, "Transfer queued");
        Ok(TransferResult {
            tx_id: hash_hex(&tx_id),
            from_group: chain_index.from.0,
            to_group: chain_index.to.0,
        })
    }

    async fn start_mining(&self) -> Result<bool, ApiError> {
        Ok(self.miner.start().await)
    }

    async fn stop_mining(&self) -> Result<bool, ApiError> {
        Ok(self.miner.stop().await)
    }
}
