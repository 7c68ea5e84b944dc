//! Driving port: what the node must offer the RPC surface.
//!
//! The transport (JSON-RPC over HTTP, events over WebSocket) lives in this
//! crate; the node implements the capabilities.

use crate::domain::{ApiError, Balance, CliqueInfo, FetchResponse, TransferResult};
use async_trait::async_trait;
use primitive_types::U256;
use shared_types::Address;

/// Node capabilities exposed over RPC.
#[async_trait]
pub trait RpcServer: Send + Sync {
    /// Headers with `from_ts <= timestamp <= to_ts`, oldest first.
    async fn fetch_blocks(&self, from_ts: u64, to_ts: u64) -> Result<FetchResponse, ApiError>;

    async fn clique_info(&self) -> Result<CliqueInfo, ApiError>;

    async fn get_balance(&self, address: Address) -> Result<Balance, ApiError>;

    /// Sign a transfer with the 32-byte key seed and queue it for mining.
    async fn transfer(
        &self,
        from_private_key: [u8; 32],
        to: Address,
        value: U256,
    ) -> Result<TransferResult, ApiError>;

    /// Returns true when the miner was not already running.
    async fn start_mining(&self) -> Result<bool, ApiError>;

    /// Returns true when the miner was running.
    async fn stop_mining(&self) -> Result<bool, ApiError>;
}
