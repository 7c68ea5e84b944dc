//! JSON-RPC envelope and method payloads.
//!
//! Hashes, addresses and keys travel as lowercase hex; amounts as `U256`
//! in its serde form (`0x`-prefixed hex).

use crate::domain::error::ApiError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// Incoming JSON-RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Outgoing JSON-RPC response: `result` or `error`, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<ApiError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: ApiError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// A header summary returned by `blockflow_fetch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeaderEntry {
    pub hash: String,
    pub timestamp: u64,
    pub chain_from: usize,
    pub chain_to: usize,
    pub height: u64,
    pub deps: Vec<String>,
}

/// Headers with timestamps in a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub headers: Vec<BlockHeaderEntry>,
}

/// Tip of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_from: usize,
    pub chain_to: usize,
    pub height: u64,
    pub tip: String,
}

/// Node and clique layout as seen by this broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliqueInfo {
    pub groups: usize,
    pub broker_id: usize,
    pub broker_num: usize,
    pub group_from: usize,
    pub group_until: usize,
    pub synced: bool,
    pub mining: bool,
    pub chains: Vec<ChainInfo>,
}

/// Spendable balance of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub address: String,
    pub balance: U256,
    pub utxo_count: usize,
}

/// Parameters of `transfer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_private_key: String,
    pub to_address: String,
    pub value: U256,
}

/// A transfer accepted for mining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub tx_id: String,
    pub from_group: usize,
    pub to_group: usize,
}

/// Parse a 32-byte value from hex, with or without a `0x` prefix.
pub fn parse_hex32(value: &str) -> Result<[u8; 32], ApiError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(digits)?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| ApiError::invalid_params(format!("expected 32 bytes, got {}", bytes.len())))
}
