//! Shard-Flow API gateway: JSON-RPC over HTTP and a WebSocket event feed.
//!
//! ```text
//!   HTTP POST /  ──► router::process_body ──► RpcServer (implemented by the node)
//!   WS   GET  /  ◄── ws::WebSocketHandler ◄── InMemoryEventBus
//! ```
//!
//! The gateway knows nothing about blocks or stores. The node implements
//! [`RpcServer`] and hands the gateway the event bus.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod ports;
pub mod router;
pub mod service;
pub mod ws;

pub use domain::{
    codes, ApiError, Balance, BlockHeaderEntry, ChainInfo, CliqueInfo, FetchResponse,
    GatewayConfig, GatewayError, JsonRpcRequest, JsonRpcResponse, TransferRequest,
    TransferResult, JSONRPC_VERSION,
};
pub use ports::RpcServer;
pub use service::{ApiGatewayService, GatewayHandle};
