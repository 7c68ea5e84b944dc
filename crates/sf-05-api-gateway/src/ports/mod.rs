//! Ports for the API gateway.

pub mod inbound;

pub use inbound::RpcServer;
