//! Gateway configuration.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Listen addresses of the HTTP and WebSocket servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub host: IpAddr,
    pub http_port: u16,
    pub ws_port: u16,
    /// Largest accepted JSON-RPC body in bytes.
    pub max_request_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            http_port: 12973,
            ws_port: 11973,
            max_request_size: 1024 * 1024,
        }
    }
}

impl GatewayConfig {
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.http_port)
    }

    pub fn ws_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.ws_port)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.http_port != 0 && self.http_port == self.ws_port {
            return Err(format!("HTTP and WebSocket share port {}", self.http_port));
        }
        if self.max_request_size == 0 {
            return Err("max_request_size must be positive".to_string());
        }
        Ok(())
    }
}
