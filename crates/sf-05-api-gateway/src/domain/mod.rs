//! Gateway domain: errors, configuration and wire payloads.

pub mod config;
pub mod error;
pub mod types;

pub use config::GatewayConfig;
pub use error::{codes, ApiError, GatewayError};
pub use types::*;
