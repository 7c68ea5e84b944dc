//! API Gateway error types with JSON-RPC 2.0 error codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard JSON-RPC 2.0 error codes
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Server errors (-32000 to -32099)
    pub const SERVER_ERROR: i32 = -32000;
    pub const RESOURCE_NOT_FOUND: i32 = -32001;
    pub const TRANSACTION_REJECTED: i32 = -32003;
}

/// API error carrying a JSON-RPC code.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// JSON-RPC error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Optional additional data
    pub data: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create error with additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Parse error - invalid JSON
    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, format!("Parse error: {}", details.into()))
    }

    /// Invalid request - not a valid JSON-RPC request
    pub fn invalid_request(details: impl Into<String>) -> Self {
        Self::new(
            codes::INVALID_REQUEST,
            format!("Invalid request: {}", details.into()),
        )
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(
            codes::INVALID_PARAMS,
            format!("Invalid params: {}", details.into()),
        )
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(
            codes::INTERNAL_ERROR,
            format!("Internal error: {}", details.into()),
        )
    }

    /// Block or other resource not found
    pub fn resource_not_found(resource: impl Into<String>) -> Self {
        Self::new(
            codes::RESOURCE_NOT_FOUND,
            format!("Resource not found: {}", resource.into()),
        )
    }

    pub fn transaction_rejected(reason: impl Into<String>) -> Self {
        Self::new(
            codes::TRANSACTION_REJECTED,
            format!("Transaction rejected: {}", reason.into()),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize, Deserialize)]
struct ErrorObject {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    data: Option<serde_json::Value>,
}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorObject {
            code: self.code,
            message: self.message.clone(),
            data: self.data.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ApiError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let object = ErrorObject::deserialize(deserializer)?;
        Ok(Self {
            code: object.code,
            message: object.message,
            data: object.data,
        })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_syntax() || e.is_eof() {
            Self::parse_error(e.to_string())
        } else {
            Self::invalid_params(e.to_string())
        }
    }
}

impl From<hex::FromHexError> for ApiError {
    fn from(e: hex::FromHexError) -> Self {
        Self::invalid_params(format!("invalid hex: {}", e))
    }
}

/// Failures starting or running the gateway servers.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::parse_error("x").code, -32700);
        assert_eq!(ApiError::method_not_found("foo").code, -32601);
        assert_eq!(ApiError::invalid_params("x").code, -32602);
        assert_eq!(ApiError::internal("x").code, -32603);
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_value(ApiError::method_not_found("foo")).unwrap();
        assert_eq!(json["code"], -32601);
        assert_eq!(json["message"], "Method not found: foo");
        assert!(json.get("data").is_none());

        let back: ApiError = serde_json::from_value(json).unwrap();
        assert_eq!(back, ApiError::method_not_found("foo"));
    }

    #[test]
    fn test_from_serde_error() {
        let err: ApiError = serde_json::from_str::<u64>("{").unwrap_err().into();
        assert_eq!(err.code, codes::PARSE_ERROR);
        let err: ApiError = serde_json::from_str::<u64>("\"x\"").unwrap_err().into();
        assert_eq!(err.code, codes::INVALID_PARAMS);
    }

    #[test]
    fn test_from_hex_error() {
        let err: ApiError = hex::decode("zz").unwrap_err().into();
        assert_eq!(err.code, codes::INVALID_PARAMS);
    }
}
