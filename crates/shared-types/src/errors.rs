//! # Error Types
//!
//! Errors shared across crates: malformed bytes and inconsistent configuration.

use thiserror::Error;

/// Malformed serialized bytes.
///
/// Always surfaced to the immediate caller, never defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Input ended before the value was complete.
    #[error("Unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// Type tag outside the fixed table.
    #[error("Invalid tag byte {tag} for {kind}")]
    InvalidTag { kind: &'static str, tag: u8 },

    /// A boolean byte other than 0 or 1.
    #[error("Invalid bool byte {0}")]
    InvalidBool(u8),

    /// Declared length cannot possibly fit in the remaining input.
    #[error("Length {declared} exceeds remaining input {remaining}")]
    LengthOverflow { declared: usize, remaining: usize },

    /// Bytes left over after a complete value was read.
    #[error("Trailing bytes after value: {0}")]
    TrailingBytes(usize),

    /// Structurally valid bytes violating a type invariant.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Inconsistent configuration.
///
/// Fatal to the operation constructing the object; never corrupts existing state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A length derived from the group count does not match.
    #[error("Config mismatch: expected {expected} entries, got {actual}")]
    ConfigMismatch { expected: usize, actual: usize },

    /// Group count outside the supported range.
    #[error("Invalid group count {0}: must be in 1..=256")]
    InvalidGroups(usize),

    /// Broker layout does not tile the groups.
    #[error("Invalid broker config: {0}")]
    InvalidBroker(String),

    /// Any other rejected setting.
    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },
}
