//! Domain module for block validation.

pub mod broadcast;
pub mod errors;
pub mod messages;

pub use broadcast::BroadcastPlan;
pub use errors::{HandlerError, InvalidBlockReason};
pub use messages::{BlockReply, ChainMessage, ValidateBlock, ValidationOutcome};
