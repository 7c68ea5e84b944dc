//! Chain processors.

pub mod all_handlers;
pub mod chain_handler;

pub use all_handlers::{AllHandlers, DEFAULT_INBOX_CAPACITY};
pub use chain_handler::{ChainHandler, HandlerDependencies};
