//! Ports for block validation.

pub mod outbound;

pub use outbound::{FixedTimeSource, SystemTimeSource, TimeSource};
