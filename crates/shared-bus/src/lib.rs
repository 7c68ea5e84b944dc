//! # Shared Bus
//!
//! In-process publish/subscribe channel between the validation handlers, the
//! miner, the RPC layer and the network side of the node.
//!
//! ```text
//! ┌──────────────┐    publish()     ┌──────────────┐   subscribe()   ┌──────────────┐
//! │ ChainHandler │ ───────────────► │  Event Bus   │ ──────────────► │ RPC / Miner  │
//! └──────────────┘                  └──────────────┘                 └──────────────┘
//! ```
//!
//! Validation outcomes (`BlockAdded`, `InvalidBlock`) and broadcast requests
//! (`BroadcastIntraClique`, `BroadcastInterClique`) are the events every
//! consumer relies on; the rest are informational.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, NodeEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
