//! WebSocket event feed.

pub mod handler;

pub use handler::{event_notification, WebSocketHandler, EVENT_METHOD};
