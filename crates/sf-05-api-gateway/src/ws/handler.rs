//! Pushes bus events to a WebSocket client as JSON-RPC notifications.
//!
//! The feed is one-way: text frames from the client are ignored, pings are
//! answered and a close frame ends the session.

use crate::domain::JSONRPC_VERSION;
use axum::extract::ws::{Message, WebSocket};
use futures::StreamExt;
use serde_json::{json, Value};
use shared_bus::{EventStream, NodeEvent};
use shared_types::{ChainIndex, DataOrigin};
use tracing::{debug, info, warn};

/// Notification method name carried by every pushed event.
pub const EVENT_METHOD: &str = "sf_event";

/// One WebSocket session.
pub struct WebSocketHandler {
    events: EventStream,
}

impl WebSocketHandler {
    pub fn new(events: EventStream) -> Self {
        Self { events }
    }

    /// Run until the client disconnects or the bus closes.
    pub async fn handle(mut self, mut socket: WebSocket) {
        info!("New WebSocket connection");

        loop {
            tokio::select! {
                incoming = socket.recv() => match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => debug!("Ignoring client frame"),
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive failed");
                        break;
                    }
                },
                event = self.events.next() => match event {
                    Some(event) => {
                        let text = event_notification(&event).to_string();
                        if let Err(e) = socket.send(Message::Text(text)).await {
                            debug!(error = %e, "WebSocket client gone");
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        info!("WebSocket connection closed");
    }
}

/// Render an event as a JSON-RPC notification with hex-encoded hashes.
pub fn event_notification(event: &NodeEvent) -> Value {
    let params = match event {
        NodeEvent::BlockAdded {
            hash,
            chain_index,
            origin,
        } => json!({
            "type": "BlockAdded",
            "hash": hex::encode(hash),
            "chainIndex": chain_json(chain_index),
            "origin": origin_json(origin),
        }),
        NodeEvent::InvalidBlock {
            hash,
            chain_index,
            origin,
            reason,
        } => json!({
            "type": "InvalidBlock",
            "hash": hex::encode(hash),
            "chainIndex": chain_json(chain_index),
            "origin": origin_json(origin),
            "reason": reason,
        }),
        NodeEvent::BroadcastIntraClique {
            hash,
            chain_index,
            origin,
            ..
        } => json!({
            "type": "BroadcastIntraClique",
            "hash": hex::encode(hash),
            "chainIndex": chain_json(chain_index),
            "origin": origin_json(origin),
        }),
        NodeEvent::BroadcastInterClique {
            hash,
            chain_index,
            origin,
            ..
        } => json!({
            "type": "BroadcastInterClique",
            "hash": hex::encode(hash),
            "chainIndex": chain_json(chain_index),
            "origin": origin_json(origin),
        }),
        NodeEvent::BlockMined { hash, chain_index } => json!({
            "type": "BlockMined",
            "hash": hex::encode(hash),
            "chainIndex": chain_json(chain_index),
        }),
        NodeEvent::MiningStatusChanged { active } => json!({
            "type": "MiningStatusChanged",
            "active": active,
        }),
        NodeEvent::CriticalError { component, error } => json!({
            "type": "CriticalError",
            "component": component,
            "error": error,
        }),
    };

    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": EVENT_METHOD,
        "params": params,
    })
}

fn chain_json(chain_index: &ChainIndex) -> Value {
    json!({ "from": chain_index.from.0, "to": chain_index.to.0 })
}

fn origin_json(origin: &DataOrigin) -> Value {
    match origin {
        DataOrigin::Local => json!({ "kind": "local" }),
        DataOrigin::InterClique(peer) => {
            json!({ "kind": "interClique", "peer": hex::encode(peer.0) })
        }
        DataOrigin::IntraClique(peer) => {
            json!({ "kind": "intraClique", "peer": hex::encode(peer.0) })
        }
    }
}
