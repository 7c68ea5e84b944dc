//! HTTP and WebSocket servers.

use crate::domain::{GatewayConfig, GatewayError};
use crate::ports::RpcServer;
use crate::router::process_body;
use crate::ws::WebSocketHandler;
use axum::extract::{DefaultBodyLimit, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use shared_bus::{EventFilter, InMemoryEventBus};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Serves JSON-RPC over HTTP and the event feed over WebSocket.
pub struct ApiGatewayService {
    config: GatewayConfig,
    rpc: Arc<dyn RpcServer>,
    bus: Arc<InMemoryEventBus>,
}

/// Running servers.
pub struct GatewayHandle {
    pub http_addr: SocketAddr,
    pub ws_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl GatewayHandle {
    /// Wait for both servers to stop.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "API gateway task failed");
        }
    }
}

#[derive(Clone)]
struct AppState {
    rpc: Arc<dyn RpcServer>,
}

impl ApiGatewayService {
    pub fn new(
        config: GatewayConfig,
        rpc: Arc<dyn RpcServer>,
        bus: Arc<InMemoryEventBus>,
    ) -> Result<Self, GatewayError> {
        config.validate().map_err(GatewayError::Config)?;
        Ok(Self { config, rpc, bus })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Bind both listeners, then serve until `shutdown` flips to true.
    ///
    /// Port 0 binds an ephemeral port; the chosen addresses are on the handle.
    pub async fn start(
        self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<GatewayHandle, GatewayError> {
        let http_listener = bind(self.config.http_addr()).await?;
        let ws_listener = bind(self.config.ws_addr()).await?;
        let http_addr = http_listener.local_addr()?;
        let ws_addr = ws_listener.local_addr()?;

        let http_router = self.http_router();
        let ws_router = self.ws_router();
        info!(%http_addr, %ws_addr, "API gateway listening");

        let task = tokio::spawn(async move {
            let http_shutdown = wait_for(shutdown.clone());
            let http = async move {
                axum::serve(http_listener, http_router)
                    .with_graceful_shutdown(http_shutdown)
                    .await
            };
            let ws = async move {
                axum::serve(ws_listener, ws_router)
                    .with_graceful_shutdown(wait_for(shutdown))
                    .await
            };
            let (http, ws) = tokio::join!(http, ws);
            if let Err(e) = http {
                error!(error = %e, "HTTP server error");
            }
            if let Err(e) = ws {
                error!(error = %e, "WebSocket server error");
            }
            info!("API gateway stopped");
        });

        Ok(GatewayHandle {
            http_addr,
            ws_addr,
            task,
        })
    }

    /// JSON-RPC on `POST /`, liveness on `GET /health`.
    pub fn http_router(&self) -> Router {
        let state = AppState {
            rpc: Arc::clone(&self.rpc),
        };
        Router::new()
            .route("/", post(handle_json_rpc))
            .route("/health", get(health_check))
            .layer(DefaultBodyLimit::max(self.config.max_request_size))
            .with_state(state)
    }

    /// Event feed on `GET /`.
    pub fn ws_router(&self) -> Router {
        let bus = Arc::clone(&self.bus);
        Router::new().route(
            "/",
            get(move |ws: WebSocketUpgrade| {
                let events = bus.event_stream(EventFilter::all());
                async move {
                    ws.on_upgrade(move |socket| WebSocketHandler::new(events).handle(socket))
                }
            }),
        )
    }
}

async fn bind(addr: SocketAddr) -> Result<TcpListener, GatewayError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind { addr, source })
}

async fn wait_for(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}

async fn handle_json_rpc(State(state): State<AppState>, body: String) -> impl IntoResponse {
    (StatusCode::OK, Json(process_body(state.rpc.as_ref(), &body).await))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::tests::MockRpc;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn service() -> ApiGatewayService {
        ApiGatewayService::new(
            GatewayConfig::default(),
            Arc::new(MockRpc::default()),
            Arc::new(InMemoryEventBus::new()),
        )
        .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_json_rpc() {
        let request = Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"jsonrpc": "2.0", "id": 7, "method": "clique_info"}).to_string(),
            ))
            .unwrap();
        let response = service().http_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"]["brokerNum"], 1);
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let response = service().http_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let config = GatewayConfig {
            max_request_size: 16,
            ..GatewayConfig::default()
        };
        let service = ApiGatewayService::new(
            config,
            Arc::new(MockRpc::default()),
            Arc::new(InMemoryEventBus::new()),
        )
        .unwrap();
        let request = Request::post("/")
            .body(Body::from("x".repeat(1024)))
            .unwrap();
        let response = service.http_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GatewayConfig {
            max_request_size: 0,
            ..GatewayConfig::default()
        };
        let result = ApiGatewayService::new(
            config,
            Arc::new(MockRpc::default()),
            Arc::new(InMemoryEventBus::new()),
        );
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let config = GatewayConfig {
            http_port: 0,
            ws_port: 0,
            ..GatewayConfig::default()
        };
        let service = ApiGatewayService::new(
            config,
            Arc::new(MockRpc::default()),
            Arc::new(InMemoryEventBus::new()),
        )
        .unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = service.start(shutdown_rx).await.unwrap();
        assert_ne!(handle.http_addr.port(), 0);
        assert_ne!(handle.ws_addr.port(), 0);
        shutdown_tx.send(true).unwrap();
        handle.join().await;
    }
}
