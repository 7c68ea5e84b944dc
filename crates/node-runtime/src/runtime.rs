//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration and install genesis (`NodeContainer`)
//! 2. Spawn one validation processor per chain
//! 3. Spawn the miner task (idle until mining is switched on)
//! 4. Bind the JSON-RPC and WebSocket listeners
//!
//! ## Shutdown Sequence
//!
//! 1. Stop mining and signal every task through the watch channel
//! 2. Wait for the miner and the gateway
//! 3. Close the chain inboxes and let the processors drain

use crate::adapters::NodeRpc;
use crate::container::{NodeConfig, NodeContainer};
use crate::miner::{Miner, MinerDependencies};
use anyhow::{Context, Result};
use sf_04_block_validation::{AllHandlers, DEFAULT_INBOX_CAPACITY};
use sf_05_api_gateway::{ApiGatewayService, GatewayHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A running node.
pub struct NodeRuntime {
    container: NodeContainer,
    handlers: Arc<AllHandlers>,
    miner: Miner,
    rpc: Arc<NodeRpc>,
    shutdown_tx: watch::Sender<bool>,
    miner_task: Option<JoinHandle<()>>,
    gateway: Option<GatewayHandle>,
}

impl NodeRuntime {
    /// Build the node. Must be called inside a tokio runtime: the chain
    /// processors are spawned here.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let container = NodeContainer::new(config).context("Invalid node configuration")?;
        Ok(Self::from_container(container))
    }

    pub fn from_container(container: NodeContainer) -> Self {
        let handlers = Arc::new(AllHandlers::spawn(
            container.handler_dependencies(),
            DEFAULT_INBOX_CAPACITY,
        ));
        let miner = Miner::new(MinerDependencies {
            flow: container.flow.clone(),
            handlers: Arc::clone(&handlers),
            pool: Arc::clone(&container.pool),
            publisher: container.bus.clone(),
            time_source: Arc::clone(&container.time_source),
            groups: container.groups,
            broker: container.broker,
            consensus: container.config.consensus.clone(),
            config: container.config.mining.clone(),
            miner_address: container.miner_address,
        });
        let rpc = Arc::new(NodeRpc::new(
            container.flow.clone(),
            Arc::clone(&container.pool),
            miner.clone(),
            container.groups,
            container.broker,
            Arc::clone(&container.synced),
        ));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            container,
            handlers,
            miner,
            rpc,
            shutdown_tx,
            miner_task: None,
            gateway: None,
        }
    }

    /// Start the miner task and the RPC gateway.
    pub async fn start(&mut self) -> Result<()> {
        let config = &self.container.config;
        info!("===========================================");
        info!("  Shard-Flow Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "  Groups: {}  Broker: {}/{}",
            config.groups, config.broker.broker_id, config.broker.broker_num
        );
        info!("===========================================");

        let miner = self.miner.clone();
        self.miner_task = Some(tokio::spawn(miner.run(self.shutdown_tx.subscribe())));

        let gateway = ApiGatewayService::new(
            config.rpc.clone(),
            self.rpc.clone(),
            Arc::clone(&self.container.bus),
        )
        .context("Invalid RPC configuration")?;
        let handle = gateway
            .start(self.shutdown_tx.subscribe())
            .await
            .context("Failed to start the API gateway")?;
        info!(http = %handle.http_addr, ws = %handle.ws_addr, "RPC ready");
        self.gateway = Some(handle);

        if config.mining.autostart {
            self.miner.start().await;
        }
        Ok(())
    }

    pub fn container(&self) -> &NodeContainer {
        &self.container
    }

    pub fn rpc(&self) -> Arc<NodeRpc> {
        Arc::clone(&self.rpc)
    }

    pub fn miner(&self) -> &Miner {
        &self.miner
    }

    pub fn handlers(&self) -> &AllHandlers {
        &self.handlers
    }

    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.gateway.as_ref().map(|g| g.http_addr)
    }

    pub fn ws_addr(&self) -> Option<SocketAddr> {
        self.gateway.as_ref().map(|g| g.ws_addr)
    }

    /// Shutdown the node gracefully.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        self.miner.stop().await;
        if self.shutdown_tx.send(true).is_err() {
            warn!("No task was listening for shutdown");
        }

        if let Some(task) = self.miner_task {
            if let Err(e) = task.await {
                error!(error = %e, "Miner task failed");
            }
        }
        if let Some(gateway) = self.gateway {
            gateway.join().await;
        }

        drop(self.rpc);
        drop(self.miner);
        match Arc::try_unwrap(self.handlers) {
            Ok(handlers) => handlers.shutdown().await,
            Err(_) => warn!("Chain processors still referenced, leaving them running"),
        }
        info!("Shutdown complete");
    }
}
