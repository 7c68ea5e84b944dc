//! # Miner
//!
//! Round-robin block production over the chains this broker serves. Each
//! round builds a template on the store's best deps, fills it from the
//! transaction pool, searches a bounded nonce range on the blocking pool and
//! hands a found block to the chain processors like any other block.
//!
//! ```text
//!   best_deps ─► template ─► spawn_blocking(mine_block) ─► AllHandlers::validate
//!                   ▲                                            │
//!                   └──────────── TransactionPool ◄── remove_included
//! ```

use crate::adapters::TransactionPool;
use crate::container::config::MiningConfig;
use parking_lot::Mutex;
use primitive_types::U256;
use sf_02_chain_model::{mine_block, BlockTemplate, ConsensusConfig, Transaction};
use sf_03_block_flow::{BlockFlow, FlowError};
use sf_04_block_validation::{AllHandlers, BlockReply, HandlerError, TimeSource};
use shared_bus::{EventPublisher, NodeEvent};
use shared_types::{hash_hex, Address, BrokerConfig, ChainIndex, DataOrigin, GroupConfig};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};

/// Errors of one mining round.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("Store error: {0}")]
    Flow(#[from] FlowError),

    #[error("Chain processor error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Nonce search task failed: {0}")]
    Task(String),

    #[error("Broker serves no chain")]
    NoChains,
}

/// Everything the miner reads or writes.
#[derive(Clone)]
pub struct MinerDependencies {
    pub flow: Arc<dyn BlockFlow>,
    pub handlers: Arc<AllHandlers>,
    pub pool: Arc<Mutex<TransactionPool>>,
    pub publisher: Arc<dyn EventPublisher>,
    pub time_source: Arc<dyn TimeSource>,
    pub groups: GroupConfig,
    pub broker: BrokerConfig,
    pub consensus: ConsensusConfig,
    pub config: MiningConfig,
    /// Credited by every coinbase.
    pub miner_address: Address,
}

struct MinerState {
    deps: MinerDependencies,
    chains: Vec<ChainIndex>,
    active: AtomicBool,
    /// Checked by the nonce search; set when mining stops.
    cancel: Arc<AtomicBool>,
    wake: Notify,
    next_chain: AtomicUsize,
    blocks_mined: AtomicU64,
}

/// Handle to the miner. Clones share one state.
#[derive(Clone)]
pub struct Miner {
    state: Arc<MinerState>,
}

impl Miner {
    pub fn new(deps: MinerDependencies) -> Self {
        let chains = deps.broker.chain_indexes(&deps.groups);
        Self {
            state: Arc::new(MinerState {
                deps,
                chains,
                active: AtomicBool::new(false),
                cancel: Arc::new(AtomicBool::new(true)),
                wake: Notify::new(),
                next_chain: AtomicUsize::new(0),
                blocks_mined: AtomicU64::new(0),
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::Acquire)
    }

    /// Blocks mined and accepted since startup.
    pub fn blocks_mined(&self) -> u64 {
        self.state.blocks_mined.load(Ordering::Relaxed)
    }

    pub fn miner_address(&self) -> Address {
        self.state.deps.miner_address
    }

    /// Switch mining on. Returns false if it was already running.
    pub async fn start(&self) -> bool {
        if self.state.active.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.state.cancel.store(false, Ordering::Release);
        self.state.wake.notify_one();
        info!(miner = %hash_hex(&self.state.deps.miner_address), "Mining started");
        self.state
            .deps
            .publisher
            .publish(NodeEvent::MiningStatusChanged { active: true })
            .await;
        true
    }

    /// Switch mining off and abort the running nonce search. Returns false
    /// if it was not running.
    pub async fn stop(&self) -> bool {
        if !self.state.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.state.cancel.store(true, Ordering::Release);
        info!(blocks_mined = self.blocks_mined(), "Mining stopped");
        self.state
            .deps
            .publisher
            .publish(NodeEvent::MiningStatusChanged { active: false })
            .await;
        true
    }

    /// Mining loop. Idles while mining is off; exits when `shutdown` turns
    /// true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let interval = Duration::from_millis(self.state.deps.config.interval_ms);
        info!(chains = self.state.chains.len(), "Miner task started");

        while !*shutdown.borrow() {
            if !self.is_active() {
                tokio::select! {
                    _ = self.state.wake.notified() => {}
                    changed = shutdown.changed() => if changed.is_err() { break },
                }
                continue;
            }

            let chain_index = match self.next_chain() {
                Some(chain_index) => chain_index,
                None => {
                    warn!(error = %MiningError::NoChains, "Mining disabled");
                    self.stop().await;
                    continue;
                }
            };
            match self.mine_round(chain_index).await {
                Ok(Some(reply)) => debug!(chain = %chain_index, ?reply, "Mining round done"),
                Ok(None) => debug!(chain = %chain_index, "No block this round"),
                Err(e) => warn!(chain = %chain_index, error = %e, "Mining round failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => if changed.is_err() { break },
            }
        }

        self.state.cancel.store(true, Ordering::Release);
        info!("Miner task stopped");
    }

    fn next_chain(&self) -> Option<ChainIndex> {
        let chains = &self.state.chains;
        if chains.is_empty() {
            return None;
        }
        let next = self.state.next_chain.fetch_add(1, Ordering::Relaxed);
        Some(chains[next % chains.len()])
    }

    /// Try to mine one block on `chain_index` and submit it.
    ///
    /// `Ok(None)` when the nonce batch ran out or mining was cancelled.
    pub async fn mine_round(
        &self,
        chain_index: ChainIndex,
    ) -> Result<Option<BlockReply>, MiningError> {
        let deps = &self.state.deps;
        let template = self.template(chain_index)?;
        let tx_count = template.transactions.len();

        let groups = deps.groups;
        let batch = deps.config.nonce_batch;
        let cancel = Arc::clone(&self.state.cancel);
        let start_nonce = U256::from(rand::random::<u64>());
        let found = tokio::task::spawn_blocking(move || {
            mine_block(template, chain_index, &groups, start_nonce, batch, Some(cancel.as_ref()))
        })
        .await
        .map_err(|e| MiningError::Task(e.to_string()))?;

        let Some(block) = found else {
            return Ok(None);
        };

        let hash = block.hash();
        info!(chain = %chain_index, hash = %hash_hex(&hash), txs = tx_count, "Mined block");
        deps.publisher
            .publish(NodeEvent::BlockMined { hash, chain_index })
            .await;

        let included = block.non_coinbase().to_vec();
        let reply = deps.handlers.validate(block, DataOrigin::Local).await?;
        if reply.is_added() {
            self.state.blocks_mined.fetch_add(1, Ordering::Relaxed);
            let removed = deps.pool.lock().remove_included(&included);
            debug!(removed, "Pool cleared of mined transactions");
        } else {
            warn!(chain = %chain_index, hash = %hash_hex(&hash), "Mined block was rejected");
        }
        Ok(Some(reply))
    }

    fn template(&self, chain_index: ChainIndex) -> Result<BlockTemplate, MiningError> {
        let deps = &self.state.deps;
        let block_deps = deps.flow.best_deps(chain_index.from)?;
        let parent = deps.flow.get_header(&block_deps.parent_hash(chain_index))?;
        let timestamp = deps.time_source.now_millis().max(parent.timestamp + 1);

        let mut transactions = self.pooled_transactions(chain_index);
        transactions.push(Transaction::coinbase(
            chain_index,
            timestamp,
            deps.miner_address,
            deps.consensus.mining_reward,
        ));

        Ok(BlockTemplate {
            block_deps,
            transactions,
            timestamp,
            target: deps.consensus.max_mining_target,
        })
    }

    /// Pooled transactions whose inputs are all still unspent. Stale ones
    /// are evicted.
    fn pooled_transactions(&self, chain_index: ChainIndex) -> Vec<Transaction> {
        let deps = &self.state.deps;
        let mut pool = deps.pool.lock();
        let (live, stale): (Vec<_>, Vec<_>) = pool
            .get_for_block(chain_index, deps.config.max_block_txs)
            .into_iter()
            .partition(|tx| {
                tx.unsigned
                    .inputs
                    .iter()
                    .all(|input| deps.flow.get_output(&input.output_ref).is_some())
            });
        for tx in &stale {
            pool.remove(&tx.id());
            debug!(tx = %hash_hex(&tx.id()), "Evicted stale pooled transaction");
        }
        live
    }
}
