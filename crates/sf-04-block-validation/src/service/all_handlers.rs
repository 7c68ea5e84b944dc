//! # All Handlers
//!
//! One processor task per chain, each with its own inbox. Chains run in
//! parallel; inside a chain, messages are handled one at a time in arrival
//! order.

use super::chain_handler::{ChainHandler, HandlerDependencies};
use crate::domain::{BlockReply, ChainMessage, HandlerError, ValidateBlock};
use sf_02_chain_model::Block;
use shared_types::{ChainIndex, DataOrigin, GroupConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Default inbox size per chain.
pub const DEFAULT_INBOX_CAPACITY: usize = 256;

/// Running processors for every chain.
pub struct AllHandlers {
    groups: GroupConfig,
    senders: Vec<mpsc::Sender<ChainMessage>>,
    synced: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
}

impl AllHandlers {
    /// Spawn `G²` processors on the current runtime.
    pub fn spawn(deps: HandlerDependencies, inbox_capacity: usize) -> Self {
        let groups = deps.groups;
        let synced = deps.synced.clone();
        let mut senders = Vec::with_capacity(groups.chain_num());
        let mut tasks = Vec::with_capacity(groups.chain_num());
        for chain_index in groups.chain_indexes() {
            let (sender, inbox) = mpsc::channel(inbox_capacity);
            let handler = ChainHandler::new(chain_index, deps.clone());
            tasks.push(tokio::spawn(handler.run(inbox)));
            senders.push(sender);
        }
        info!(
            chains = groups.chain_num(),
            broker_id = deps.broker.broker_id(),
            broker_num = deps.broker.broker_num(),
            "Chain processors started"
        );
        Self {
            groups,
            senders,
            synced,
            tasks,
        }
    }

    /// Inbox of a chain's processor.
    pub fn sender(
        &self,
        chain_index: ChainIndex,
    ) -> Result<&mpsc::Sender<ChainMessage>, HandlerError> {
        if !chain_index.is_valid(&self.groups) {
            return Err(HandlerError::UnknownChain(chain_index));
        }
        Ok(&self.senders[chain_index.flatten(&self.groups)])
    }

    /// Route a block to the processor of the chain its hash selects and wait
    /// for the reply.
    pub async fn validate(
        &self,
        block: Block,
        origin: DataOrigin,
    ) -> Result<BlockReply, HandlerError> {
        let chain_index = block.chain_index(&self.groups);
        let sender = self.sender(chain_index)?;
        let (reply_to, reply) = oneshot::channel();
        sender
            .send(ChainMessage::Validate(ValidateBlock {
                block,
                origin,
                reply_to,
            }))
            .await
            .map_err(|_| HandlerError::ProcessorStopped(chain_index))?;
        reply
            .await
            .map_err(|_| HandlerError::ProcessorStopped(chain_index))
    }

    /// Update the node sync flag every processor reads.
    pub fn set_synced(&self, synced: bool) {
        let previous = self.synced.swap(synced, Ordering::AcqRel);
        if previous != synced {
            info!(synced, "Node sync status changed");
        }
    }

    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    pub fn groups(&self) -> &GroupConfig {
        &self.groups
    }

    /// Close every inbox and wait for the processors to drain.
    pub async fn shutdown(self) {
        drop(self.senders);
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "Chain processor ended abnormally");
            }
        }
        info!("Chain processors stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedTimeSource;
    use crate::testing::Fixture;
    use sf_03_block_flow::BlockFlow;
    use shared_bus::{EventFilter, EventSubscriber, EventTopic, InMemoryEventBus, NodeEvent};
    use shared_types::BrokerConfig;

    fn spawn(fx: &Fixture, bus: Arc<InMemoryEventBus>) -> AllHandlers {
        AllHandlers::spawn(
            HandlerDependencies {
                flow: fx.flow.clone(),
                publisher: bus,
                time_source: Arc::new(FixedTimeSource(fx.now())),
                groups: fx.groups,
                broker: BrokerConfig::single(&fx.groups),
                consensus: fx.consensus.clone(),
                synced: Arc::new(AtomicBool::new(false)),
            },
            DEFAULT_INBOX_CAPACITY,
        )
    }

    #[tokio::test]
    async fn test_routes_by_chain_index() {
        let fx = Fixture::new(3);
        let bus = Arc::new(InMemoryEventBus::new());
        let handlers = spawn(&fx, bus.clone());
        let mut added = bus.subscribe(EventFilter::topics(vec![EventTopic::Validation]));

        for ci in fx.groups.chain_indexes() {
            let block = fx.block(ci, vec![]);
            let hash = block.hash();
            let reply = handlers.validate(block, DataOrigin::Local).await.unwrap();
            assert_eq!(reply, BlockReply::BlockAdded(hash));
            assert_eq!(fx.flow.get_tip(ci).unwrap(), hash);
        }
        let events = added.drain();
        assert_eq!(events.len(), 9);
        assert!(events.iter().all(|e| matches!(e, NodeEvent::BlockAdded { .. })));
        handlers.shutdown().await;
    }

    #[tokio::test]
    async fn test_sync_flag_gates_inter_clique() {
        let fx = Fixture::new(2);
        let bus = Arc::new(InMemoryEventBus::new());
        let handlers = spawn(&fx, bus.clone());
        let mut broadcasts = bus.subscribe(EventFilter::topics(vec![EventTopic::Broadcast]));

        let ci = ChainIndex::new(0, 1);
        handlers
            .validate(fx.block(ci, vec![]), DataOrigin::Local)
            .await
            .unwrap();
        assert!(broadcasts.drain().is_empty());

        handlers.set_synced(true);
        assert!(handlers.is_synced());
        handlers
            .validate(fx.block(ci, vec![]), DataOrigin::Local)
            .await
            .unwrap();
        assert!(matches!(
            broadcasts.drain().as_slice(),
            [NodeEvent::BroadcastInterClique { .. }]
        ));
        handlers.shutdown().await;
    }

    #[tokio::test]
    async fn test_synced_result_message() {
        let fx = Fixture::new(2);
        let handlers = spawn(&fx, Arc::new(InMemoryEventBus::new()));
        let sender = handlers.sender(ChainIndex::new(1, 1)).unwrap().clone();
        sender.send(ChainMessage::SyncedResult(true)).await.unwrap();

        // A later request on the same inbox is handled after the flag flips.
        let (reply_to, reply) = oneshot::channel();
        let block = fx.block(ChainIndex::new(1, 1), vec![]);
        sender
            .send(ChainMessage::Validate(ValidateBlock {
                block,
                origin: DataOrigin::Local,
                reply_to,
            }))
            .await
            .unwrap();
        assert!(reply.await.unwrap().is_added());
        assert!(handlers.is_synced());

        assert_eq!(
            handlers.sender(ChainIndex::new(2, 0)).err(),
            Some(HandlerError::UnknownChain(ChainIndex::new(2, 0)))
        );
        drop(sender);
        handlers.shutdown().await;
    }
}
