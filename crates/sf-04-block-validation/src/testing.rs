//! Test fixtures: a funded store and helpers that mine valid blocks on it.

use crate::validation::BlockValidator;
use primitive_types::U256;
use sf_02_chain_model::{
    address_of, mine_block, Block, BlockDeps, BlockTemplate, ConsensusConfig, Target, Transaction,
    GENESIS_TIMESTAMP,
};
use sf_03_block_flow::{BlockFlow, GenesisAllocation, InMemoryBlockFlow};
use shared_crypto::Ed25519KeyPair;
use shared_types::{Address, ChainIndex, GroupConfig};
use std::sync::Arc;

pub(crate) const MINER: Address = [9u8; 32];

pub(crate) struct Fixture {
    pub groups: GroupConfig,
    pub consensus: ConsensusConfig,
    pub flow: Arc<InMemoryBlockFlow>,
    pub owner: Ed25519KeyPair,
}

impl Fixture {
    /// `groups` groups, with 1000 coins credited to `owner` at genesis.
    pub fn new(groups: usize) -> Self {
        let groups = GroupConfig::new(groups).unwrap();
        let owner = Ed25519KeyPair::from_seed([1u8; 32]);
        let allocation = GenesisAllocation {
            address: address_of(owner.public_key().as_bytes()),
            amount: U256::from(1000u64),
        };
        Self {
            groups,
            consensus: ConsensusConfig::default(),
            flow: Arc::new(InMemoryBlockFlow::new(groups, &[allocation])),
            owner,
        }
    }

    pub fn validator(&self) -> BlockValidator {
        BlockValidator::new(self.groups, self.consensus.clone())
    }

    pub fn now(&self) -> u64 {
        GENESIS_TIMESTAMP + 60_000
    }

    /// One past the timestamp of the chain's tip.
    pub fn next_timestamp(&self, ci: ChainIndex) -> u64 {
        let tip = self.flow.get_tip(ci).unwrap();
        self.flow.get_header(&tip).unwrap().timestamp + 1
    }

    /// A valid block on `ci` on top of the store's best deps.
    pub fn block(&self, ci: ChainIndex, txs: Vec<Transaction>) -> Block {
        let deps = self.flow.best_deps(ci.from).unwrap();
        self.mine(ci, deps, txs, self.next_timestamp(ci))
    }

    /// Mine `txs` plus a coinbase on `ci` with explicit deps and timestamp.
    pub fn mine(
        &self,
        ci: ChainIndex,
        deps: BlockDeps,
        mut txs: Vec<Transaction>,
        ts: u64,
    ) -> Block {
        txs.push(Transaction::coinbase(ci, ts, MINER, self.consensus.mining_reward));
        let template = BlockTemplate {
            block_deps: deps,
            transactions: txs,
            timestamp: ts,
            target: Target::MAX,
        };
        mine_block(template, ci, &self.groups, U256::zero(), 10_000_000, None).unwrap()
    }

    /// A signed transfer from `owner`.
    pub fn transfer(&self, to: Address, value: U256) -> Transaction {
        self.flow
            .prepare_transaction(&self.owner, to, value)
            .unwrap()
            .unwrap()
    }
}
