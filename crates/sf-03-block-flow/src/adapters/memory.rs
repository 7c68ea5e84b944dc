//! # In-Memory Store
//!
//! All state sits behind one `RwLock`. Each update takes the write lock once,
//! so a reader sees either none or all of a block's effects.

use crate::domain::entities::{BlockEntry, GenesisAllocation};
use crate::domain::errors::FlowError;
use crate::domain::genesis::genesis_blocks;
use crate::ports::inbound::BlockFlow;
use parking_lot::RwLock;
use primitive_types::U256;
use sf_02_chain_model::{
    address_of, Block, BlockDeps, BlockHeader, Transaction, TxInput, TxOutput, TxOutputRef,
    UnsignedTransaction,
};
use shared_crypto::Ed25519KeyPair;
use shared_types::{hash_hex, Address, ChainIndex, GroupConfig, GroupIndex, Hash};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

struct FlowState {
    entries: HashMap<Hash, BlockEntry>,
    /// Tip per chain, indexed by `ChainIndex::flatten`.
    tips: Vec<Hash>,
    utxos: HashMap<TxOutputRef, TxOutput>,
}

impl FlowState {
    fn height_of(&self, hash: &Hash) -> Result<u64, FlowError> {
        self.entries
            .get(hash)
            .map(|entry| entry.height)
            .ok_or(FlowError::BlockNotFound(*hash))
    }

    /// Every input must still be unspent, and spent at most once.
    fn check_inputs(&self, transactions: &[Transaction]) -> Result<(), FlowError> {
        let mut spent = HashSet::new();
        for input in transactions.iter().flat_map(|tx| &tx.unsigned.inputs) {
            if !self.utxos.contains_key(&input.output_ref) || !spent.insert(input.output_ref) {
                return Err(FlowError::InputSpent(input.output_ref));
            }
        }
        Ok(())
    }

    fn apply_transactions(&mut self, transactions: &[Transaction]) {
        for tx in transactions {
            for input in &tx.unsigned.inputs {
                self.utxos.remove(&input.output_ref);
            }
            for (output_ref, output) in tx.output_refs() {
                self.utxos.insert(output_ref, output.clone());
            }
        }
    }
}

/// Multi-chain store held in memory.
pub struct InMemoryBlockFlow {
    groups: GroupConfig,
    state: RwLock<FlowState>,
}

impl InMemoryBlockFlow {
    /// Store holding the genesis block of every chain.
    pub fn new(groups: GroupConfig, allocations: &[GenesisAllocation]) -> Self {
        let mut state = FlowState {
            entries: HashMap::new(),
            tips: Vec::with_capacity(groups.chain_num()),
            utxos: HashMap::new(),
        };
        for (block, chain_index) in genesis_blocks(&groups, allocations)
            .into_iter()
            .zip(groups.chain_indexes())
        {
            let hash = block.hash();
            state.apply_transactions(&block.transactions);
            state.tips.push(hash);
            state.entries.insert(
                hash,
                BlockEntry {
                    header: block.header.clone(),
                    block: Some(block),
                    chain_index,
                    height: 0,
                },
            );
        }
        info!(
            groups = groups.groups(),
            allocations = allocations.len(),
            "Block flow initialized with genesis blocks"
        );
        Self {
            groups,
            state: RwLock::new(state),
        }
    }

    /// Genesis hash of a chain.
    pub fn genesis_hash(&self, chain_index: ChainIndex) -> Option<Hash> {
        self.state
            .read()
            .entries
            .iter()
            .find(|(_, e)| e.height == 0 && e.chain_index == chain_index)
            .map(|(hash, _)| *hash)
    }

    /// Height of every chain's tip, in row-major order.
    pub fn tip_heights(&self) -> Vec<(ChainIndex, u64)> {
        let state = self.state.read();
        self.groups
            .chain_indexes()
            .into_iter()
            .zip(state.tips.iter())
            .map(|(ci, tip)| (ci, state.height_of(tip).unwrap_or(0)))
            .collect()
    }

    /// Check deps and compute chain index and height for a new header.
    fn locate(
        &self,
        state: &FlowState,
        header: &BlockHeader,
    ) -> Result<(ChainIndex, u64), FlowError> {
        if header.is_genesis() {
            return Err(FlowError::GenesisImmutable);
        }
        if header.block_deps.len() != self.groups.deps_num() {
            return Err(FlowError::InvalidDeps {
                expected: self.groups.deps_num(),
                actual: header.block_deps.len(),
            });
        }
        let hash = header.hash();
        if let Some(dep) = header
            .block_deps
            .deps()
            .iter()
            .find(|dep| !state.entries.contains_key(*dep))
        {
            return Err(FlowError::MissingDependency { hash, dep: *dep });
        }
        let chain_index = header.chain_index(&self.groups);
        let height = state.height_of(&header.parent_hash(&self.groups))? + 1;
        Ok((chain_index, height))
    }

    fn insert(&self, state: &mut FlowState, entry: BlockEntry) {
        let hash = entry.header.hash();
        let slot = entry.chain_index.flatten(&self.groups);
        let tip_height = state.height_of(&state.tips[slot]).unwrap_or(0);
        if entry.height > tip_height {
            state.tips[slot] = hash;
        }
        debug!(
            hash = %hash_hex(&hash),
            chain = %entry.chain_index,
            height = entry.height,
            full = entry.block.is_some(),
            "Stored block entry"
        );
        state.entries.insert(hash, entry);
    }
}

impl BlockFlow for InMemoryBlockFlow {
    fn group_config(&self) -> GroupConfig {
        self.groups
    }

    fn contains(&self, hash: &Hash) -> bool {
        self.state.read().entries.contains_key(hash)
    }

    fn get_header(&self, hash: &Hash) -> Result<BlockHeader, FlowError> {
        self.state
            .read()
            .entries
            .get(hash)
            .map(|entry| entry.header.clone())
            .ok_or(FlowError::BlockNotFound(*hash))
    }

    fn get_block(&self, hash: &Hash) -> Result<Block, FlowError> {
        let state = self.state.read();
        let entry = state.entries.get(hash).ok_or(FlowError::BlockNotFound(*hash))?;
        entry.block.clone().ok_or(FlowError::BodyNotStored(*hash))
    }

    fn get_height(&self, header: &BlockHeader) -> Result<u64, FlowError> {
        self.state.read().height_of(&header.hash())
    }

    fn get_headers_unsafe(&self, predicate: &dyn Fn(&BlockHeader) -> bool) -> Vec<BlockHeader> {
        self.state
            .read()
            .entries
            .values()
            .filter(|entry| predicate(&entry.header))
            .map(|entry| entry.header.clone())
            .collect()
    }

    fn get_tip(&self, chain_index: ChainIndex) -> Result<Hash, FlowError> {
        if !chain_index.is_valid(&self.groups) {
            return Err(FlowError::UnknownChain(chain_index));
        }
        Ok(self.state.read().tips[chain_index.flatten(&self.groups)])
    }

    fn best_deps(&self, from: GroupIndex) -> Result<BlockDeps, FlowError> {
        let groups = self.groups.groups();
        if from.0 >= groups {
            return Err(FlowError::UnknownChain(ChainIndex { from, to: from }));
        }
        let state = self.state.read();
        let tip = |ci: ChainIndex| state.tips[ci.flatten(&self.groups)];

        let mut deps = Vec::with_capacity(self.groups.deps_num());
        for g in (0..groups).filter(|g| *g != from.0) {
            // Highest tip among the chains starting at group g.
            let best = (0..groups)
                .map(|t| tip(ChainIndex::new(g, t)))
                .max_by_key(|hash| state.height_of(hash).unwrap_or(0))
                .ok_or(FlowError::UnknownChain(ChainIndex::new(g, g)))?;
            deps.push(best);
        }
        for t in 0..groups {
            deps.push(tip(ChainIndex::new(from.0, t)));
        }
        BlockDeps::build(deps, &self.groups).map_err(|_| FlowError::InvalidDeps {
            expected: self.groups.deps_num(),
            actual: 0,
        })
    }

    fn add_block(&self, block: Block) -> Result<(), FlowError> {
        let mut state = self.state.write();
        let hash = block.hash();
        let existing_height = match state.entries.get(&hash) {
            Some(entry) if entry.block.is_some() => return Ok(()),
            Some(entry) => Some(entry.height),
            None => None,
        };
        let (chain_index, height) = match existing_height {
            Some(height) => (block.chain_index(&self.groups), height),
            None => self.locate(&state, &block.header)?,
        };
        state.check_inputs(&block.transactions)?;
        state.apply_transactions(&block.transactions);
        let entry = BlockEntry {
            header: block.header.clone(),
            block: Some(block),
            chain_index,
            height,
        };
        self.insert(&mut state, entry);
        Ok(())
    }

    fn add_header(&self, header: BlockHeader) -> Result<(), FlowError> {
        let mut state = self.state.write();
        if state.entries.contains_key(&header.hash()) {
            return Ok(());
        }
        let (chain_index, height) = self.locate(&state, &header)?;
        let entry = BlockEntry {
            header,
            block: None,
            chain_index,
            height,
        };
        self.insert(&mut state, entry);
        Ok(())
    }

    fn get_output(&self, output_ref: &TxOutputRef) -> Option<TxOutput> {
        self.state.read().utxos.get(output_ref).cloned()
    }

    fn get_utxos(&self, address: &Address) -> Vec<(TxOutputRef, TxOutput)> {
        let mut utxos: Vec<(TxOutputRef, TxOutput)> = self
            .state
            .read()
            .utxos
            .iter()
            .filter(|(_, output)| output.lockup == *address)
            .map(|(output_ref, output)| (*output_ref, output.clone()))
            .collect();
        utxos.sort_by_key(|(output_ref, _)| *output_ref);
        utxos
    }

    fn prepare_transaction(
        &self,
        from_key: &Ed25519KeyPair,
        to: Address,
        value: U256,
    ) -> Result<Option<Transaction>, FlowError> {
        if value.is_zero() {
            return Err(FlowError::InvalidAmount);
        }
        let public_key = *from_key.public_key().as_bytes();
        let from = address_of(&public_key);

        let mut inputs = Vec::new();
        let mut total = U256::zero();
        for (output_ref, output) in self.get_utxos(&from) {
            if total >= value {
                break;
            }
            total = total.saturating_add(output.amount);
            inputs.push(TxInput {
                output_ref,
                public_key,
            });
        }
        if total < value {
            debug!(
                from = %hash_hex(&from),
                balance = %total,
                requested = %value,
                "Insufficient balance for transfer"
            );
            return Ok(None);
        }

        let mut outputs = vec![TxOutput {
            amount: value,
            lockup: to,
            additional_data: Vec::new(),
        }];
        let change = total - value;
        if !change.is_zero() {
            outputs.push(TxOutput {
                amount: change,
                lockup: from,
                additional_data: Vec::new(),
            });
        }
        let unsigned = UnsignedTransaction {
            inputs,
            outputs,
            script: None,
        };
        Ok(Some(unsigned.sign(from_key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_02_chain_model::{mine_block, mine_genesis, BlockTemplate, Target, GENESIS_TIMESTAMP};

    fn key(seed: u8) -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed([seed; 32])
    }

    fn funded_flow(amount: u64) -> (InMemoryBlockFlow, Ed25519KeyPair) {
        let groups = GroupConfig::new(3).unwrap();
        let owner = key(1);
        let allocations = [GenesisAllocation {
            address: address_of(owner.public_key().as_bytes()),
            amount: U256::from(amount),
        }];
        (InMemoryBlockFlow::new(groups, &allocations), owner)
    }

    fn next_block(
        flow: &InMemoryBlockFlow,
        ci: ChainIndex,
        mut txs: Vec<Transaction>,
        ts: u64,
    ) -> Block {
        txs.push(Transaction::coinbase(ci, ts, [9u8; 32], U256::one()));
        let template = BlockTemplate {
            block_deps: flow.best_deps(ci.from).unwrap(),
            transactions: txs,
            timestamp: ts,
            target: Target::MAX,
        };
        mine_block(template, ci, &flow.group_config(), U256::zero(), 1_000_000, None).unwrap()
    }

    #[test]
    fn test_genesis_installed() {
        let (flow, owner) = funded_flow(50);
        let groups = flow.group_config();
        for ci in groups.chain_indexes() {
            let tip = flow.get_tip(ci).unwrap();
            assert_eq!(flow.genesis_hash(ci), Some(tip));
            let header = flow.get_header(&tip).unwrap();
            assert!(header.is_genesis());
            assert_eq!(flow.get_height(&header).unwrap(), 0);
        }
        let address = address_of(owner.public_key().as_bytes());
        assert_eq!(flow.get_balance(&address), U256::from(50u64));
    }

    #[test]
    fn test_add_block_moves_tip() {
        let (flow, _) = funded_flow(50);
        let ci = ChainIndex::new(1, 2);
        let block = next_block(&flow, ci, vec![], GENESIS_TIMESTAMP + 1);
        let hash = block.hash();
        flow.add_block(block.clone()).unwrap();

        assert!(flow.contains(&hash));
        assert_eq!(flow.get_tip(ci).unwrap(), hash);
        assert_eq!(flow.get_height(&block.header).unwrap(), 1);
        assert_eq!(flow.get_block(&hash).unwrap(), block);
        // Coinbase credited.
        assert_eq!(flow.get_balance(&[9u8; 32]), U256::one());
        // Idempotent.
        flow.add_block(block).unwrap();
        assert_eq!(flow.get_balance(&[9u8; 32]), U256::one());
    }

    #[test]
    fn test_missing_dependency_rejected() {
        let (flow, _) = funded_flow(50);
        let ci = ChainIndex::new(0, 0);
        let mut block = next_block(&flow, ci, vec![], GENESIS_TIMESTAMP + 1);
        let mut deps = block.header.block_deps.deps().to_vec();
        deps[0] = [0xee; 32];
        block.header.block_deps = BlockDeps::build(deps, &flow.group_config()).unwrap();
        assert!(matches!(
            flow.add_block(block),
            Err(FlowError::MissingDependency { dep, .. }) if dep == [0xee; 32]
        ));
    }

    #[test]
    fn test_genesis_cannot_be_added() {
        let (flow, _) = funded_flow(50);
        let tip = flow.get_tip(ChainIndex::new(0, 0)).unwrap();
        let genesis = flow.get_block(&tip).unwrap();
        flow.add_header(genesis.header).unwrap();
        let groups = flow.group_config();
        let ci = ChainIndex::new(0, 0);
        let fresh = mine_genesis(
            &groups,
            ci,
            vec![Transaction::coinbase(ci, 1, [1u8; 32], U256::one())],
        );
        assert_eq!(flow.add_block(fresh), Err(FlowError::GenesisImmutable));
    }

    #[test]
    fn test_header_only_entry() {
        let (flow, _) = funded_flow(50);
        let ci = ChainIndex::new(2, 0);
        let block = next_block(&flow, ci, vec![], GENESIS_TIMESTAMP + 1);
        let hash = block.hash();
        flow.add_header(block.header.clone()).unwrap();

        assert!(flow.contains(&hash));
        assert_eq!(flow.get_block(&hash), Err(FlowError::BodyNotStored(hash)));
        assert_eq!(flow.get_tip(ci).unwrap(), hash);
        // Coinbase not applied for header-only entries.
        assert_eq!(flow.get_balance(&[9u8; 32]), U256::zero());

        // Upgrading to the full block applies it.
        flow.add_block(block).unwrap();
        assert_eq!(flow.get_balance(&[9u8; 32]), U256::one());
    }

    #[test]
    fn test_best_deps_shape() {
        let (flow, _) = funded_flow(50);
        let groups = flow.group_config();
        let block = next_block(&flow, ChainIndex::new(0, 1), vec![], GENESIS_TIMESTAMP + 1);
        flow.add_block(block.clone()).unwrap();

        let deps = flow.best_deps(GroupIndex(0)).unwrap();
        assert_eq!(deps.len(), groups.deps_num());
        assert_eq!(deps.uncle_hash(GroupIndex(1)), block.hash());

        // Group 1 picks it up as its in-dep for group 0.
        let deps = flow.best_deps(GroupIndex(1)).unwrap();
        assert_eq!(deps.in_dep(GroupIndex(0), GroupIndex(1)), block.hash());
        assert!(flow.best_deps(GroupIndex(3)).is_err());
    }

    #[test]
    fn test_prepare_transaction() {
        let (flow, owner) = funded_flow(50);
        let from = address_of(owner.public_key().as_bytes());
        let tx = flow
            .prepare_transaction(&owner, [7u8; 32], U256::from(20u64))
            .unwrap()
            .expect("funded");
        assert_eq!(tx.unsigned.inputs.len(), 1);
        assert_eq!(tx.unsigned.outputs[0].amount, U256::from(20u64));
        assert_eq!(tx.unsigned.outputs[1].amount, U256::from(30u64));
        assert_eq!(tx.unsigned.outputs[1].lockup, from);
        assert_eq!(tx.signatures.len(), 1);

        assert!(flow
            .prepare_transaction(&owner, [7u8; 32], U256::from(51u64))
            .unwrap()
            .is_none());
        assert_eq!(
            flow.prepare_transaction(&owner, [7u8; 32], U256::zero()),
            Err(FlowError::InvalidAmount)
        );
    }

    #[test]
    fn test_transfer_applied_through_block() {
        let (flow, owner) = funded_flow(50);
        let groups = flow.group_config();
        let tx = flow
            .prepare_transaction(&owner, [7u8; 32], U256::from(20u64))
            .unwrap()
            .unwrap();
        let ci = tx.chain_index(&groups).unwrap();
        let block = next_block(&flow, ci, vec![tx], GENESIS_TIMESTAMP + 1);
        flow.add_block(block).unwrap();

        let from = address_of(owner.public_key().as_bytes());
        assert_eq!(flow.get_balance(&from), U256::from(30u64));
        assert_eq!(flow.get_balance(&[7u8; 32]), U256::from(20u64));
    }

    #[test]
    fn test_output_spent_by_concurrent_block_rejected() {
        let (flow, owner) = funded_flow(50);
        let groups = flow.group_config();
        // Both transfers are prepared against the same genesis output.
        let to_one = flow
            .prepare_transaction(&owner, [7u8; 32], U256::from(20u64))
            .unwrap()
            .unwrap();
        let to_two = flow
            .prepare_transaction(&owner, [8u8; 32], U256::from(30u64))
            .unwrap()
            .unwrap();
        let spent = to_one.unsigned.inputs[0].output_ref;
        assert_eq!(to_two.unsigned.inputs[0].output_ref, spent);

        let ci_one = to_one.chain_index(&groups).unwrap();
        let ci_two = to_two.chain_index(&groups).unwrap();
        assert_ne!(ci_one, ci_two);
        assert_eq!(ci_one.from, ci_two.from);
        let first = next_block(&flow, ci_one, vec![to_one], GENESIS_TIMESTAMP + 1);
        let second = next_block(&flow, ci_two, vec![to_two], GENESIS_TIMESTAMP + 1);
        let tip = flow.get_tip(ci_two).unwrap();

        flow.add_block(first).unwrap();
        assert_eq!(flow.add_block(second.clone()), Err(FlowError::InputSpent(spent)));
        assert!(!flow.contains(&second.hash()));
        assert_eq!(flow.get_tip(ci_two).unwrap(), tip);

        let from = address_of(owner.public_key().as_bytes());
        assert_eq!(flow.get_balance(&from), U256::from(30u64));
        assert_eq!(flow.get_balance(&[7u8; 32]), U256::from(20u64));
        assert_eq!(flow.get_balance(&[8u8; 32]), U256::zero());
    }

    #[test]
    fn test_get_headers_unsafe() {
        let (flow, _) = funded_flow(50);
        let genesis = flow.get_headers_unsafe(&|h| h.is_genesis());
        assert_eq!(genesis.len(), 9);
        assert!(flow.get_headers_unsafe(&|h| !h.is_genesis()).is_empty());
    }
}
