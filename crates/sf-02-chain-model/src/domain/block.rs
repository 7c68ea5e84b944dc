//! # Block
//!
//! A header plus its ordered transactions, the coinbase last.

use crate::domain::header::BlockHeader;
use crate::domain::transaction::Transaction;
use shared_crypto::merkle_root;
use shared_types::{ChainIndex, Decode, Encode, FormatError, GroupConfig, Hash, Reader};

/// A full block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// Merkle root over the transactions' leaf hashes.
    pub fn txs_root(transactions: &[Transaction]) -> Hash {
        let leaves: Vec<Hash> = transactions.iter().map(Transaction::leaf_hash).collect();
        merkle_root(&leaves)
    }

    /// Identity: the header hash.
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn chain_index(&self, groups: &GroupConfig) -> ChainIndex {
        self.header.chain_index(groups)
    }

    pub fn is_genesis(&self) -> bool {
        self.header.is_genesis()
    }

    pub fn timestamp(&self) -> u64 {
        self.header.timestamp
    }

    /// Parent on the block's own chain. Panics on genesis blocks.
    pub fn parent_hash(&self, groups: &GroupConfig) -> Hash {
        self.header.parent_hash(groups)
    }

    /// The last transaction.
    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.last()
    }

    /// Every transaction but the last.
    pub fn non_coinbase(&self) -> &[Transaction] {
        let n = self.transactions.len().saturating_sub(1);
        &self.transactions[..n]
    }
}

impl Encode for Block {
    fn encode(&self, out: &mut Vec<u8>) {
        self.header.encode(out);
        self.transactions.encode(out);
    }
}

impl Decode for Block {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            header: BlockHeader::decode(reader)?,
            transactions: Vec::<Transaction>::decode(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::block_deps::BlockDeps;
    use crate::domain::header::GENESIS_TIMESTAMP;
    use crate::domain::target::Target;
    use primitive_types::U256;
    use proptest::prelude::*;

    fn sample(groups: &GroupConfig) -> Block {
        let ci = ChainIndex::new(0, 1);
        let txs = vec![
            Transaction::coinbase(ci, 5, [1u8; 32], U256::from(3u64)),
            Transaction::coinbase(ci, 6, [2u8; 32], U256::from(4u64)),
        ];
        let deps = BlockDeps::build(vec![[7u8; 32]; groups.deps_num()], groups).unwrap();
        let header = BlockHeader::unsafe_new(
            deps,
            Block::txs_root(&txs),
            GENESIS_TIMESTAMP + 10,
            Target::MAX,
            U256::from(1u64),
        );
        Block::new(header, txs)
    }

    #[test]
    fn test_hash_is_header_hash() {
        let groups = GroupConfig::new(3).unwrap();
        let block = sample(&groups);
        assert_eq!(block.hash(), block.header.hash());
        assert_eq!(block.header.txs_hash, Block::txs_root(&block.transactions));
    }

    #[test]
    fn test_round_trip() {
        let groups = GroupConfig::new(3).unwrap();
        let block = sample(&groups);
        let decoded = Block::from_bytes(&block.to_bytes()).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.hash());
    }

    #[test]
    fn test_coinbase_is_last() {
        let groups = GroupConfig::new(3).unwrap();
        let block = sample(&groups);
        assert_eq!(block.non_coinbase().len(), 1);
        assert_eq!(block.coinbase(), block.transactions.last());
    }

    #[test]
    fn test_truncated_block_rejected() {
        let groups = GroupConfig::new(3).unwrap();
        let bytes = sample(&groups).to_bytes();
        assert!(Block::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    proptest! {
        #[test]
        fn prop_block_round_trip(
            g in 1usize..=4,
            timestamps in proptest::collection::vec(any::<u64>(), 1..6),
            nonce in any::<[u8; 32]>(),
        ) {
            let groups = GroupConfig::new(g).unwrap();
            let txs: Vec<Transaction> = timestamps
                .iter()
                .map(|ts| Transaction::coinbase(ChainIndex::new(0, 0), *ts, [1u8; 32], U256::from(*ts)))
                .collect();
            let deps = BlockDeps::build(vec![[3u8; 32]; groups.deps_num()], &groups).unwrap();
            let header = BlockHeader::unsafe_new(
                deps,
                Block::txs_root(&txs),
                GENESIS_TIMESTAMP + 1,
                Target::MAX,
                U256::from_big_endian(&nonce),
            );
            let block = Block::new(header, txs);
            prop_assert_eq!(Block::from_bytes(&block.to_bytes()).unwrap(), block);
        }
    }

    #[test]
    fn test_empty_body_has_no_non_coinbase() {
        let groups = GroupConfig::new(3).unwrap();
        let mut block = sample(&groups);
        block.transactions.clear();
        assert!(block.non_coinbase().is_empty());
        assert!(block.coinbase().is_none());
    }
}
