//! Body rules.

use super::BlockValidator;
use crate::domain::errors::InvalidBlockReason;
use primitive_types::U256;
use sf_02_chain_model::{address_of, ordered_non_coinbase, Block, Transaction};
use sf_03_block_flow::BlockFlow;
use shared_crypto::verify_raw;
use shared_types::ChainIndex;
use std::collections::HashSet;

impl BlockValidator {
    /// Check a block's transactions. Assumes the header already passed.
    pub fn validate_body(
        &self,
        block: &Block,
        flow: &dyn BlockFlow,
    ) -> Result<(), InvalidBlockReason> {
        let chain_index = block.chain_index(&self.groups);
        self.check_coinbase_placement(block)?;

        let mut ids = HashSet::with_capacity(block.transactions.len());
        for tx in &block.transactions {
            let id = tx.id();
            if !ids.insert(id) {
                return Err(InvalidBlockReason::DuplicateTransaction(id));
            }
        }

        if Block::txs_root(&block.transactions) != block.header.txs_hash {
            return Err(InvalidBlockReason::InvalidMerkleRoot);
        }

        self.check_coinbase(block, chain_index)?;

        let mut spent = HashSet::new();
        for tx in block.non_coinbase() {
            self.check_well_formed(tx, chain_index)?;
            for input in &tx.unsigned.inputs {
                if !spent.insert(input.output_ref) {
                    return Err(InvalidBlockReason::DoubleSpend(input.output_ref));
                }
            }
        }

        for tx in ordered_non_coinbase(block, &self.groups) {
            check_inputs(tx, flow)?;
        }
        Ok(())
    }

    fn check_coinbase_placement(&self, block: &Block) -> Result<(), InvalidBlockReason> {
        let Some(last) = block.transactions.last() else {
            return Err(InvalidBlockReason::EmptyBlock);
        };
        if !last.is_coinbase() {
            return Err(InvalidBlockReason::MissingCoinbase);
        }
        match block.non_coinbase().iter().position(Transaction::is_coinbase) {
            Some(index) => Err(InvalidBlockReason::MisplacedCoinbase(index)),
            None => Ok(()),
        }
    }

    fn check_coinbase(
        &self,
        block: &Block,
        chain_index: ChainIndex,
    ) -> Result<(), InvalidBlockReason> {
        let coinbase = block.coinbase().ok_or(InvalidBlockReason::MissingCoinbase)?;
        let amount = coinbase
            .unsigned
            .outputs
            .first()
            .map(|output| output.amount)
            .unwrap_or_default();
        if amount != self.consensus.mining_reward {
            return Err(InvalidBlockReason::InvalidCoinbaseReward {
                expected: self.consensus.mining_reward,
                actual: amount,
            });
        }
        if coinbase.coinbase_chain_index() != Some(chain_index) {
            return Err(InvalidBlockReason::InvalidCoinbaseChain(chain_index));
        }
        Ok(())
    }

    fn check_well_formed(
        &self,
        tx: &Transaction,
        chain_index: ChainIndex,
    ) -> Result<(), InvalidBlockReason> {
        let malformed = |reason| InvalidBlockReason::MalformedTransaction { tx: tx.id(), reason };
        let unsigned = &tx.unsigned;
        if unsigned.inputs.is_empty() {
            return Err(malformed("no inputs"));
        }
        if unsigned.outputs.is_empty() {
            return Err(malformed("no outputs"));
        }
        if tx.signatures.len() != unsigned.inputs.len() {
            return Err(malformed("signature count differs from input count"));
        }
        if unsigned.outputs.iter().any(|output| output.amount.is_zero()) {
            return Err(malformed("zero output amount"));
        }
        if tx.chain_index(&self.groups) != Some(chain_index) {
            return Err(InvalidBlockReason::TransactionOnWrongChain(tx.id()));
        }
        Ok(())
    }
}

/// Inputs exist, are owned by their keys, are signed, and cover the outputs.
fn check_inputs(tx: &Transaction, flow: &dyn BlockFlow) -> Result<(), InvalidBlockReason> {
    let id = tx.id();
    let mut total_in = U256::zero();
    for (input, signature) in tx.unsigned.inputs.iter().zip(&tx.signatures) {
        let output = flow
            .get_output(&input.output_ref)
            .ok_or(InvalidBlockReason::MissingInput(input.output_ref))?;
        if output.lockup != address_of(&input.public_key) {
            return Err(InvalidBlockReason::InvalidInputOwner(input.output_ref));
        }
        verify_raw(&input.public_key, &id, signature)
            .map_err(|_| InvalidBlockReason::InvalidSignature(id))?;
        total_in = total_in.saturating_add(output.amount);
    }

    let total_out = tx
        .unsigned
        .outputs
        .iter()
        .try_fold(U256::zero(), |acc, output| acc.checked_add(output.amount))
        .ok_or(InvalidBlockReason::InsufficientInputs(id))?;
    if total_in < total_out {
        return Err(InvalidBlockReason::InsufficientInputs(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::domain::errors::InvalidBlockReason;
    use crate::testing::Fixture;
    use primitive_types::U256;
    use sf_02_chain_model::{Block, Transaction, TxOutputRef};
    use sf_03_block_flow::{BlockFlow, FlowError};
    use shared_types::ChainIndex;

    fn transfer_block(
        fx: &Fixture,
        value: u64,
        edit: impl FnOnce(&mut Vec<Transaction>),
    ) -> Block {
        let tx = fx.transfer([7u8; 32], U256::from(value));
        let ci = tx.chain_index(&fx.groups).unwrap();
        let mut txs = vec![tx];
        edit(&mut txs);
        fx.block(ci, txs)
    }

    #[test]
    fn test_valid_transfer() {
        let fx = Fixture::new(3);
        let block = transfer_block(&fx, 100, |_| {});
        fx.validator().validate(&block, fx.flow.as_ref(), fx.now()).unwrap();
    }

    #[test]
    fn test_blocks_validated_together_cannot_both_spend() {
        let fx = Fixture::new(3);
        let validator = fx.validator();
        let to_one = fx.transfer([7u8; 32], U256::from(100u64));
        let to_two = fx.transfer([8u8; 32], U256::from(200u64));
        let spent = to_one.unsigned.inputs[0].output_ref;
        let first = fx.block(to_one.chain_index(&fx.groups).unwrap(), vec![to_one]);
        let second = fx.block(to_two.chain_index(&fx.groups).unwrap(), vec![to_two]);

        // Both pass against the same snapshot of the store.
        validator.validate(&first, fx.flow.as_ref(), fx.now()).unwrap();
        validator.validate(&second, fx.flow.as_ref(), fx.now()).unwrap();

        fx.flow.add_block(first).unwrap();
        let err = fx.flow.add_block(second.clone()).unwrap_err();
        assert_eq!(err, FlowError::InputSpent(spent));
        assert_eq!(
            InvalidBlockReason::from(err),
            InvalidBlockReason::Store(FlowError::InputSpent(spent))
        );
        assert!(!fx.flow.contains(&second.hash()));
        assert_eq!(fx.flow.get_balance(&[8u8; 32]), U256::zero());
    }

    #[test]
    fn test_duplicated_transaction() {
        let fx = Fixture::new(3);
        let block = transfer_block(&fx, 100, |txs| txs.push(txs[0].clone()));
        let id = block.transactions[0].id();
        assert_eq!(
            fx.validator().validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::DuplicateTransaction(id))
        );
    }

    #[test]
    fn test_missing_coinbase() {
        let fx = Fixture::new(2);
        let mut block = fx.block(ChainIndex::new(0, 0), vec![]);
        block.transactions.clear();
        assert_eq!(
            fx.validator().validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::EmptyBlock)
        );

        let mut block = transfer_block(&fx, 10, |_| {});
        block.transactions.pop();
        assert_eq!(
            fx.validator().validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::MissingCoinbase)
        );
    }

    #[test]
    fn test_misplaced_coinbase() {
        let fx = Fixture::new(2);
        let ci = ChainIndex::new(1, 1);
        let extra = Transaction::coinbase(ci, 5, [3u8; 32], U256::one());
        let block = fx.block(ci, vec![extra]);
        assert_eq!(
            fx.validator().validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::MisplacedCoinbase(0))
        );
    }

    #[test]
    fn test_merkle_root_mismatch() {
        let fx = Fixture::new(2);
        let mut block = transfer_block(&fx, 10, |_| {});
        block.transactions.remove(0);
        assert_eq!(
            fx.validator().validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::InvalidMerkleRoot)
        );
    }

    #[test]
    fn test_wrong_coinbase_reward() {
        let fx = Fixture::new(2);
        let mut consensus = fx.consensus.clone();
        consensus.mining_reward = U256::from(5u64);
        let validator = crate::BlockValidator::new(fx.groups, consensus);
        let block = fx.block(ChainIndex::new(0, 1), vec![]);
        assert!(matches!(
            validator.validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::InvalidCoinbaseReward { .. })
        ));
    }

    #[test]
    fn test_transaction_on_wrong_chain() {
        let fx = Fixture::new(3);
        let tx = fx.transfer([7u8; 32], U256::from(10u64));
        let ci = tx.chain_index(&fx.groups).unwrap();
        let other = ChainIndex::new(ci.from.0, (ci.to.0 + 1) % 3);
        let block = fx.block(other, vec![tx]);
        assert!(matches!(
            fx.validator().validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::TransactionOnWrongChain(_))
        ));
    }

    #[test]
    fn test_in_block_double_spend() {
        let fx = Fixture::new(3);
        let first = fx.transfer([7u8; 32], U256::from(10u64));
        let second = fx.transfer([7u8; 32], U256::from(11u64));
        let ci = first.chain_index(&fx.groups).unwrap();
        let block = fx.block(ci, vec![first, second]);
        assert!(matches!(
            fx.validator().validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::DoubleSpend(_))
        ));
    }

    #[test]
    fn test_unknown_input() {
        let fx = Fixture::new(3);
        let block = transfer_block(&fx, 10, |txs| {
            txs[0].unsigned.inputs[0].output_ref = TxOutputRef {
                tx_id: [0x42; 32],
                index: 0,
            };
        });
        assert!(matches!(
            fx.validator().validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::MissingInput(_))
        ));
    }

    #[test]
    fn test_bad_signature() {
        let fx = Fixture::new(3);
        let block = transfer_block(&fx, 10, |txs| txs[0].signatures[0][0] ^= 0xff);
        assert!(matches!(
            fx.validator().validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_overspend() {
        let fx = Fixture::new(3);
        let block = transfer_block(&fx, 10, |txs| {
            let mut unsigned = txs[0].unsigned.clone();
            unsigned.outputs[0].amount = U256::from(1_000_000u64);
            txs[0] = unsigned.sign(&fx.owner);
        });
        assert!(matches!(
            fx.validator().validate_body(&block, fx.flow.as_ref()),
            Err(InvalidBlockReason::InsufficientInputs(_))
        ));
    }

    #[test]
    fn test_spent_output_rejected_after_store() {
        let fx = Fixture::new(3);
        let block = transfer_block(&fx, 10, |_| {});
        let spent = block.transactions[0].clone();
        fx.flow.add_block(block).unwrap();

        let ci = spent.chain_index(&fx.groups).unwrap();
        let replay = fx.block(ci, vec![spent]);
        assert!(matches!(
            fx.validator().validate_body(&replay, fx.flow.as_ref()),
            Err(InvalidBlockReason::MissingInput(_))
        ));
    }
}
