//! # Transactions
//!
//! UTXO transactions. Inputs name the output they spend and the public key
//! that owns it; every input carries one Ed25519 signature over the
//! transaction id.
//!
//! A transaction's id covers the unsigned part only. Its Merkle leaf covers
//! the full encoding, signatures included.

use primitive_types::U256;
use sf_01_value_codec::Val;
use shared_crypto::{blake3_hash, Ed25519KeyPair};
use shared_types::{
    Address, ChainIndex, Decode, Encode, FormatError, GroupConfig, GroupIndex, Hash, PublicKey,
    Reader, SignatureBytes,
};

/// Address owning a public key.
pub fn address_of(public_key: &PublicKey) -> Address {
    blake3_hash(public_key)
}

/// Group an address belongs to.
pub fn group_of(address: &Address, groups: &GroupConfig) -> GroupIndex {
    GroupIndex(address[31] as usize % groups.groups())
}

/// Pointer to an output of an earlier transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxOutputRef {
    pub tx_id: Hash,
    pub index: u32,
}

/// A spent output plus the key that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub output_ref: TxOutputRef,
    pub public_key: PublicKey,
}

/// Value locked to an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub amount: U256,
    pub lockup: Address,
    pub additional_data: Vec<u8>,
}

/// Script attached to a transaction: opaque bytecode plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub code: Vec<u8>,
    pub args: Vec<Val>,
}

/// The signed-over part of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub script: Option<Script>,
}

impl UnsignedTransaction {
    /// `blake3` of the encoding.
    pub fn id(&self) -> Hash {
        blake3_hash(&self.to_bytes())
    }

    /// Sign every input with `key`.
    pub fn sign(self, key: &Ed25519KeyPair) -> Transaction {
        let signature = *key.sign(&self.id()).as_bytes();
        let signatures = vec![signature; self.inputs.len()];
        Transaction {
            unsigned: self,
            signatures,
        }
    }
}

/// A signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub unsigned: UnsignedTransaction,
    pub signatures: Vec<SignatureBytes>,
}

impl Transaction {
    /// Miner reward paying `reward` to `lockup`. The chain index and
    /// timestamp go into the output's data so every coinbase id is unique.
    pub fn coinbase(chain_index: ChainIndex, timestamp: u64, lockup: Address, reward: U256) -> Self {
        let mut additional_data = Vec::with_capacity(16);
        (chain_index.from.0 as u32).encode(&mut additional_data);
        (chain_index.to.0 as u32).encode(&mut additional_data);
        timestamp.encode(&mut additional_data);
        Self {
            unsigned: UnsignedTransaction {
                inputs: Vec::new(),
                outputs: vec![TxOutput {
                    amount: reward,
                    lockup,
                    additional_data,
                }],
                script: None,
            },
            signatures: Vec::new(),
        }
    }

    /// Transaction id.
    pub fn id(&self) -> Hash {
        self.unsigned.id()
    }

    /// Merkle leaf: `blake3` of the full encoding.
    pub fn leaf_hash(&self) -> Hash {
        blake3_hash(&self.to_bytes())
    }

    /// True when the transaction has the coinbase shape.
    pub fn is_coinbase(&self) -> bool {
        self.unsigned.inputs.is_empty()
            && self.signatures.is_empty()
            && self.unsigned.script.is_none()
            && self.unsigned.outputs.len() == 1
    }

    /// Chain index written into a coinbase output.
    pub fn coinbase_chain_index(&self) -> Option<ChainIndex> {
        let output = self.unsigned.outputs.first()?;
        let mut reader = Reader::new(&output.additional_data);
        let from = reader.u32().ok()?;
        let to = reader.u32().ok()?;
        Some(ChainIndex::new(from as usize, to as usize))
    }

    /// True when a script is attached.
    pub fn has_script(&self) -> bool {
        self.unsigned.script.is_some()
    }

    /// Chain a non-coinbase transaction belongs to: the group of its first
    /// input's owner to the group of its first output's lockup.
    pub fn chain_index(&self, groups: &GroupConfig) -> Option<ChainIndex> {
        let input = self.unsigned.inputs.first()?;
        let output = self.unsigned.outputs.first()?;
        Some(ChainIndex {
            from: group_of(&address_of(&input.public_key), groups),
            to: group_of(&output.lockup, groups),
        })
    }

    /// Outputs paired with the references that will spend them.
    pub fn output_refs(&self) -> impl Iterator<Item = (TxOutputRef, &TxOutput)> {
        let tx_id = self.id();
        self.unsigned
            .outputs
            .iter()
            .enumerate()
            .map(move |(index, output)| {
                (
                    TxOutputRef {
                        tx_id,
                        index: index as u32,
                    },
                    output,
                )
            })
    }
}

impl Encode for TxOutputRef {
    fn encode(&self, out: &mut Vec<u8>) {
        self.tx_id.encode(out);
        self.index.encode(out);
    }
}

impl Decode for TxOutputRef {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            tx_id: reader.array::<32>()?,
            index: reader.u32()?,
        })
    }
}

impl Encode for TxInput {
    fn encode(&self, out: &mut Vec<u8>) {
        self.output_ref.encode(out);
        self.public_key.encode(out);
    }
}

impl Decode for TxInput {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            output_ref: TxOutputRef::decode(reader)?,
            public_key: reader.array::<32>()?,
        })
    }
}

impl Encode for TxOutput {
    fn encode(&self, out: &mut Vec<u8>) {
        self.amount.encode(out);
        self.lockup.encode(out);
        self.additional_data.encode(out);
    }
}

impl Decode for TxOutput {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            amount: U256::decode(reader)?,
            lockup: reader.array::<32>()?,
            additional_data: Vec::<u8>::decode(reader)?,
        })
    }
}

impl Encode for Script {
    fn encode(&self, out: &mut Vec<u8>) {
        self.code.encode(out);
        self.args.encode(out);
    }
}

impl Decode for Script {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            code: Vec::<u8>::decode(reader)?,
            args: Vec::<Val>::decode(reader)?,
        })
    }
}

impl Encode for UnsignedTransaction {
    fn encode(&self, out: &mut Vec<u8>) {
        self.inputs.encode(out);
        self.outputs.encode(out);
        self.script.encode(out);
    }
}

impl Decode for UnsignedTransaction {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            inputs: Vec::<TxInput>::decode(reader)?,
            outputs: Vec::<TxOutput>::decode(reader)?,
            script: Option::<Script>::decode(reader)?,
        })
    }
}

impl Encode for Transaction {
    fn encode(&self, out: &mut Vec<u8>) {
        self.unsigned.encode(out);
        self.signatures.encode(out);
    }
}

impl Decode for Transaction {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            unsigned: UnsignedTransaction::decode(reader)?,
            signatures: Vec::<SignatureBytes>::decode(reader)?,
        })
    }
}
