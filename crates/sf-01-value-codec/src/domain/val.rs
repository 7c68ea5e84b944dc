//! # Val
//!
//! Closed tagged union of script values.
//!
//! ## Tag table
//!
//! | Tag | Type | Payload |
//! |-----|------|---------|
//! | 0 | `Bool` | 1 byte, `0x00` or `0x01` |
//! | 1 | `I256` | 32 bytes, two's complement, big-endian |
//! | 2 | `U256` | 32 bytes, big-endian |
//! | 3 | `ByteVec` | `u32` length ++ bytes |
//! | 4 | `Address` | 32 bytes |
//!
//! The table is part of the wire format. Never reorder it.

use crate::domain::i256::I256;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Decode, Encode, FormatError, Reader};
use std::fmt;

/// Type token of a `Val`, doubling as its serialization tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValType {
    Bool = 0,
    I256 = 1,
    U256 = 2,
    ByteVec = 3,
    Address = 4,
}

impl ValType {
    /// Every type, in tag order.
    pub const ALL: [ValType; 5] = [
        ValType::Bool,
        ValType::I256,
        ValType::U256,
        ValType::ByteVec,
        ValType::Address,
    ];

    /// Serialization tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Look a tag up in the fixed table.
    pub fn from_tag(tag: u8) -> Result<Self, FormatError> {
        Self::ALL
            .get(tag as usize)
            .copied()
            .ok_or(FormatError::InvalidTag { kind: "Val", tag })
    }
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "Bool",
            Self::I256 => "I256",
            Self::U256 => "U256",
            Self::ByteVec => "ByteVec",
            Self::Address => "Address",
        };
        f.write_str(name)
    }
}

/// A script value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Val {
    Bool(bool),
    I256(I256),
    U256(U256),
    ByteVec(Vec<u8>),
    Address(Address),
}

impl Val {
    /// The value's type token.
    pub fn val_type(&self) -> ValType {
        match self {
            Self::Bool(_) => ValType::Bool,
            Self::I256(_) => ValType::I256,
            Self::U256(_) => ValType::U256,
            Self::ByteVec(_) => ValType::ByteVec,
            Self::Address(_) => ValType::Address,
        }
    }

    /// The zero value of a type, as the VM initializes fields.
    pub fn default_of(val_type: ValType) -> Self {
        match val_type {
            ValType::Bool => Self::Bool(false),
            ValType::I256 => Self::I256(I256::ZERO),
            ValType::U256 => Self::U256(U256::zero()),
            ValType::ByteVec => Self::ByteVec(Vec::new()),
            ValType::Address => Self::Address([0u8; 32]),
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I256(v) => write!(f, "{v}i"),
            Self::U256(v) => write!(f, "{v}u"),
            Self::ByteVec(v) => write!(f, "#{}", hex::encode(v)),
            Self::Address(v) => write!(f, "@{}", hex::encode(v)),
        }
    }
}

impl Encode for Val {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.val_type().tag());
        match self {
            Self::Bool(v) => out.push(u8::from(*v)),
            Self::I256(v) => v.into_raw().encode(out),
            Self::U256(v) => v.encode(out),
            Self::ByteVec(v) => v.encode(out),
            Self::Address(v) => v.encode(out),
        }
    }
}

impl Decode for Val {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        match ValType::from_tag(reader.u8()?)? {
            ValType::Bool => match reader.u8()? {
                0 => Ok(Self::Bool(false)),
                1 => Ok(Self::Bool(true)),
                other => Err(FormatError::InvalidBool(other)),
            },
            ValType::I256 => Ok(Self::I256(I256::from_raw(U256::decode(reader)?))),
            ValType::U256 => Ok(Self::U256(U256::decode(reader)?)),
            ValType::ByteVec => Ok(Self::ByteVec(Vec::<u8>::decode(reader)?)),
            ValType::Address => Ok(Self::Address(reader.array::<32>()?)),
        }
    }
}
