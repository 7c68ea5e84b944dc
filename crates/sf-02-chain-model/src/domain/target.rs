//! # Mining Target
//!
//! Compact 4-byte difficulty encoding: one exponent byte followed by a
//! 3-byte big-endian mantissa.
//!
//! ```text
//! value = mantissa * 256^(exponent - 3)
//! ```
//!
//! The target is a ceiling: a higher value is easier. Several encodings can
//! expand to the same value; they stay distinct targets because the bits are
//! part of the header hash. Ordering is by value, then by bits.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{Decode, Encode, FormatError, Reader};
use std::cmp::Ordering;
use std::fmt;

/// Compact difficulty target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    bits: [u8; 4],
}

impl Target {
    /// The easiest representable target, `0xffffff * 2^232`.
    pub const MAX: Target = Target {
        bits: [0x20, 0xff, 0xff, 0xff],
    };

    /// Wrap raw compact bits.
    pub fn from_bits(bits: [u8; 4]) -> Self {
        Self { bits }
    }

    /// Raw compact bits.
    pub fn bits(&self) -> [u8; 4] {
        self.bits
    }

    /// Expanded 256-bit value. Exponents past the 256-bit range saturate.
    pub fn value(&self) -> U256 {
        let exponent = self.bits[0] as usize;
        let mantissa = U256::from_big_endian(&self.bits[1..]);
        if exponent <= 3 {
            mantissa >> (8 * (3 - exponent))
        } else if exponent > 32 {
            U256::MAX
        } else {
            mantissa << (8 * (exponent - 3))
        }
    }

    /// Compact form of `value`. Precision beyond three significant bytes is
    /// truncated, so the result is never easier than `value`.
    pub fn from_value(value: U256) -> Self {
        let size = (value.bits() + 7) / 8;
        let mantissa = if size <= 3 {
            value << (8 * (3 - size))
        } else {
            value >> (8 * (size - 3))
        };
        let m = mantissa.low_u32();
        Self {
            bits: [size as u8, (m >> 16) as u8, (m >> 8) as u8, m as u8],
        }
    }
}

impl Ord for Target {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value()
            .cmp(&other.value())
            .then_with(|| self.bits.cmp(&other.bits))
    }
}

impl PartialOrd for Target {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}{:02x}", self.bits[0], self.bits[1], self.bits[2], self.bits[3])
    }
}

impl Encode for Target {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.bits);
    }
}

impl Decode for Target {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        Ok(Self::from_bits(reader.array::<4>()?))
    }
}
