//! # Wire Codec
//!
//! Bit-exact big-endian encoding shared by headers, blocks, transactions and
//! script values.
//!
//! ## Layout
//!
//! | Type | Encoding |
//! |------|----------|
//! | `u8` | 1 byte |
//! | `u32`, `u64` | fixed-width big-endian |
//! | `[u8; N]` | `N` raw bytes |
//! | `U256` | 32 bytes big-endian |
//! | `Vec<T>` | `u32` count ++ items |
//! | `Option<T>` | `0x00` or `0x01 ++ T` |
//!
//! Decoding never allocates more than the remaining input can justify.

use crate::entities::U256;
use crate::errors::FormatError;

/// Append a value's wire form to a buffer.
pub trait Encode {
    /// Write `self` at the end of `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Wire form as a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

/// Read a value's wire form.
pub trait Decode: Sized {
    /// Read one value from the reader's current position.
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError>;

    /// Decode a complete buffer. Trailing bytes are an error.
    fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut reader = Reader::new(bytes);
        let value = Self::decode(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }
}

/// Cursor over an input buffer.
#[derive(Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Consume exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < n {
            return Err(FormatError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consume a fixed-size array.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Consume one byte.
    pub fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    /// Consume a big-endian `u32`.
    pub fn u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_be_bytes(self.array::<4>()?))
    }

    /// Consume a big-endian `u64`.
    pub fn u64(&mut self) -> Result<u64, FormatError> {
        Ok(u64::from_be_bytes(self.array::<8>()?))
    }

    /// Consume a `u32` length and check it against the remaining input,
    /// assuming every item occupies at least `min_item_size` bytes.
    pub fn length(&mut self, min_item_size: usize) -> Result<usize, FormatError> {
        let declared = self.u32()? as usize;
        if declared.saturating_mul(min_item_size.max(1)) > self.remaining() {
            return Err(FormatError::LengthOverflow {
                declared,
                remaining: self.remaining(),
            });
        }
        Ok(declared)
    }

    /// Fail if any input is left.
    pub fn finish(&self) -> Result<(), FormatError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(FormatError::TrailingBytes(n)),
        }
    }
}

impl Encode for u8 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }
}

impl Decode for u8 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        reader.u8()
    }
}

impl Encode for u32 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }
}

impl Decode for u32 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        reader.u32()
    }
}

impl Encode for u64 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }
}

impl Decode for u64 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        reader.u64()
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        reader.array::<N>()
    }
}

impl Encode for U256 {
    fn encode(&self, out: &mut Vec<u8>) {
        let mut bytes = [0u8; 32];
        self.to_big_endian(&mut bytes);
        out.extend_from_slice(&bytes);
    }
}

impl Decode for U256 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        Ok(U256::from_big_endian(reader.take(32)?))
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        (self.len() as u32).encode(out);
        for item in self {
            item.encode(out);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        let len = reader.length(1)?;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(T::decode(reader)?);
        }
        Ok(items)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            None => out.push(0),
            Some(value) => {
                out.push(1);
                value.encode(out);
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        match reader.u8()? {
            0 => Ok(None),
            1 => Ok(Some(T::decode(reader)?)),
            tag => Err(FormatError::InvalidTag {
                kind: "Option",
                tag,
            }),
        }
    }
}
