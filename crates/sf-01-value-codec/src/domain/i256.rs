//! Signed 256-bit integer stored as two's-complement bits in a `U256`.

use primitive_types::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Signed 256-bit integer. The wire form is the raw 32-byte two's-complement
/// value, big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct I256(U256);

impl I256 {
    /// Zero.
    pub const ZERO: Self = Self(U256::zero());

    /// Wrap raw two's-complement bits.
    pub fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Raw two's-complement bits.
    pub fn into_raw(self) -> U256 {
        self.0
    }

    /// `-2^255`.
    pub fn min_value() -> Self {
        Self(U256::one() << 255)
    }

    /// `2^255 - 1`.
    pub fn max_value() -> Self {
        Self((U256::one() << 255) - 1)
    }

    /// True when the sign bit is set.
    pub fn is_negative(&self) -> bool {
        self.0.bit(255)
    }

    /// Absolute value as an unsigned magnitude. `min_value()` maps to `2^255`.
    pub fn unsigned_abs(&self) -> U256 {
        if self.is_negative() {
            (!self.0).overflowing_add(U256::one()).0
        } else {
            self.0
        }
    }

    fn negate(magnitude: U256) -> Self {
        Self((!magnitude).overflowing_add(U256::one()).0)
    }
}

impl From<i64> for I256 {
    fn from(value: i64) -> Self {
        if value < 0 {
            Self::negate(U256::from(value.unsigned_abs()))
        } else {
            Self(U256::from(value as u64))
        }
    }
}

impl Ord for I256 {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_negative(), other.is_negative()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            // Same sign: two's-complement bits order like the values.
            _ => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for I256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}", self.unsigned_abs())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for I256 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let magnitude = U256::from_dec_str(digits).map_err(|e| format!("{e:?}"))?;
        let limit = U256::one() << 255;
        if negative {
            if magnitude > limit {
                return Err(format!("{s} is below the I256 range"));
            }
            Ok(Self::negate(magnitude))
        } else {
            if magnitude >= limit {
                return Err(format!("{s} is above the I256 range"));
            }
            Ok(Self(magnitude))
        }
    }
}

impl Serialize for I256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for I256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_one_is_all_ones() {
        let value = I256::from(-1);
        assert_eq!(value.into_raw(), U256::MAX);
        assert!(value.is_negative());
        assert_eq!(value.to_string(), "-1");
    }

    #[test]
    fn test_signed_ordering() {
        let mut values = vec![I256::from(5), I256::from(-7), I256::ZERO, I256::min_value()];
        values.sort();
        assert_eq!(
            values,
            vec![I256::min_value(), I256::from(-7), I256::ZERO, I256::from(5)]
        );
        assert!(I256::max_value() > I256::from(i64::MAX));
    }

    #[test]
    fn test_parse_bounds() {
        let min = format!("-{}", U256::one() << 255);
        assert_eq!(min.parse::<I256>().unwrap(), I256::min_value());
        let over = (U256::one() << 255).to_string();
        assert!(over.parse::<I256>().is_err());
        assert_eq!("-42".parse::<I256>().unwrap(), I256::from(-42));
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let json = serde_json::to_string(&I256::from(-3)).unwrap();
        assert_eq!(json, "\"-3\"");
        let back: I256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, I256::from(-3));
    }
}
