//! # Schema Versions — Exact Decimal Comparison
//!
//! Schema versions are decimal numbers (`1.0`, `1.2`, `2.15`) compared
//! with exact decimal semantics, never through floating point:
//!
//! - `1.10 == 1.1` (trailing fractional zeros are insignificant)
//! - `1.09 < 1.1`
//! - `1.9 > 1.10` (decimal, not dotted-component ordering)
//!
//! The source text is preserved for display, so a version declared as
//! `"1.10"` renders as `1.10` in error reports while still comparing equal
//! to `1.1`.
//!
//! Unquoted YAML versions arrive as numbers and are read through their
//! shortest decimal rendering; quote a version to keep trailing zeros in
//! the displayed text.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::VersionError;

/// A non-negative decimal schema version.
#[derive(Debug, Clone)]
pub struct SchemaVersion {
    whole: u64,
    /// Fractional digits with trailing zeros removed.
    fraction: String,
    repr: String,
}

impl SchemaVersion {
    /// Parse a decimal version such as `"1"`, `"1.2"` or `".5"`.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let repr = text.trim();
        if repr.is_empty() {
            return Err(VersionError::Empty);
        }

        let (whole_digits, fraction_digits) = match repr.split_once('.') {
            Some((w, f)) => (w, f),
            None => (repr, ""),
        };
        if whole_digits.is_empty() && fraction_digits.is_empty() {
            return Err(VersionError::Malformed(repr.to_string()));
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole_digits) || !all_digits(fraction_digits) {
            return Err(VersionError::Malformed(repr.to_string()));
        }

        let whole = if whole_digits.is_empty() {
            0
        } else {
            whole_digits
                .parse::<u64>()
                .map_err(|_| VersionError::OutOfRange(repr.to_string()))?
        };

        Ok(Self {
            whole,
            fraction: fraction_digits.trim_end_matches('0').to_string(),
            repr: repr.to_string(),
        })
    }

    /// Read a version out of a document value (string or number).
    pub fn from_value(value: &Value) -> Result<Self, VersionError> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => Self::parse(&n.to_string()),
            other => Err(VersionError::NotAVersion(other.to_string())),
        }
    }

    /// The integral part of the version.
    pub fn whole(&self) -> u64 {
        self.whole
    }

    /// The version text as it was written.
    pub fn as_str(&self) -> &str {
        &self.repr
    }
}

impl From<u64> for SchemaVersion {
    fn from(whole: u64) -> Self {
        Self {
            whole,
            fraction: String::new(),
            repr: whole.to_string(),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for SchemaVersion {
    fn eq(&self, other: &Self) -> bool {
        self.whole == other.whole && self.fraction == other.fraction
    }
}

impl Eq for SchemaVersion {}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // With trailing zeros stripped, fractional digit strings order
        // lexicographically exactly as their decimal values do.
        self.whole
            .cmp(&other.whole)
            .then_with(|| self.fraction.cmp(&other.fraction))
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for SchemaVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.whole.hash(state);
        self.fraction.hash(state);
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.repr)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Appending zeros to the fraction never changes the value.
        #[test]
        fn trailing_zeros_preserve_equality(whole in 0u64..10_000, frac in "[0-9]{0,6}", zeros in 0usize..4) {
            let a = SchemaVersion::parse(&format!("{whole}.{frac}")).unwrap();
            let b = SchemaVersion::parse(&format!("{whole}.{frac}{}", "0".repeat(zeros))).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Ordering agrees with exact integer comparison at a fixed scale.
        #[test]
        fn ordering_matches_scaled_integers(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let render = |n: u64| format!("{}.{:03}", n / 1000, n % 1000);
            let va = SchemaVersion::parse(&render(a)).unwrap();
            let vb = SchemaVersion::parse(&render(b)).unwrap();
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }
    }
}
