//! Scalar value representation.
//!
//! A scalar is a closed tagged union: either an integer or a string.
//! The kind is inferred from the input text when the value is written,
//! and integers are rendered back in canonical decimal form on read, so
//! `"007"` round-trips as `"7"`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind tag of a stored scalar.
///
/// Serialized as `"D"` (integer) and `"S"` (string) in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    #[serde(rename = "D")]
    Integer,
    #[serde(rename = "S")]
    String,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Integer => f.write_str("integer"),
            Kind::String => f.write_str("string"),
        }
    }
}

/// A stored scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ScalarRecord", from = "ScalarRecord")]
pub enum ScalarValue {
    Integer(i64),
    String(String),
}

impl ScalarValue {
    /// Infers the kind from `text`: anything that parses as an `i64` is
    /// stored as an integer, everything else verbatim as a string.
    pub fn parse(text: &str) -> Self {
        match text.parse::<i64>() {
            Ok(n) => ScalarValue::Integer(n),
            Err(_) => ScalarValue::String(text.to_string()),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            ScalarValue::Integer(_) => Kind::Integer,
            ScalarValue::String(_) => Kind::String,
        }
    }

    /// Returns the canonical text rendering of the value.
    pub fn render(&self) -> String {
        match self {
            ScalarValue::Integer(n) => n.to_string(),
            ScalarValue::String(s) => s.clone(),
        }
    }
}

/// Flat on-disk shape of a scalar: both payload fields are always present
/// and the tag selects which one is meaningful.
#[derive(Debug, Serialize, Deserialize)]
struct ScalarRecord {
    value_type: Kind,
    #[serde(default)]
    string_value: String,
    #[serde(default)]
    int_value: i64,
}

impl From<ScalarValue> for ScalarRecord {
    fn from(value: ScalarValue) -> Self {
        match value {
            ScalarValue::Integer(n) => ScalarRecord {
                value_type: Kind::Integer,
                string_value: String::new(),
                int_value: n,
            },
            ScalarValue::String(s) => ScalarRecord {
                value_type: Kind::String,
                string_value: s,
                int_value: 0,
            },
        }
    }
}

impl From<ScalarRecord> for ScalarValue {
    fn from(record: ScalarRecord) -> Self {
        match record.value_type {
            Kind::Integer => ScalarValue::Integer(record.int_value),
            Kind::String => ScalarValue::String(record.string_value),
        }
    }
}
