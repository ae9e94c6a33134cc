//! Codec-neutral raw value tree.
//!
//! # What is a raw value? (for beginners)
//!
//! The value tree (see [`crate::value`]) is *typed*: every node knows which
//! schema property it belongs to.  The on-disk file, on the other hand, is
//! just text.  [`RawValue`] sits in the middle: it is a small tagged tree
//! (null, bool, int, float, string, array, map) that carries no schema
//! information at all.
//!
//! ```text
//! SectionValue  ──serialize──►  RawValue  ──encode_document──►  JSON text
//! SectionValue  ◄─deserialize─  RawValue  ◄─decode_document───  JSON text
//! ```
//!
//! Keeping this intermediate form means schema migration never touches JSON:
//! an old tree is serialized to a `RawValue` and merged into a new tree.

use std::collections::BTreeMap;

/// Ordered map used by [`RawValue::Map`].
///
/// `BTreeMap` keeps keys sorted, so encoded files are stable between saves.
pub type RawMap = BTreeMap<String, RawValue>;

/// A schema-less intermediate value produced by serialize and consumed by
/// deserialize.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<RawValue>),
    Map(RawMap),
}

impl RawValue {
    /// Returns an empty map value.
    pub fn empty_map() -> Self {
        RawValue::Map(RawMap::new())
    }

    /// Returns the map entries when this value is a map.
    pub fn as_map(&self) -> Option<&RawMap> {
        match self {
            RawValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a direct child of a map value.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Short type name used in log messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "bool",
            RawValue::Int(_) => "int",
            RawValue::Float(_) => "float",
            RawValue::String(_) => "string",
            RawValue::Array(_) => "array",
            RawValue::Map(_) => "map",
        }
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::String(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::String(v)
    }
}
