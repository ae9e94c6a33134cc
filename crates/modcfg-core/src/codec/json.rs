//! JSON mapping for raw values and configuration documents.
//!
//! Document format (UTF-8 JSON object):
//! ```text
//! {
//!   "SML_ModVersion_DoNotChange": "1.1.0",   ← reserved, written by the store
//!   "volume": 0.5,                           ← one field per root property
//!   "audio": { "device": "hdmi" }
//! }
//! ```
//! The reserved version field is split off on decode and never reaches the
//! value tree.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::raw::{RawMap, RawValue};

/// Reserved root field storing the version of the mod that last wrote the file.
pub const MOD_VERSION_FIELD: &str = "SML_ModVersion_DoNotChange";

/// Errors that can occur while encoding or decoding a configuration document.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The text is not valid JSON.
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document root is valid JSON but not an object.
    #[error("document root must be an object, got {0}")]
    NotAnObject(&'static str),

    /// NaN and infinities have no JSON representation.
    #[error("float value {0} cannot be represented in JSON")]
    NonFiniteFloat(f64),

    /// A root property uses the name reserved for the version stamp.
    #[error("root property `{0}` is reserved for the mod version stamp")]
    ReservedField(&'static str),
}

/// A decoded configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    /// Root map of property values, without the reserved version field.
    pub values: RawValue,
    /// Version stamp, present only when the field exists and is a string.
    pub mod_version: Option<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Converts a raw value into a JSON value.
///
/// # Errors
///
/// Returns [`CodecError::NonFiniteFloat`] if the tree contains NaN or an
/// infinity.
pub fn raw_to_json(raw: &RawValue) -> Result<Value, CodecError> {
    Ok(match raw {
        RawValue::Null => Value::Null,
        RawValue::Bool(v) => Value::Bool(*v),
        RawValue::Int(v) => Value::Number(Number::from(*v)),
        RawValue::Float(v) => {
            Value::Number(Number::from_f64(*v).ok_or(CodecError::NonFiniteFloat(*v))?)
        }
        RawValue::String(v) => Value::String(v.clone()),
        RawValue::Array(items) => {
            Value::Array(items.iter().map(raw_to_json).collect::<Result<_, _>>()?)
        }
        RawValue::Map(map) => Value::Object(map_to_json(map)?),
    })
}

/// Converts a JSON value into a raw value.
///
/// Integers that fit `i64` become [`RawValue::Int`]; every other number
/// becomes [`RawValue::Float`].
pub fn json_to_raw(json: &Value) -> RawValue {
    match json {
        Value::Null => RawValue::Null,
        Value::Bool(v) => RawValue::Bool(*v),
        Value::Number(n) => match n.as_i64() {
            Some(i) => RawValue::Int(i),
            None => RawValue::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(v) => RawValue::String(v.clone()),
        Value::Array(items) => RawValue::Array(items.iter().map(json_to_raw).collect()),
        Value::Object(map) => RawValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_raw(v)))
                .collect(),
        ),
    }
}

/// Encodes a root map as document text, stamping `mod_version` when given.
///
/// # Errors
///
/// Returns [`CodecError::NotAnObject`] if `values` is not a map,
/// [`CodecError::ReservedField`] if it already holds [`MOD_VERSION_FIELD`],
/// or [`CodecError::NonFiniteFloat`] for unrepresentable floats.
pub fn encode_document(values: &RawValue, mod_version: Option<&str>) -> Result<String, CodecError> {
    let map = values
        .as_map()
        .ok_or(CodecError::NotAnObject(values.type_name()))?;
    if map.contains_key(MOD_VERSION_FIELD) {
        return Err(CodecError::ReservedField(MOD_VERSION_FIELD));
    }
    let mut object = map_to_json(map)?;
    if let Some(version) = mod_version {
        object.insert(
            MOD_VERSION_FIELD.to_string(),
            Value::String(version.to_string()),
        );
    }
    Ok(serde_json::to_string_pretty(&Value::Object(object))?)
}

/// Decodes document text into its values and version stamp.
///
/// # Errors
///
/// Returns [`CodecError::Parse`] for malformed JSON and
/// [`CodecError::NotAnObject`] if the root is not an object.
pub fn decode_document(text: &str) -> Result<ConfigDocument, CodecError> {
    let json: Value = serde_json::from_str(text)?;
    let mut values = match json_to_raw(&json) {
        RawValue::Map(map) => map,
        other => return Err(CodecError::NotAnObject(other.type_name())),
    };
    let mod_version = match values.remove(MOD_VERSION_FIELD) {
        Some(RawValue::String(version)) => Some(version),
        _ => None,
    };
    Ok(ConfigDocument {
        values: RawValue::Map(values),
        mod_version,
    })
}

fn map_to_json(map: &RawMap) -> Result<Map<String, Value>, CodecError> {
    map.iter()
        .map(|(k, v)| raw_to_json(v).map(|json| (k.clone(), json)))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
