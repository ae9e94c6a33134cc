//! In-memory value tree mirroring a schema.
//!
//! Every registered configuration owns one [`SectionValue`] root built by
//! [`crate::schema::SectionSchema::create_value`].  The tree shape (property
//! names and kinds) is fixed by the schema: setters refuse unknown names and
//! kind changes, so the tree can never drift from the schema it came from.
//!
//! # Serialize / deserialize contract
//!
//! - [`ConfigValue::serialize`] produces a full [`RawValue`] snapshot.
//! - [`ConfigValue::deserialize`] is a *merge*, not a replace:
//!   - keys in the raw map that the section does not declare are ignored;
//!   - declared properties missing from the raw map keep their current value;
//!   - a raw value of the wrong type leaves the node unchanged.
//!
//! This is what makes schema migration best-effort: an old tree serialized
//! and merged into a tree of a newer schema keeps every field whose name and
//! kind still match, and silently drops the rest.

pub mod materialize;

use std::fmt;

use thiserror::Error;
use tracing::trace;

use crate::raw::{RawMap, RawValue};
use crate::schema::PropertySchema;

pub use materialize::ConfigStruct;

/// Kind of a value node; one per [`ConfigValue`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    Array,
    Section,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Section => "section",
        };
        f.write_str(name)
    }
}

/// Errors raised when an edit would break the tree's schema shape.
#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    /// The section does not declare a property with this name.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// The new value has a different kind (or nested shape) than the schema.
    #[error("type mismatch for {property}: expected {expected}, got {found}")]
    TypeMismatch {
        property: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// A dotted path walked through a property that is not a section.
    #[error("path segment {0} is not a section")]
    NotASection(String),
}

/// A node of the value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(ArrayValue),
    Section(SectionValue),
}

impl ConfigValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Int(_) => ValueKind::Int,
            ConfigValue::Float(_) => ValueKind::Float,
            ConfigValue::String(_) => ValueKind::String,
            ConfigValue::Array(_) => ValueKind::Array,
            ConfigValue::Section(_) => ValueKind::Section,
        }
    }

    /// Produces a full raw snapshot of this node.
    pub fn serialize(&self) -> RawValue {
        match self {
            ConfigValue::Bool(v) => RawValue::Bool(*v),
            ConfigValue::Int(v) => RawValue::Int(*v),
            ConfigValue::Float(v) => RawValue::Float(*v),
            ConfigValue::String(v) => RawValue::String(v.clone()),
            ConfigValue::Array(array) => array.serialize(),
            ConfigValue::Section(section) => section.serialize(),
        }
    }

    /// Merges `raw` into this node in place, ignoring anything that does not
    /// fit the node's kind.
    pub fn deserialize(&mut self, raw: &RawValue) {
        match (self, raw) {
            (ConfigValue::Bool(v), RawValue::Bool(r)) => *v = *r,
            (ConfigValue::Int(v), RawValue::Int(r)) => *v = *r,
            (ConfigValue::Int(v), RawValue::Float(r)) if is_integral(*r) => *v = *r as i64,
            (ConfigValue::Float(v), RawValue::Float(r)) => *v = *r,
            (ConfigValue::Float(v), RawValue::Int(r)) => *v = *r as f64,
            (ConfigValue::String(v), RawValue::String(r)) => v.clone_from(r),
            (ConfigValue::Array(array), raw) => array.deserialize(raw),
            (ConfigValue::Section(section), raw) => section.deserialize(raw),
            (node, raw) => trace!(
                expected = %node.kind(),
                found = raw.type_name(),
                "ignoring raw value of mismatched type"
            ),
        }
    }

    /// Whether `other` could replace this node without changing the tree
    /// shape: same kind, and for sections/arrays the same nested layout.
    pub fn shape_matches(&self, other: &ConfigValue) -> bool {
        match (self, other) {
            (ConfigValue::Section(a), ConfigValue::Section(b)) => a.shape_matches(b),
            (ConfigValue::Array(a), ConfigValue::Array(b)) => a.element == b.element,
            (a, b) => a.kind() == b.kind(),
        }
    }
}

fn is_integral(v: f64) -> bool {
    v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64
}

// ── Section ───────────────────────────────────────────────────────────────────

/// A named group of child values, in schema declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionValue {
    entries: Vec<(String, ConfigValue)>,
}

impl SectionValue {
    pub(crate) fn from_entries(entries: impl IntoIterator<Item = (String, ConfigValue)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut ConfigValue> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ConfigValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ConfigValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ConfigValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ConfigValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn section(&self, name: &str) -> Option<&SectionValue> {
        match self.get(name)? {
            ConfigValue::Section(v) => Some(v),
            _ => None,
        }
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut SectionValue> {
        match self.get_mut(name)? {
            ConfigValue::Section(v) => Some(v),
            _ => None,
        }
    }

    pub fn array(&self, name: &str) -> Option<&ArrayValue> {
        match self.get(name)? {
            ConfigValue::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn array_mut(&mut self, name: &str) -> Option<&mut ArrayValue> {
        match self.get_mut(name)? {
            ConfigValue::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Follows a dotted path (`"audio.device"`) through nested sections.
    pub fn lookup(&self, path: &str) -> Option<&ConfigValue> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            match current {
                ConfigValue::Section(section) => current = section.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Replaces the value of a declared property.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnknownProperty`] if `name` is not declared and
    /// [`ValueError::TypeMismatch`] if `value` does not have the declared
    /// shape.
    pub fn set(&mut self, name: &str, value: ConfigValue) -> Result<(), ValueError> {
        let slot = self
            .get_mut(name)
            .ok_or_else(|| ValueError::UnknownProperty(name.to_string()))?;
        if !slot.shape_matches(&value) {
            return Err(ValueError::TypeMismatch {
                property: name.to_string(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Like [`SectionValue::set`] but addressed by a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::NotASection`] when an intermediate segment is not
    /// a section, plus the errors of [`SectionValue::set`].
    pub fn set_path(&mut self, path: &str, value: ConfigValue) -> Result<(), ValueError> {
        match path.split_once('.') {
            None => self.set(path, value),
            Some((head, rest)) => {
                let child = self
                    .get_mut(head)
                    .ok_or_else(|| ValueError::UnknownProperty(head.to_string()))?;
                match child {
                    ConfigValue::Section(section) => section.set_path(rest, value),
                    _ => Err(ValueError::NotASection(head.to_string())),
                }
            }
        }
    }

    pub fn serialize(&self) -> RawValue {
        let map: RawMap = self
            .entries
            .iter()
            .map(|(name, value)| (name.clone(), value.serialize()))
            .collect();
        RawValue::Map(map)
    }

    /// Merges a raw map into this section; see the module docs for the rules.
    pub fn deserialize(&mut self, raw: &RawValue) {
        let Some(map) = raw.as_map() else {
            trace!(found = raw.type_name(), "ignoring non-map value for section");
            return;
        };
        for (name, value) in &mut self.entries {
            if let Some(raw_child) = map.get(name.as_str()) {
                value.deserialize(raw_child);
            }
        }
    }

    fn shape_matches(&self, other: &SectionValue) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|((na, va), (nb, vb))| na == nb && va.shape_matches(vb))
    }
}

// ── Array ─────────────────────────────────────────────────────────────────────

/// A homogeneous list of values created from one element schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    element: PropertySchema,
    items: Vec<ConfigValue>,
}

impl ArrayValue {
    /// Creates an empty array of the given element schema.
    pub fn new(element: PropertySchema) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    pub fn element(&self) -> &PropertySchema {
        &self.element
    }

    pub fn items(&self) -> &[ConfigValue] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends an element.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::TypeMismatch`] if `value` does not match the
    /// element schema's shape.
    pub fn push(&mut self, value: ConfigValue) -> Result<(), ValueError> {
        let template = self.element.create_value();
        if !template.shape_matches(&value) {
            return Err(ValueError::TypeMismatch {
                property: format!("[{}]", self.items.len()),
                expected: template.kind(),
                found: value.kind(),
            });
        }
        self.items.push(value);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<ConfigValue> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn serialize(&self) -> RawValue {
        RawValue::Array(self.items.iter().map(ConfigValue::serialize).collect())
    }

    /// Replaces the contents: each raw element is merged into a fresh element
    /// value created from the element schema.
    pub fn deserialize(&mut self, raw: &RawValue) {
        let RawValue::Array(raw_items) = raw else {
            trace!(found = raw.type_name(), "ignoring non-array value for array");
            return;
        };
        self.items = raw_items
            .iter()
            .map(|raw_item| {
                let mut item = self.element.create_value();
                item.deserialize(raw_item);
                item
            })
            .collect();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SectionSchema;

    fn sample_schema() -> SectionSchema {
        SectionSchema::new()
            .property("volume", PropertySchema::float(1.0))
            .property("count", PropertySchema::int(3))
            .property(
                "audio",
                PropertySchema::section(
                    SectionSchema::new()
                        .property("device", PropertySchema::string("default"))
                        .property("muted", PropertySchema::bool(false)),
                ),
            )
            .property(
                "tags",
                PropertySchema::array(PropertySchema::string(""), vec![RawValue::from("a")]),
            )
    }

    fn raw_map(entries: &[(&str, RawValue)]) -> RawValue {
        RawValue::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_serialize_then_deserialize_restores_tree() {
        // Arrange
        let mut original = sample_schema().create_value();
        original.set("volume", ConfigValue::Float(0.25)).unwrap();
        original.set_path("audio.device", ConfigValue::String("hdmi".into())).unwrap();

        // Act
        let raw = original.serialize();
        let mut restored = sample_schema().create_value();
        restored.deserialize(&raw);

        // Assert
        assert_eq!(original, restored);
    }

    #[test]
    fn test_deserialize_ignores_unknown_keys() {
        let mut value = sample_schema().create_value();

        value.deserialize(&raw_map(&[
            ("volume", RawValue::Float(0.5)),
            ("not_in_schema", RawValue::Bool(true)),
        ]));

        assert_eq!(value.float("volume"), Some(0.5));
        assert!(value.get("not_in_schema").is_none());
    }

    #[test]
    fn test_deserialize_keeps_missing_fields_at_current_value() {
        let mut value = sample_schema().create_value();
        value.set("count", ConfigValue::Int(9)).unwrap();

        value.deserialize(&raw_map(&[("volume", RawValue::Float(0.5))]));

        assert_eq!(value.int("count"), Some(9));
        assert_eq!(value.section("audio").and_then(|s| s.string("device")), Some("default"));
    }

    #[test]
    fn test_deserialize_ignores_mismatched_types() {
        let mut value = sample_schema().create_value();

        value.deserialize(&raw_map(&[
            ("volume", RawValue::from("loud")),
            ("audio", RawValue::Int(3)),
        ]));

        assert_eq!(value.float("volume"), Some(1.0));
        assert_eq!(value.section("audio").and_then(|s| s.bool("muted")), Some(false));
    }

    #[test]
    fn test_numeric_kinds_convert_when_lossless() {
        let mut value = sample_schema().create_value();

        value.deserialize(&raw_map(&[
            ("volume", RawValue::Int(2)),
            ("count", RawValue::Float(7.0)),
        ]));

        assert_eq!(value.float("volume"), Some(2.0));
        assert_eq!(value.int("count"), Some(7));
    }

    #[test]
    fn test_fractional_float_is_not_accepted_as_int() {
        let mut value = sample_schema().create_value();
        value.deserialize(&raw_map(&[("count", RawValue::Float(7.5))]));
        assert_eq!(value.int("count"), Some(3));
    }

    #[test]
    fn test_array_deserialize_replaces_items() {
        let mut value = sample_schema().create_value();

        value.deserialize(&raw_map(&[(
            "tags",
            RawValue::Array(vec![RawValue::from("x"), RawValue::Int(1), RawValue::from("y")]),
        )]));

        let tags = value.array("tags").unwrap();
        // The int element falls back to the element default.
        assert_eq!(
            tags.items(),
            &[
                ConfigValue::String("x".into()),
                ConfigValue::String(String::new()),
                ConfigValue::String("y".into()),
            ]
        );
    }

    #[test]
    fn test_set_rejects_unknown_property() {
        let mut value = sample_schema().create_value();
        let err = value.set("bogus", ConfigValue::Bool(true)).unwrap_err();
        assert_eq!(err, ValueError::UnknownProperty("bogus".into()));
    }

    #[test]
    fn test_set_rejects_kind_change() {
        let mut value = sample_schema().create_value();
        let err = value.set("volume", ConfigValue::Int(1)).unwrap_err();
        assert!(matches!(
            err,
            ValueError::TypeMismatch { expected: ValueKind::Float, found: ValueKind::Int, .. }
        ));
    }

    #[test]
    fn test_set_rejects_section_of_other_shape() {
        let mut value = sample_schema().create_value();
        let other = SectionSchema::new()
            .property("device", PropertySchema::string("x"))
            .create_value();

        assert!(value.set("audio", ConfigValue::Section(other)).is_err());
    }

    #[test]
    fn test_set_path_through_scalar_fails() {
        let mut value = sample_schema().create_value();
        let err = value
            .set_path("volume.inner", ConfigValue::Float(1.0))
            .unwrap_err();
        assert_eq!(err, ValueError::NotASection("volume".into()));
    }

    #[test]
    fn test_lookup_follows_dotted_path() {
        let value = sample_schema().create_value();
        assert_eq!(
            value.lookup("audio.device"),
            Some(&ConfigValue::String("default".into()))
        );
        assert_eq!(value.lookup("audio.missing"), None);
        assert_eq!(value.lookup("volume.x"), None);
    }

    #[test]
    fn test_array_push_checks_element_kind() {
        let mut value = sample_schema().create_value();
        let tags = value.array_mut("tags").unwrap();

        assert!(tags.push(ConfigValue::String("b".into())).is_ok());
        assert!(tags.push(ConfigValue::Bool(true)).is_err());
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.remove(5), None);
    }
}
