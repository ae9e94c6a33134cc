//! Configuration schemas declared by mods.
//!
//! A mod describes its configuration as a tree of named, typed properties.
//! Each property knows its default and can produce a fresh value node, so the
//! registry can always build a value tree that matches the schema exactly:
//!
//! ```text
//! SchemaClass "FooConfig" rev 1
//!  └─ root: SectionSchema
//!       ├─ volume:  Float  (default 1.0)
//!       ├─ enabled: Bool   (default true)
//!       └─ audio:   Section
//!            └─ device: String (default "default")
//! ```
//!
//! # Class revisions
//!
//! A mod that is rebuilt while running (hot reload) publishes a new
//! [`SchemaClass`] with the same name and the revision bumped by one.  The
//! registry treats that as a compatible schema migration; any other change
//! of class for an existing config is logged as incompatible but still
//! migrated best-effort.

use std::sync::Arc;

use crate::raw::RawValue;
use crate::value::{ArrayValue, ConfigValue, SectionValue, ValueKind};

/// Declaration of a single configuration property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySchema {
    Bool { default: bool },
    Int { default: i64 },
    Float { default: f64 },
    String { default: String },
    Array(ArraySchema),
    Section(SectionSchema),
}

/// Declaration of a homogeneous array property.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    /// Schema every element is created from.
    pub element: Box<PropertySchema>,
    /// Default contents, merged element by element into fresh element values.
    pub default: Vec<RawValue>,
}

/// Ordered set of named properties.
///
/// Declaration order is kept so value trees and editors list properties the
/// way the mod declared them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionSchema {
    properties: Vec<(String, PropertySchema)>,
}

impl PropertySchema {
    pub fn bool(default: bool) -> Self {
        PropertySchema::Bool { default }
    }

    pub fn int(default: i64) -> Self {
        PropertySchema::Int { default }
    }

    pub fn float(default: f64) -> Self {
        PropertySchema::Float { default }
    }

    pub fn string(default: impl Into<String>) -> Self {
        PropertySchema::String {
            default: default.into(),
        }
    }

    pub fn array(element: PropertySchema, default: Vec<RawValue>) -> Self {
        PropertySchema::Array(ArraySchema {
            element: Box::new(element),
            default,
        })
    }

    pub fn section(section: SectionSchema) -> Self {
        PropertySchema::Section(section)
    }

    /// Kind of value node this property produces.
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertySchema::Bool { .. } => ValueKind::Bool,
            PropertySchema::Int { .. } => ValueKind::Int,
            PropertySchema::Float { .. } => ValueKind::Float,
            PropertySchema::String { .. } => ValueKind::String,
            PropertySchema::Array(_) => ValueKind::Array,
            PropertySchema::Section(_) => ValueKind::Section,
        }
    }

    /// Constructs a fresh value node holding this property's default.
    pub fn create_value(&self) -> ConfigValue {
        match self {
            PropertySchema::Bool { default } => ConfigValue::Bool(*default),
            PropertySchema::Int { default } => ConfigValue::Int(*default),
            PropertySchema::Float { default } => ConfigValue::Float(*default),
            PropertySchema::String { default } => ConfigValue::String(default.clone()),
            PropertySchema::Array(array) => ConfigValue::Array(array.create_value()),
            PropertySchema::Section(section) => ConfigValue::Section(section.create_value()),
        }
    }
}

impl ArraySchema {
    /// Builds the default array value by merging each default raw element
    /// into a fresh element value.
    pub fn create_value(&self) -> ArrayValue {
        let mut value = ArrayValue::new((*self.element).clone());
        value.deserialize(&RawValue::Array(self.default.clone()));
        value
    }
}

impl SectionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a property, keeping first-declaration order.
    pub fn property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = schema,
            None => self.properties.push((name, schema)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertySchema> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, schema)| schema)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertySchema)> {
        self.properties.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Constructs a fresh section value with every property at its default.
    pub fn create_value(&self) -> SectionValue {
        SectionValue::from_entries(
            self.properties
                .iter()
                .map(|(name, schema)| (name.clone(), schema.create_value())),
        )
    }
}

/// A mod-supplied configuration schema.
///
/// Shared as `Arc<SchemaClass>`: the mod owns it, the registry only keeps a
/// reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaClass {
    name: String,
    revision: u32,
    root: SectionSchema,
}

impl SchemaClass {
    pub fn new(name: impl Into<String>, revision: u32, root: SectionSchema) -> Self {
        Self {
            name: name.into(),
            revision,
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Root section every value tree of this class is created from.
    pub fn root_section(&self) -> &SectionSchema {
        &self.root
    }

    /// Builds the class one revision newer with a new root section, the way a
    /// hot-reloaded mod publishes its updated schema.
    pub fn next_revision(&self, root: SectionSchema) -> Self {
        Self::new(self.name.clone(), self.revision + 1, root)
    }

    /// Fully qualified name used in log messages.
    pub fn path_name(&self) -> String {
        format!("{}#{}", self.name, self.revision)
    }
}

/// How a newly registered class relates to the one already registered for
/// the same config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassChange {
    /// Same class: nothing to migrate.
    Identical,
    /// The old class was superseded by exactly this newer revision.
    HotReload,
    /// Unrelated class: migrated best-effort after a warning.
    Incompatible,
}

impl ClassChange {
    /// Whether the change is considered safe (no warning is logged).
    pub fn is_compatible(self) -> bool {
        !matches!(self, ClassChange::Incompatible)
    }
}

/// Classifies replacing `old` by `new` for an existing registration.
pub fn classify_class_change(old: &Arc<SchemaClass>, new: &Arc<SchemaClass>) -> ClassChange {
    if Arc::ptr_eq(old, new) || (old.name == new.name && old.revision == new.revision) {
        return ClassChange::Identical;
    }
    if old.name == new.name && old.revision.checked_add(1) == Some(new.revision) {
        return ClassChange::HotReload;
    }
    ClassChange::Incompatible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume_schema() -> SectionSchema {
        SectionSchema::new().property("volume", PropertySchema::float(1.0))
    }

    #[test]
    fn test_create_value_uses_defaults() {
        let schema = SectionSchema::new()
            .property("volume", PropertySchema::float(1.0))
            .property("enabled", PropertySchema::bool(true))
            .property("name", PropertySchema::string("player"));

        let value = schema.create_value();

        assert_eq!(value.float("volume"), Some(1.0));
        assert_eq!(value.bool("enabled"), Some(true));
        assert_eq!(value.string("name"), Some("player"));
    }

    #[test]
    fn test_property_replaces_existing_name_in_place() {
        let schema = SectionSchema::new()
            .property("a", PropertySchema::int(1))
            .property("b", PropertySchema::int(2))
            .property("a", PropertySchema::bool(false));

        let names: Vec<_> = schema.properties().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(schema.get("a").map(PropertySchema::kind), Some(ValueKind::Bool));
    }

    #[test]
    fn test_array_default_is_materialized_into_elements() {
        let schema = PropertySchema::array(
            PropertySchema::int(0),
            vec![RawValue::Int(4), RawValue::Int(8)],
        );

        let ConfigValue::Array(array) = schema.create_value() else {
            panic!("array schema must create an array value");
        };

        assert_eq!(array.len(), 2);
        assert_eq!(array.items()[1], ConfigValue::Int(8));
    }

    #[test]
    fn test_same_class_is_identical() {
        let class = Arc::new(SchemaClass::new("Foo", 1, volume_schema()));
        assert_eq!(
            classify_class_change(&class, &Arc::clone(&class)),
            ClassChange::Identical
        );
    }

    #[test]
    fn test_equal_name_and_revision_is_identical() {
        let a = Arc::new(SchemaClass::new("Foo", 1, volume_schema()));
        let b = Arc::new(SchemaClass::new("Foo", 1, volume_schema()));
        assert_eq!(classify_class_change(&a, &b), ClassChange::Identical);
    }

    #[test]
    fn test_next_revision_is_hot_reload() {
        let old = Arc::new(SchemaClass::new("Foo", 1, volume_schema()));
        let new = Arc::new(old.next_revision(SectionSchema::new()));
        assert_eq!(classify_class_change(&old, &new), ClassChange::HotReload);
        assert!(ClassChange::HotReload.is_compatible());
    }

    #[test]
    fn test_skipped_revision_is_incompatible() {
        let old = Arc::new(SchemaClass::new("Foo", 1, volume_schema()));
        let new = Arc::new(SchemaClass::new("Foo", 3, volume_schema()));
        assert_eq!(classify_class_change(&old, &new), ClassChange::Incompatible);
    }

    #[test]
    fn test_other_class_name_is_incompatible() {
        let old = Arc::new(SchemaClass::new("Foo", 1, volume_schema()));
        let new = Arc::new(SchemaClass::new("Bar", 2, volume_schema()));
        assert_eq!(classify_class_change(&old, &new), ClassChange::Incompatible);
        assert!(!ClassChange::Incompatible.is_compatible());
    }
}
