//! Configurations declared in the host settings file.
//!
//! The standalone host has no mods compiling schemas in, so schemas are
//! declared in TOML instead.  Each `[[configs]]` entry names the config and
//! its class, and lists its properties with their defaults; the TOML type of
//! each default becomes the property's kind:
//!
//! ```toml
//! [[configs]]
//! mod = "Foo"
//! category = "audio"        # optional, "" by default
//! class = "FooAudioConfig"
//! revision = 2              # optional, 1 by default
//!
//! [configs.properties]
//! volume = 0.5              # float
//! muted = false             # bool
//! presets = [1, 2, 3]       # array of int
//!
//! [configs.properties.device]
//! name = "default"          # nested section
//! ```
//!
//! Arrays need at least one default element to fix their element kind.

use serde::Deserialize;
use thiserror::Error;

use modcfg_core::{ConfigId, PropertySchema, SchemaClass, SectionSchema, MOD_VERSION_FIELD};

/// Errors in a `[[configs]]` declaration.
#[derive(Debug, Error, PartialEq)]
pub enum DeclarationError {
    /// A root property uses the name reserved for the version stamp.
    #[error("property `{0}` is reserved for the mod version stamp")]
    ReservedProperty(String),

    /// The default has a TOML type with no property kind (datetimes).
    #[error("property `{path}` has unsupported TOML type {found}")]
    UnsupportedType { path: String, found: &'static str },

    /// An empty array gives no element kind.
    #[error("array property `{0}` needs at least one default element")]
    EmptyArray(String),

    /// Array defaults of different kinds.
    #[error("array property `{0}` mixes element types")]
    MixedArray(String),
}

/// One `[[configs]]` entry of the settings file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeclaredConfig {
    #[serde(rename = "mod")]
    pub mod_reference: String,
    #[serde(default)]
    pub category: String,
    pub class: String,
    #[serde(default = "default_revision")]
    pub revision: u32,
    #[serde(default)]
    pub properties: toml::Table,
}

fn default_revision() -> u32 {
    1
}

impl DeclaredConfig {
    pub fn config_id(&self) -> ConfigId {
        ConfigId::new(&self.mod_reference, &self.category)
    }

    /// Builds the schema class described by this entry.
    ///
    /// # Errors
    ///
    /// Returns a [`DeclarationError`] for reserved names, datetimes, empty
    /// arrays and mixed arrays.
    pub fn schema_class(&self) -> Result<SchemaClass, DeclarationError> {
        if self.properties.contains_key(MOD_VERSION_FIELD) {
            return Err(DeclarationError::ReservedProperty(MOD_VERSION_FIELD.to_string()));
        }
        let root = section_from_table(&self.properties, "")?;
        Ok(SchemaClass::new(&self.class, self.revision, root))
    }
}

fn section_from_table(table: &toml::Table, prefix: &str) -> Result<SectionSchema, DeclarationError> {
    table.iter().try_fold(SectionSchema::new(), |section, (name, value)| {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        Ok(section.property(name.as_str(), property_from_toml(value, &path)?))
    })
}

fn property_from_toml(value: &toml::Value, path: &str) -> Result<PropertySchema, DeclarationError> {
    match value {
        toml::Value::Boolean(v) => Ok(PropertySchema::bool(*v)),
        toml::Value::Integer(v) => Ok(PropertySchema::int(*v)),
        toml::Value::Float(v) => Ok(PropertySchema::float(*v)),
        toml::Value::String(v) => Ok(PropertySchema::string(v.as_str())),
        toml::Value::Table(table) => Ok(PropertySchema::section(section_from_table(table, path)?)),
        toml::Value::Array(items) => {
            let first = items
                .first()
                .ok_or_else(|| DeclarationError::EmptyArray(path.to_string()))?;
            let element = property_from_toml(first, path)?;
            let defaults = items
                .iter()
                .map(|item| {
                    let item_schema = property_from_toml(item, path)?;
                    if item_schema.kind() != element.kind() {
                        return Err(DeclarationError::MixedArray(path.to_string()));
                    }
                    Ok(item_schema.create_value().serialize())
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PropertySchema::array(element, defaults))
        }
        toml::Value::Datetime(_) => Err(DeclarationError::UnsupportedType {
            path: path.to_string(),
            found: value.type_str(),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use modcfg_core::{RawValue, ValueKind};

    fn declared(properties: &str) -> DeclaredConfig {
        toml::from_str(&format!(
            "mod = \"Foo\"\nclass = \"FooConfig\"\n[properties]\n{properties}"
        ))
        .expect("deserialize declaration")
    }

    #[test]
    fn test_defaults_for_category_and_revision() {
        let config = declared("volume = 1.0");

        assert_eq!(config.config_id(), ConfigId::for_mod("Foo"));
        assert_eq!(config.revision, 1);
    }

    #[test]
    fn test_toml_types_become_property_kinds() {
        // Arrange
        let config = declared(
            "volume = 0.5\nmuted = false\nlives = 3\nname = \"ada\"\npresets = [1, 2]\n\
             [properties.device]\nid = \"hdmi\"",
        );

        // Act
        let class = config.schema_class().unwrap();
        let root = class.root_section();

        // Assert
        assert_eq!(root.get("volume").map(PropertySchema::kind), Some(ValueKind::Float));
        assert_eq!(root.get("muted").map(PropertySchema::kind), Some(ValueKind::Bool));
        assert_eq!(root.get("lives").map(PropertySchema::kind), Some(ValueKind::Int));
        assert_eq!(root.get("name").map(PropertySchema::kind), Some(ValueKind::String));
        assert_eq!(root.get("presets").map(PropertySchema::kind), Some(ValueKind::Array));
        assert_eq!(root.get("device").map(PropertySchema::kind), Some(ValueKind::Section));
    }

    #[test]
    fn test_defaults_fill_the_value_tree() {
        let class = declared("presets = [1, 2]\n[properties.device]\nid = \"hdmi\"")
            .schema_class()
            .unwrap();

        let tree = class.root_section().create_value();

        assert_eq!(
            tree.array("presets").map(|a| a.serialize()),
            Some(RawValue::Array(vec![RawValue::Int(1), RawValue::Int(2)]))
        );
        assert_eq!(
            tree.section("device").and_then(|d| d.string("id")),
            Some("hdmi")
        );
    }

    #[test]
    fn test_reserved_root_property_is_rejected() {
        let config = declared("SML_ModVersion_DoNotChange = \"mine\"");

        assert_eq!(
            config.schema_class().unwrap_err(),
            DeclarationError::ReservedProperty(MOD_VERSION_FIELD.to_string())
        );
    }

    #[test]
    fn test_empty_array_is_rejected() {
        let err = declared("presets = []").schema_class().unwrap_err();
        assert_eq!(err, DeclarationError::EmptyArray("presets".to_string()));
    }

    #[test]
    fn test_mixed_array_is_rejected() {
        let err = declared("[properties.audio]\npresets = [1, \"two\"]")
            .schema_class()
            .unwrap_err();
        assert_eq!(err, DeclarationError::MixedArray("audio.presets".to_string()));
    }

    #[test]
    fn test_datetime_is_rejected() {
        let err = declared("since = 1979-05-27").schema_class().unwrap_err();
        assert!(matches!(err, DeclarationError::UnsupportedType { .. }));
    }
}
