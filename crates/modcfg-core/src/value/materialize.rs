//! Plain data structs materialized from a value tree.
//!
//! Walking the value tree on every read is wasteful when gameplay code only
//! wants "the current volume".  Mods instead declare a plain struct and say
//! once how it is filled from the tree; the registry caches the result per
//! struct type and rebuilds it whenever the config is marked dirty.
//!
//! ```rust
//! use modcfg_core::{ConfigStruct, SectionValue};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct AudioSettings {
//!     volume: f64,
//! }
//!
//! impl ConfigStruct for AudioSettings {
//!     fn materialize(root: &SectionValue) -> Self {
//!         Self { volume: root.float("volume").unwrap_or(1.0) }
//!     }
//! }
//! ```

use super::SectionValue;

/// A plain data snapshot of a configuration's value tree.
///
/// Implemented per schema; the mapping is known at compile time.
pub trait ConfigStruct: Clone + Send + Sync + 'static {
    /// Builds the struct from the current state of the root section.
    fn materialize(root: &SectionValue) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertySchema, SectionSchema};
    use crate::value::ConfigValue;

    #[derive(Clone, Debug, PartialEq)]
    struct Limits {
        max_items: i64,
        label: String,
    }

    impl ConfigStruct for Limits {
        fn materialize(root: &SectionValue) -> Self {
            Self {
                max_items: root.int("max_items").unwrap_or_default(),
                label: root.string("label").unwrap_or_default().to_string(),
            }
        }
    }

    #[test]
    fn test_materialize_reads_current_tree_state() {
        let mut root = SectionSchema::new()
            .property("max_items", PropertySchema::int(10))
            .property("label", PropertySchema::string("belt"))
            .create_value();
        root.set("max_items", ConfigValue::Int(25)).unwrap();

        let limits = Limits::materialize(&root);

        assert_eq!(
            limits,
            Limits {
                max_items: 25,
                label: "belt".into()
            }
        );
    }
}
