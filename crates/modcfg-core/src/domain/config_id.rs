//! Identity of one configuration file.
//!
//! A mod may own a single configuration (empty category) or several, one per
//! category.  The identity decides where the file lives on disk:
//!
//! ```text
//! ConfigId { mod_reference: "Foo", category: "" }       → configs/Foo.cfg
//! ConfigId { mod_reference: "Foo", category: "Audio" }  → configs/Foo/Audio.cfg
//! ```

use std::fmt;
use std::path::PathBuf;

/// Name of the folder (below the storage root) holding every config file.
pub const CONFIG_FOLDER_NAME: &str = "configs";

/// File extension used for configuration files.
pub const CONFIG_FILE_EXTENSION: &str = "cfg";

/// Identity key for one configuration file: mod reference plus optional
/// category.
///
/// The fields are private so an id cannot change after it has been used as a
/// registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigId {
    mod_reference: String,
    category: String,
}

impl ConfigId {
    /// Creates an id for the given mod and category.
    pub fn new(mod_reference: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            mod_reference: mod_reference.into(),
            category: category.into(),
        }
    }

    /// Creates the id of a mod's single, uncategorised configuration.
    pub fn for_mod(mod_reference: impl Into<String>) -> Self {
        Self::new(mod_reference, "")
    }

    pub fn mod_reference(&self) -> &str {
        &self.mod_reference
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Path of this configuration file relative to the `configs` folder.
    pub fn relative_file_path(&self) -> PathBuf {
        if self.category.is_empty() {
            PathBuf::from(format!("{}.{CONFIG_FILE_EXTENSION}", self.mod_reference))
        } else {
            PathBuf::from(&self.mod_reference)
                .join(format!("{}.{CONFIG_FILE_EXTENSION}", self.category))
        }
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.mod_reference, self.category)
    }
}
