//! Traits the registry depends on, implemented by the infrastructure layer.
//!
//! The registry never touches the file system or the mod loader directly.
//! Both are injected at construction time so the registry is fully
//! unit-testable with mocks.

use std::path::PathBuf;

use modcfg_core::ConfigId;
use thiserror::Error;

/// Error type for configuration storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Backing store for configuration documents.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore: Send + Sync {
    /// Where the document for `id` lives; used in log messages.
    fn location(&self, id: &ConfigId) -> PathBuf;

    /// Reads the document text, or `Ok(None)` when no document exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] for failures other than "not found".
    fn read(&self, id: &ConfigId) -> Result<Option<String>, StorageError>;

    /// Replaces the document atomically, creating parent folders as needed.
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the document could not be written.
    fn write(&self, id: &ConfigId, contents: &str) -> Result<PathBuf, StorageError>;
}

/// Read access to the mod loader's view of installed mods.
#[cfg_attr(test, mockall::automock)]
pub trait ModLoader: Send + Sync {
    /// Whether the mod with this reference is currently loaded.
    fn is_mod_loaded(&self, mod_reference: &str) -> bool;

    /// Declared version of a loaded mod, e.g. `"1.1.0"`.
    fn mod_version(&self, mod_reference: &str) -> Option<String>;
}
