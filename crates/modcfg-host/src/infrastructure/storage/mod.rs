//! Storage infrastructure: configuration documents and host settings.
//!
//! - `file_store` implements the registry's `ConfigStore` port on top of the
//!   file system, one `.cfg` JSON document per configuration.
//! - `settings` reads the host's own TOML settings file.

pub mod file_store;
pub mod settings;

pub use file_store::FileConfigStore;
pub use settings::{load_settings, HostSettings, SettingsError};
