//! Infrastructure layer of the configuration host.
//!
//! Contains the OS-facing adapters: the file-backed config store, the TOML
//! host settings with their declared configurations, the settings-backed
//! mod loader and the tokio task that drives periodic flushing.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `modcfg_core`, but MUST NOT be imported by the `application` layer.

pub mod declared_config;
pub mod flush_driver;
pub mod mod_loader;
pub mod storage;
