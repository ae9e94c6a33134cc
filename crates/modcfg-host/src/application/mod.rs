//! Application layer of the configuration host.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The application layer sits between the pure data model in `modcfg_core`
//! (schemas, value trees, the JSON codec) and the infrastructure that talks
//! to the disk and the mod loader.
//!
//! Code in this layer:
//!
//! - **Orchestrates** the core types to fulfil a lifecycle step ("load this
//!   config", "flush everything that changed").
//! - **Depends on traits** ([`ports::ConfigStore`], [`ports::ModLoader`]) so
//!   tests can drive it with mocks and hosts can plug in their own storage.
//! - **Never touches the file system** itself.
//!
//! # Sub-modules
//!
//! - **`registry`** – [`registry::ConfigRegistry`], the owner of every
//!   registered configuration and its pending-save set.
//!
//! - **`flush`** – The fixed-period schedule deciding when dirty configs are
//!   written.
//!
//! - **`struct_cache`** – Per-config cache of materialized structs.
//!
//! - **`ports`** – Storage and mod-loader traits implemented by
//!   `infrastructure`.

pub mod flush;
pub mod ports;
pub mod registry;
pub mod struct_cache;
