//! # modcfg-core
//!
//! Shared building blocks for mod configuration files: identities, schemas,
//! the typed value tree, the codec-neutral raw tree and the JSON codec.
//!
//! This crate performs no I/O.  The registry, storage and scheduling live in
//! `modcfg-host`.
//!
//! # Architecture overview (for beginners)
//!
//! A mod declares *what* its configuration looks like (a schema) and the host
//! keeps *the current values* (a value tree) in sync with a file on disk:
//!
//! - **`domain`** – [`ConfigId`], the `(mod, category)` key that names one
//!   configuration file.
//!
//! - **`schema`** – [`SchemaClass`] and [`PropertySchema`]: the declared tree
//!   of typed properties and their defaults.
//!
//! - **`value`** – [`SectionValue`] and friends: the live values, always the
//!   same shape as the schema they were created from, plus the
//!   [`ConfigStruct`] trait for materializing plain data snapshots.
//!
//! - **`raw`** – [`RawValue`]: a schema-less tagged tree used to move data
//!   between value trees (schema migration) and to and from the file codec.
//!
//! - **`codec`** – JSON text ↔ [`RawValue`], including the reserved mod
//!   version field.

pub mod codec;
pub mod domain;
pub mod raw;
pub mod schema;
pub mod value;

pub use codec::{decode_document, encode_document, CodecError, ConfigDocument, MOD_VERSION_FIELD};
pub use domain::ConfigId;
pub use raw::{RawMap, RawValue};
pub use schema::{
    classify_class_change, ArraySchema, ClassChange, PropertySchema, SchemaClass, SectionSchema,
};
pub use value::{ArrayValue, ConfigStruct, ConfigValue, SectionValue, ValueError, ValueKind};
