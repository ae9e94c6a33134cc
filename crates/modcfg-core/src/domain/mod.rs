//! Domain identity types shared by the registry and the storage layer.

pub mod config_id;

pub use config_id::{ConfigId, CONFIG_FILE_EXTENSION, CONFIG_FOLDER_NAME};
