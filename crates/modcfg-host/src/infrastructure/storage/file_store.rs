//! File-backed [`ConfigStore`]: one JSON document per configuration.
//!
//! Documents live under `<root>/configs/`:
//!
//! ```text
//! <root>/configs/Foo.cfg            ConfigId { mod: "Foo", category: "" }
//! <root>/configs/Foo/audio.cfg      ConfigId { mod: "Foo", category: "audio" }
//! ```
//!
//! # Atomic writes
//!
//! Every write goes to a temporary file next to the target (`.Foo.cfg.tmp`),
//! is synced to disk and then renamed over the target.  A crash mid-write
//! leaves either the old document or the new one, never a truncated file;
//! at worst a stale `.tmp` file remains and is overwritten by the next save.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use modcfg_core::domain::CONFIG_FOLDER_NAME;
use modcfg_core::ConfigId;

use crate::application::ports::{ConfigStore, StorageError};

/// Stores configuration documents under a root directory.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    root: PathBuf,
}

impl FileConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Folder holding every configuration document: `<root>/configs`.
    pub fn configuration_folder_path(&self) -> PathBuf {
        self.root.join(CONFIG_FOLDER_NAME)
    }

    /// Full path of the document for `id`.
    pub fn configuration_file_path(&self, id: &ConfigId) -> PathBuf {
        self.configuration_folder_path().join(id.relative_file_path())
    }
}

impl ConfigStore for FileConfigStore {
    fn location(&self, id: &ConfigId) -> PathBuf {
        self.configuration_file_path(id)
    }

    fn read(&self, id: &ConfigId) -> Result<Option<String>, StorageError> {
        let path = self.configuration_file_path(id);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn write(&self, id: &ConfigId, contents: &str) -> Result<PathBuf, StorageError> {
        let path = self.configuration_file_path(id);
        atomic_write(&path, contents.as_bytes())?;
        Ok(path)
    }
}

/// Writes `content` to a sibling temp file, syncs it and renames it over
/// `path`, creating parent directories first.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), StorageError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| StorageError::Io { path, source }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let temp_path = temp_path_for(path);
    let result = File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(content)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, path));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result.map_err(io_err(path))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
