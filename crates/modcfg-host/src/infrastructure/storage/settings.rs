//! TOML settings of the configuration host.
//!
//! The host reads `HostSettings` from `settings.toml` in the
//! platform-appropriate directory, or from an explicit path:
//! - Windows:  `%APPDATA%\ModConfig\settings.toml`
//! - Linux:    `~/.config/modconfig/settings.toml`
//! - macOS:    `~/Library/Application Support/ModConfig/settings.toml`
//!
//! # Example
//!
//! ```toml
//! [storage]
//! root_dir = "/srv/game"
//!
//! [flush]
//! interval_secs = 10
//! tick_millis = 250
//!
//! [logging]
//! level = "info"
//!
//! [mods]
//! Foo = "1.1.0"
//! Bar = "0.3.2"
//!
//! [[configs]]
//! mod = "Foo"
//! class = "FooConfig"
//! [configs.properties]
//! volume = 0.5
//! ```
//!
//! `[[configs]]` entries declare the configurations the host registers at
//! startup; see `infrastructure::declared_config`.
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "some_fn")]`, so a missing file, a
//! missing section or a missing key all fall back to the same defaults as
//! `HostSettings::default()`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::infrastructure::declared_config::DeclaredConfig;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Settings schema types ─────────────────────────────────────────────────────

/// Top-level host settings stored on disk.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct HostSettings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub flush: FlushSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Loaded mods and their versions, keyed by mod reference.
    #[serde(default)]
    pub mods: BTreeMap<String, String>,
    /// Configurations registered at startup.
    #[serde(default)]
    pub configs: Vec<DeclaredConfig>,
}

/// Where configuration documents are stored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Root under which the `configs/` folder is created.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
}

/// Periodic flush timing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FlushSettings {
    /// Seconds between flushes of dirty configurations.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// How often the flush driver polls the schedule, in milliseconds.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `tracing` filter used when `RUST_LOG` is unset, e.g. `"info"` or
    /// `"modcfg_host=debug"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl FlushSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Poll period of the driver; never zero.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_interval_secs() -> u64 {
    10
}
fn default_tick_millis() -> u64 {
    250
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
        }
    }
}

impl Default for FlushSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            tick_millis: default_tick_millis(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Settings repository ───────────────────────────────────────────────────────

/// Resolves the default settings file path in the platform config directory.
///
/// # Errors
///
/// Returns [`SettingsError::NoPlatformConfigDir`] if the base directory cannot
/// be determined from the environment.
pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    platform_config_dir()
        .map(|dir| dir.join("settings.toml"))
        .ok_or(SettingsError::NoPlatformConfigDir)
}

/// Loads settings from `path`, returning `HostSettings::default()` if the file
/// does not exist yet.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system errors other than "not
/// found", and [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings(path: &Path) -> Result<HostSettings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostSettings::default()),
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ModConfig"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("modconfig"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ModConfig")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_default_flush_interval_is_ten_seconds() {
        let settings = HostSettings::default();
        assert_eq!(settings.flush.interval(), Duration::from_secs(10));
        assert_eq!(settings.flush.tick(), Duration::from_millis(250));
    }

    #[test]
    fn test_default_log_level_is_info() {
        assert_eq!(HostSettings::default().logging.level, "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings: HostSettings = toml::from_str("").expect("deserialize empty");
        assert_eq!(settings, HostSettings::default());
    }

    #[test]
    fn test_partial_flush_section_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[flush]
interval_secs = 3

[mods]
Foo = "1.1.0"
"#;

        // Act
        let settings: HostSettings = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(settings.flush.interval_secs, 3);
        assert_eq!(settings.flush.tick_millis, 250);
        assert_eq!(settings.mods.get("Foo").map(String::as_str), Some("1.1.0"));
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let flush = FlushSettings {
            interval_secs: 1,
            tick_millis: 0,
        };
        assert_eq!(flush.tick(), Duration::from_millis(1));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("modcfg_settings_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_settings(&path);

        assert!(matches!(result, Err(SettingsError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::env::temp_dir()
            .join(format!("modcfg_settings_{}", Uuid::new_v4()))
            .join("settings.toml");
        assert_eq!(load_settings(&path).unwrap(), HostSettings::default());
    }

    #[test]
    fn test_load_reads_declared_configs_from_file() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("modcfg_settings_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(
            &path,
            r#"
[storage]
root_dir = "/srv/game"

[[configs]]
mod = "Foo"
category = "audio"
class = "FooAudioConfig"
[configs.properties]
volume = 0.5

[[configs]]
mod = "Bar"
class = "BarConfig"
revision = 3
"#,
        )
        .unwrap();

        // Act
        let settings = load_settings(&path).unwrap();

        // Assert
        assert_eq!(settings.storage.root_dir, PathBuf::from("/srv/game"));
        assert_eq!(settings.configs.len(), 2);
        assert_eq!(settings.configs[0].category, "audio");
        assert_eq!(
            settings.configs[0].properties.get("volume"),
            Some(&toml::Value::Float(0.5))
        );
        assert_eq!(settings.configs[1].revision, 3);
        assert!(settings.configs[1].properties.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_default_settings_path_ends_with_settings_toml() {
        if let Ok(path) = default_settings_path() {
            assert!(path.ends_with("settings.toml"), "got {path:?}");
        }
    }
}
