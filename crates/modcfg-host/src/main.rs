//! Mod configuration host: entry point.
//!
//! Runs a [`ConfigRegistry`] backed by the file system.  The configurations
//! declared under `[[configs]]` in the settings file are registered and
//! loaded at startup, which writes their documents under
//! `<root_dir>/configs/` when missing or outdated.  Dirty configurations are
//! flushed every `flush.interval_secs` seconds, and everything still pending
//! is written when the process receives Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! modcfg-host [OPTIONS]
//!
//! Options:
//!   --settings <PATH>   Settings TOML file [env: MODCFG_SETTINGS]
//!   --root-dir <PATH>   Overrides `storage.root_dir` [env: MODCFG_ROOT_DIR]
//! ```
//!
//! Without `--settings` the platform config directory is used (see
//! `infrastructure::storage::settings`).  A missing settings file means
//! defaults.
//!
//! # Logging
//!
//! `RUST_LOG` wins when set; otherwise the settings file's `logging.level`
//! is used as the `EnvFilter` directive.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use modcfg_host::application::registry::ConfigRegistry;
use modcfg_host::infrastructure::flush_driver::run_flush_driver;
use modcfg_host::infrastructure::mod_loader::StaticModLoader;
use modcfg_host::infrastructure::storage::{load_settings, settings, FileConfigStore};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Mod configuration host.
#[derive(Debug, Parser)]
#[command(
    name = "modcfg-host",
    about = "Persists mod configurations with periodic flushing",
    version
)]
struct Cli {
    /// Path of the settings TOML file.
    #[arg(long, env = "MODCFG_SETTINGS")]
    settings: Option<PathBuf>,

    /// Root directory holding the `configs/` folder.
    #[arg(long, env = "MODCFG_ROOT_DIR")]
    root_dir: Option<PathBuf>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings_path = match cli.settings {
        Some(path) => path,
        None => settings::default_settings_path().context("no --settings path given")?,
    };
    let mut host_settings = load_settings(&settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;
    if let Some(root_dir) = cli.root_dir {
        host_settings.storage.root_dir = root_dir;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&host_settings.logging.level)),
        )
        .init();

    info!("Mod configuration host starting");

    let store = FileConfigStore::new(&host_settings.storage.root_dir);
    info!(
        "configuration folder: {}",
        store.configuration_folder_path().display()
    );
    let mod_loader = StaticModLoader::new(host_settings.mods.clone());
    info!("{} mod(s) known to the loader", mod_loader.len());

    let mut registry = ConfigRegistry::new(
        Box::new(store),
        Arc::new(mod_loader),
        host_settings.flush.interval(),
    );
    for declared in &host_settings.configs {
        let id = declared.config_id();
        let class = declared
            .schema_class()
            .with_context(|| format!("invalid declaration of configuration {id}"))?;
        registry.register_mod_configuration(id, Arc::new(class));
    }
    if host_settings.configs.is_empty() {
        warn!("no configurations declared in {}", settings_path.display());
    }
    let outcomes = registry.reload_mod_configurations(true);
    info!("{} configuration(s) loaded", outcomes.len());
    let registry = Arc::new(Mutex::new(registry));

    // Shutdown flag shared with the flush driver.
    let running = Arc::new(AtomicBool::new(true));

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => error!("failed to listen for shutdown signal: {e}"),
        }
        running_clone.store(false, Ordering::Relaxed);
    });

    info!("Mod configuration host ready.  Press Ctrl-C to exit.");

    let exit_report = run_flush_driver(
        Arc::clone(&registry),
        host_settings.flush.tick(),
        Arc::clone(&running),
    )
    .await;

    info!(
        saved = exit_report.saved,
        failed = exit_report.failed,
        "Mod configuration host stopped"
    );
    Ok(())
}
