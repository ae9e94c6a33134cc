//! ConfigRegistry: lifecycle of every registered mod configuration.
//!
//! The registry binds each [`ConfigId`] to the schema class it was
//! registered with, the live value tree and a cache of materialized structs.
//! It owns the whole lifecycle:
//!
//! ```text
//! register ──► load (file → tree) ──► edits ──► mark dirty ──► flush (tree → file)
//!     │                                              │
//!     └─ re-register with new class ─► migrate ──────┴─► save immediately
//! ```
//!
//! # Failure policy
//!
//! Loads and saves never hand I/O or parse errors back to the caller.  They
//! are logged, the in-memory tree is left as it was, and the outcome is
//! reported as a [`LoadOutcome`] / [`SaveOutcome`].  The only `Err` the
//! registry returns is [`RegistryError`] for asking about an id that was
//! never registered, or for an edit that does not fit the schema.
//!
//! A failed save is **not** re-queued.  The config only gets written again
//! if something marks it dirty again or another save path runs.
//!
//! # Threading
//!
//! The registry is a plain value mutated through `&mut self`.  Hosts that
//! drive it from several tasks wrap it in a mutex (see
//! `infrastructure::flush_driver`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use modcfg_core::{
    classify_class_change, decode_document, encode_document, ClassChange, ConfigId, ConfigStruct,
    ConfigValue, SchemaClass, SectionValue, ValueError, MOD_VERSION_FIELD,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::flush::FlushSchedule;
use super::ports::{ConfigStore, ModLoader};
use super::struct_cache::StructCache;

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The id was never passed to `register_mod_configuration`.
    #[error("configuration {0} is not registered")]
    NotRegistered(ConfigId),

    /// An edit would break the schema shape of the value tree.
    #[error("invalid edit of configuration {id}: {source}")]
    InvalidValue {
        id: ConfigId,
        #[source]
        source: ValueError,
    },
}

/// What `register_mod_configuration` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// First registration of this id: a default tree was created.
    Created,
    /// Same class registered again: nothing changed, nothing written.
    Unchanged,
    /// The class changed and the existing values were migrated and saved.
    Migrated(ClassChange),
}

/// Result of loading one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No file exists; schema defaults stay in memory.
    Defaults,
    /// No file existed; defaults were written.
    DefaultsSaved(SaveOutcome),
    /// File read and merged into the tree.
    Loaded,
    /// File read and merged, then rewritten because its mod version stamp
    /// was out of date.
    Refreshed(SaveOutcome),
    /// Read or parse failure; the tree is unchanged.
    Failed,
}

/// Result of saving one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written(PathBuf),
    Failed,
}

/// Totals of one flush of the pending-save set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub saved: usize,
    pub failed: usize,
}

impl FlushReport {
    /// Number of save attempts (= file writes tried).
    pub fn attempted(&self) -> usize {
        self.saved + self.failed
    }
}

/// Everything the registry holds for one [`ConfigId`].
#[derive(Debug)]
pub struct RegisteredConfigurationData {
    config_id: ConfigId,
    schema_class: Arc<SchemaClass>,
    root: SectionValue,
    struct_cache: StructCache,
}

impl RegisteredConfigurationData {
    fn new(config_id: ConfigId, schema_class: Arc<SchemaClass>) -> Self {
        let root = schema_class.root_section().create_value();
        Self {
            config_id,
            schema_class,
            root,
            struct_cache: StructCache::new(),
        }
    }

    pub fn config_id(&self) -> &ConfigId {
        &self.config_id
    }

    pub fn schema_class(&self) -> &Arc<SchemaClass> {
        &self.schema_class
    }

    pub fn root(&self) -> &SectionValue {
        &self.root
    }

    fn reinitialize_cached_structs(&mut self) {
        self.struct_cache.rebuild_all(&self.root);
    }
}

/// Registry of mod configurations with deferred, batched persistence.
pub struct ConfigRegistry {
    store: Box<dyn ConfigStore>,
    mod_loader: Arc<dyn ModLoader>,
    /// Entries in registration order.
    configurations: Vec<RegisteredConfigurationData>,
    index: HashMap<ConfigId, usize>,
    /// Dirty ids in the order they were first marked.
    pending_saves: Vec<ConfigId>,
    flush_schedule: FlushSchedule,
}

impl ConfigRegistry {
    /// Creates an empty registry flushing dirty configs every `flush_interval`
    /// once [`ConfigRegistry::on_timer_available`] has been called.
    pub fn new(
        store: Box<dyn ConfigStore>,
        mod_loader: Arc<dyn ModLoader>,
        flush_interval: Duration,
    ) -> Self {
        Self {
            store,
            mod_loader,
            configurations: Vec::new(),
            index: HashMap::new(),
            pending_saves: Vec::new(),
            flush_schedule: FlushSchedule::new(flush_interval),
        }
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Registers `schema_class` for `config_id`.
    ///
    /// A first registration builds a default tree; nothing is read or written
    /// (call [`ConfigRegistry::load_configuration`] for that).  Registering an
    /// id again with the identical class is a no-op.  Any other class is
    /// migrated via [`ConfigRegistry::replace_configuration_class`]; unrelated
    /// classes log a warning first.
    pub fn register_mod_configuration(
        &mut self,
        config_id: ConfigId,
        schema_class: Arc<SchemaClass>,
    ) -> RegistrationOutcome {
        if schema_class.root_section().get(MOD_VERSION_FIELD).is_some() {
            warn!(
                "Configuration {} declares reserved property {}; it cannot be saved",
                config_id, MOD_VERSION_FIELD
            );
        }

        let Some(&slot) = self.index.get(&config_id) else {
            debug!(
                config = %config_id,
                class = %schema_class.path_name(),
                "registering configuration"
            );
            self.index.insert(config_id.clone(), self.configurations.len());
            self.configurations
                .push(RegisteredConfigurationData::new(config_id, schema_class));
            return RegistrationOutcome::Created;
        };

        let change = classify_class_change(&self.configurations[slot].schema_class, &schema_class);
        if change == ClassChange::Identical {
            debug!(config = %config_id, "configuration already registered with this class");
            return RegistrationOutcome::Unchanged;
        }
        if change.is_compatible() {
            info!(
                "Hot reloading configuration {} with class {}",
                config_id,
                schema_class.path_name()
            );
        } else {
            warn!(
                "Replacing configuration {} with new class {}",
                config_id,
                schema_class.path_name()
            );
        }
        self.replace_slot_class(slot, schema_class);
        RegistrationOutcome::Migrated(change)
    }

    /// Swaps the schema class of an existing registration.
    ///
    /// The current values are serialized, a fresh tree is created from the
    /// new class and the snapshot is merged into it: fields whose name and
    /// kind still match keep their values, the rest is dropped.  Cached
    /// structs are rebuilt and the result is written straight to storage,
    /// bypassing the pending-save set.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for an unknown id.
    pub fn replace_configuration_class(
        &mut self,
        config_id: &ConfigId,
        new_schema_class: Arc<SchemaClass>,
    ) -> Result<SaveOutcome, RegistryError> {
        let slot = self.slot(config_id)?;
        Ok(self.replace_slot_class(slot, new_schema_class))
    }

    fn replace_slot_class(&mut self, slot: usize, new_schema_class: Arc<SchemaClass>) -> SaveOutcome {
        let data = &mut self.configurations[slot];

        let snapshot = data.root.serialize();
        let mut root = new_schema_class.root_section().create_value();
        root.deserialize(&snapshot);

        data.root = root;
        data.schema_class = new_schema_class;
        data.reinitialize_cached_structs();

        self.save_slot(slot)
    }

    // ── Load / save ───────────────────────────────────────────────────────────

    /// Loads the stored document of `config_id` into its value tree.
    ///
    /// - No document: defaults stay; they are written when
    ///   `save_on_schema_change` is set.
    /// - Document present: merged into the tree.  If the mod is loaded and
    ///   the stored version stamp differs from the mod's version, the file is
    ///   rewritten when `save_on_schema_change` is set.
    /// - Read or parse failure: logged, tree unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for an unknown id.
    pub fn load_configuration(
        &mut self,
        config_id: &ConfigId,
        save_on_schema_change: bool,
    ) -> Result<LoadOutcome, RegistryError> {
        let slot = self.slot(config_id)?;
        Ok(self.load_slot(slot, save_on_schema_change))
    }

    fn load_slot(&mut self, slot: usize, save_on_schema_change: bool) -> LoadOutcome {
        let config_id = self.configurations[slot].config_id.clone();
        let path = self.store.location(&config_id);

        let text = match self.store.read(&config_id) {
            Ok(Some(text)) => text,
            Ok(None) => {
                if save_on_schema_change {
                    return LoadOutcome::DefaultsSaved(self.save_slot(slot));
                }
                debug!(config = %config_id, "no configuration file, using defaults");
                return LoadOutcome::Defaults;
            }
            Err(e) => {
                error!("Failed to load configuration file from {}: {e}", path.display());
                return LoadOutcome::Failed;
            }
        };

        let document = match decode_document(&text) {
            Ok(document) => document,
            Err(e) => {
                error!("Failed to parse configuration file {}: {e}", path.display());
                return LoadOutcome::Failed;
            }
        };

        let data = &mut self.configurations[slot];
        data.root.deserialize(&document.values);
        data.reinitialize_cached_structs();
        info!("Successfully loaded configuration from {}", path.display());

        if let Some(mod_version) = self.loaded_mod_version(config_id.mod_reference()) {
            if save_on_schema_change && document.mod_version.as_deref() != Some(mod_version.as_str()) {
                warn!("Refreshing configuration file {}", path.display());
                return LoadOutcome::Refreshed(self.save_slot(slot));
            }
        }
        LoadOutcome::Loaded
    }

    /// Writes the current tree of `config_id` to storage, stamped with the
    /// mod's version when the mod is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for an unknown id.  Write
    /// failures are reported as [`SaveOutcome::Failed`].
    pub fn save_configuration(&self, config_id: &ConfigId) -> Result<SaveOutcome, RegistryError> {
        let slot = self.slot(config_id)?;
        Ok(self.save_slot(slot))
    }

    fn save_slot(&self, slot: usize) -> SaveOutcome {
        let data = &self.configurations[slot];
        let mod_version = self.loaded_mod_version(data.config_id.mod_reference());

        let text = match encode_document(&data.root.serialize(), mod_version.as_deref()) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode configuration {}: {e}", data.config_id);
                return SaveOutcome::Failed;
            }
        };

        match self.store.write(&data.config_id, &text) {
            Ok(path) => {
                info!("Saved configuration to {}", path.display());
                SaveOutcome::Written(path)
            }
            Err(e) => {
                error!("Failed to save configuration file: {e}");
                SaveOutcome::Failed
            }
        }
    }

    /// Loads every registered configuration in registration order.
    pub fn reload_mod_configurations(
        &mut self,
        save_on_schema_change: bool,
    ) -> Vec<(ConfigId, LoadOutcome)> {
        info!("Reloading mod configurations...");
        (0..self.configurations.len())
            .map(|slot| {
                let outcome = self.load_slot(slot, save_on_schema_change);
                (self.configurations[slot].config_id.clone(), outcome)
            })
            .collect()
    }

    // ── Struct cache ──────────────────────────────────────────────────────────

    /// Returns the current values of `config_id` as a `T`.
    ///
    /// The first call for a given `T` materializes it from the tree and caches
    /// it; later calls copy the cached snapshot.  The snapshot is rebuilt
    /// every time the config is marked dirty, loaded or migrated.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for an unknown id.
    pub fn fill_configuration_struct<T: ConfigStruct>(
        &mut self,
        config_id: &ConfigId,
    ) -> Result<T, RegistryError> {
        let slot = self.slot(config_id)?;
        let data = &mut self.configurations[slot];
        if let Some(cached) = data.struct_cache.get::<T>() {
            return Ok(cached);
        }
        Ok(data.struct_cache.materialize::<T>(&data.root))
    }

    /// Whether a snapshot of `T` is cached for `config_id`.
    pub fn has_cached_struct<T: ConfigStruct>(&self, config_id: &ConfigId) -> bool {
        self.entry(config_id)
            .map(|data| data.struct_cache.contains::<T>())
            .unwrap_or(false)
    }

    // ── Mutation & dirty tracking ─────────────────────────────────────────────

    /// Queues `config_id` for the next flush and refreshes its cached structs.
    ///
    /// Marking an id that is already queued keeps its original position.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for an unknown id.
    pub fn mark_configuration_dirty(&mut self, config_id: &ConfigId) -> Result<(), RegistryError> {
        let slot = self.slot(config_id)?;
        if !self.pending_saves.contains(config_id) {
            self.pending_saves.push(config_id.clone());
        }
        self.configurations[slot].reinitialize_cached_structs();
        Ok(())
    }

    /// Applies `edit` to the value tree and marks the config dirty.
    ///
    /// The edit is all-or-nothing: if it returns `Err`, the tree is restored
    /// to its state before the call and the config is not marked.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for an unknown id and
    /// [`RegistryError::InvalidValue`] carrying the edit's own error.
    pub fn update_configuration<R>(
        &mut self,
        config_id: &ConfigId,
        edit: impl FnOnce(&mut SectionValue) -> Result<R, ValueError>,
    ) -> Result<R, RegistryError> {
        let slot = self.slot(config_id)?;
        let root = &mut self.configurations[slot].root;
        let before = root.clone();
        let result = match edit(root) {
            Ok(result) => result,
            Err(source) => {
                *root = before;
                return Err(RegistryError::InvalidValue {
                    id: config_id.clone(),
                    source,
                });
            }
        };
        self.mark_configuration_dirty(config_id)?;
        Ok(result)
    }

    /// Sets the property at a dotted `path` and marks the config dirty.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for an unknown id and
    /// [`RegistryError::InvalidValue`] if the value does not fit the schema;
    /// a rejected edit leaves the config clean.
    pub fn set_configuration_value(
        &mut self,
        config_id: &ConfigId,
        path: &str,
        value: ConfigValue,
    ) -> Result<(), RegistryError> {
        let slot = self.slot(config_id)?;
        self.configurations[slot]
            .root
            .set_path(path, value)
            .map_err(|source| RegistryError::InvalidValue {
                id: config_id.clone(),
                source,
            })?;
        self.mark_configuration_dirty(config_id)
    }

    /// Saves every dirty configuration and empties the pending set.
    ///
    /// The set is taken out before any save runs, so a mark made after this
    /// point is kept for the next flush.  Failed saves are not re-queued.
    pub fn flush_pending_saves(&mut self) -> FlushReport {
        let pending = std::mem::take(&mut self.pending_saves);
        let mut report = FlushReport::default();
        if pending.is_empty() {
            return report;
        }

        debug!(count = pending.len(), "flushing pending configuration saves");
        for config_id in &pending {
            let Some(&slot) = self.index.get(config_id) else {
                continue;
            };
            match self.save_slot(slot) {
                SaveOutcome::Written(_) => report.saved += 1,
                SaveOutcome::Failed => report.failed += 1,
            }
        }
        report
    }

    /// Alias of [`ConfigRegistry::flush_pending_saves`] for hosts.
    pub fn flush_now(&mut self) -> FlushReport {
        self.flush_pending_saves()
    }

    /// Arms the periodic flush; called once the host's timer is ready.
    pub fn on_timer_available(&mut self, now: Instant) {
        self.flush_schedule.arm(now);
        if self.flush_schedule.is_armed() {
            debug!(period = ?self.flush_schedule.period(), "periodic configuration flush armed");
        } else {
            warn!(
                period = ?self.flush_schedule.period(),
                "flush period out of range; dirty configurations are only saved on exit"
            );
        }
    }

    /// Flushes when the periodic deadline has passed; `None` otherwise.
    pub fn flush_due(&mut self, now: Instant) -> Option<FlushReport> {
        self.flush_schedule
            .poll(now)
            .then(|| self.flush_pending_saves())
    }

    /// Exit hook: runs the same flush as the periodic timer.
    pub fn on_exit(&mut self) -> FlushReport {
        self.flush_pending_saves()
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn is_registered(&self, config_id: &ConfigId) -> bool {
        self.index.contains_key(config_id)
    }

    /// Registered ids in registration order.
    pub fn registered_ids(&self) -> impl Iterator<Item = &ConfigId> {
        self.configurations.iter().map(|data| &data.config_id)
    }

    /// Full registration entry of `config_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for an unknown id.
    pub fn entry(&self, config_id: &ConfigId) -> Result<&RegisteredConfigurationData, RegistryError> {
        let slot = self.slot(config_id)?;
        Ok(&self.configurations[slot])
    }

    /// Current value tree of `config_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for an unknown id.
    pub fn root_value(&self, config_id: &ConfigId) -> Result<&SectionValue, RegistryError> {
        self.entry(config_id).map(RegisteredConfigurationData::root)
    }

    /// Schema class `config_id` is currently registered with.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for an unknown id.
    pub fn schema_class(&self, config_id: &ConfigId) -> Result<&Arc<SchemaClass>, RegistryError> {
        self.entry(config_id).map(RegisteredConfigurationData::schema_class)
    }

    pub fn is_pending_save(&self, config_id: &ConfigId) -> bool {
        self.pending_saves.contains(config_id)
    }

    /// Dirty ids in the order they will be flushed.
    pub fn pending_saves(&self) -> &[ConfigId] {
        &self.pending_saves
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn slot(&self, config_id: &ConfigId) -> Result<usize, RegistryError> {
        self.index
            .get(config_id)
            .copied()
            .ok_or_else(|| RegistryError::NotRegistered(config_id.clone()))
    }

    fn loaded_mod_version(&self, mod_reference: &str) -> Option<String> {
        if !self.mod_loader.is_mod_loaded(mod_reference) {
            return None;
        }
        self.mod_loader.mod_version(mod_reference)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
