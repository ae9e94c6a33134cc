//! Per-configuration cache of materialized [`ConfigStruct`] snapshots.
//!
//! Entries are keyed by the struct's `TypeId`.  Each entry remembers how to
//! rebuild itself, so the registry can refresh every cached type after a
//! mutation without knowing the concrete types involved.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use modcfg_core::{ConfigStruct, SectionValue};

type Snapshot = Box<dyn Any + Send + Sync>;

struct CachedStruct {
    snapshot: Snapshot,
    rebuild: fn(&SectionValue) -> Snapshot,
}

fn materialize_erased<T: ConfigStruct>(root: &SectionValue) -> Snapshot {
    Box::new(T::materialize(root))
}

/// Cache of materialized structs for one configuration.
#[derive(Default)]
pub struct StructCache {
    entries: HashMap<TypeId, CachedStruct>,
}

impl StructCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the cached snapshot of `T`, if present.
    pub fn get<T: ConfigStruct>(&self) -> Option<T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.snapshot.downcast_ref::<T>())
            .cloned()
    }

    /// Materializes `T` from `root`, stores it and returns a copy.
    pub fn materialize<T: ConfigStruct>(&mut self, root: &SectionValue) -> T {
        let value = T::materialize(root);
        self.entries.insert(
            TypeId::of::<T>(),
            CachedStruct {
                snapshot: Box::new(value.clone()),
                rebuild: materialize_erased::<T>,
            },
        );
        value
    }

    /// Recomputes every cached snapshot from the current tree state.
    pub fn rebuild_all(&mut self, root: &SectionValue) {
        for entry in self.entries.values_mut() {
            entry.snapshot = (entry.rebuild)(root);
        }
    }

    pub fn contains<T: ConfigStruct>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for StructCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
