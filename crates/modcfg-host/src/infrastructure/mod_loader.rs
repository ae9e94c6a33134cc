//! [`ModLoader`] backed by a fixed table of mods.
//!
//! The standalone host has no live mod loader; the set of loaded mods and
//! their versions comes from the `[mods]` table of the settings file.

use std::collections::HashMap;

use crate::application::ports::ModLoader;

/// Mod loader answering from a fixed `mod reference -> version` table.
#[derive(Debug, Clone, Default)]
pub struct StaticModLoader {
    versions: HashMap<String, String>,
}

impl StaticModLoader {
    pub fn new<I, K, V>(mods: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            versions: mods
                .into_iter()
                .map(|(reference, version)| (reference.into(), version.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl ModLoader for StaticModLoader {
    fn is_mod_loaded(&self, mod_reference: &str) -> bool {
        self.versions.contains_key(mod_reference)
    }

    fn mod_version(&self, mod_reference: &str) -> Option<String> {
        self.versions.get(mod_reference).cloned()
    }
}
