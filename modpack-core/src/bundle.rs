//! Bundle data model: source table, registry table and bundle-wide settings

use crate::canon::source_key_for;
use crate::error::BundleError;
use crate::key::LogicalKey;
use modpack_config::HookPolicy;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Package or plain module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Module,
    Package,
}

impl ModuleKind {
    pub fn is_package(&self) -> bool {
        matches!(self, ModuleKind::Package)
    }
}

/// One entry of the registry table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    /// Import-visible key
    pub key: LogicalKey,
    pub kind: ModuleKind,
    /// Enclosing package; `None` for root packages
    pub parent: Option<LogicalKey>,
}

impl RegistryEntry {
    pub fn new(key: LogicalKey, kind: ModuleKind) -> Self {
        let parent = key.parent();
        Self { key, kind, parent }
    }

    pub fn is_package(&self) -> bool {
        self.kind.is_package()
    }
}

/// One embedded source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub key: LogicalKey,
    pub text: String,
    /// File the text was read from, kept for tag comments
    pub origin: Option<PathBuf>,
}

/// Insertion-ordered mapping from source key to source text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTable {
    entries: Vec<SourceEntry>,
    index: HashMap<LogicalKey, usize>,
}

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; gives the key back if it is already present
    pub fn insert(&mut self, key: LogicalKey, text: String) -> Result<(), LogicalKey> {
        self.insert_with_origin(key, text, None)
    }

    pub fn insert_with_origin(
        &mut self,
        key: LogicalKey,
        text: String,
        origin: Option<PathBuf>,
    ) -> Result<(), LogicalKey> {
        if self.index.contains_key(&key) {
            return Err(key);
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(SourceEntry { key, text, origin });
        Ok(())
    }

    pub fn get(&self, key: &LogicalKey) -> Option<&str> {
        self.entry(key).map(|entry| entry.text.as_str())
    }

    pub fn entry(&self, key: &LogicalKey) -> Option<&SourceEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, key: &LogicalKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Insertion-ordered mapping from registry key to entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    index: HashMap<LogicalKey, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; gives it back if its key is already present
    pub fn insert(&mut self, entry: RegistryEntry) -> Result<(), RegistryEntry> {
        if self.index.contains_key(&entry.key) {
            return Err(entry);
        }
        self.index.insert(entry.key.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, key: &LogicalKey) -> Option<&RegistryEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, key: &LogicalKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything an artifact embeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub sources: SourceTable,
    pub registry: Registry,
    pub default_package: Option<LogicalKey>,
    pub hook: HookPolicy,
    /// Marker stem used to derive package source keys
    pub marker: String,
}

impl Bundle {
    /// Root packages, in registry order
    pub fn roots(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.registry
            .iter()
            .filter(|entry| entry.parent.is_none() && entry.is_package())
    }

    /// Key under which `entry`'s source text is stored
    pub fn source_key(&self, entry: &RegistryEntry) -> Result<LogicalKey, BundleError> {
        Ok(source_key_for(&entry.key, entry.kind, &self.marker)?)
    }

    /// Source text of a registry entry
    pub fn source(&self, entry: &RegistryEntry) -> Result<&str, BundleError> {
        let source_key = self.source_key(entry)?;
        match self.sources.get(&source_key) {
            Some(text) => Ok(text),
            None => Err(BundleError::MissingSource {
                key: entry.key.clone(),
                source_key,
            }),
        }
    }

    /// Check every cross-table invariant
    pub fn verify(&self) -> Result<(), BundleError> {
        for entry in self.registry.iter() {
            self.source(entry)?;

            if let Some(parent) = &entry.parent {
                let is_package = self
                    .registry
                    .get(parent)
                    .map(RegistryEntry::is_package)
                    .unwrap_or(false);
                if !is_package {
                    return Err(BundleError::OrphanEntry {
                        key: entry.key.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        if let Some(default) = &self.default_package {
            if !self.roots().any(|root| &root.key == default) {
                return Err(BundleError::UnknownDefault(default.clone()));
            }
        }

        Ok(())
    }
}
