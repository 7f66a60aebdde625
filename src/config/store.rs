//! Grouped key/value store backed by a TOML document
//!
//! Each top-level table is a named group. Typed views are deserialized
//! from a group on demand; single entries can be read, written and deleted
//! for state that is persisted at runtime (session layouts).

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub struct ConfigStore {
    path: Option<PathBuf>,
    doc: toml::Table,
    dirty: bool,
}

impl ConfigStore {
    /// Store that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: toml::Table::new(),
            dirty: false,
        }
    }

    /// Parse a document without a backing file
    pub fn parse(content: &str) -> Result<Self> {
        let doc: toml::Table = content.parse().context("Failed to parse config")?;
        Ok(Self {
            path: None,
            doc,
            dirty: false,
        })
    }

    /// Open a store backed by `path`; a missing file is an empty store
    pub fn open(path: &Path) -> Result<Self> {
        let mut store = Self {
            path: Some(path.to_path_buf()),
            doc: toml::Table::new(),
            dirty: false,
        };
        store.reparse()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-read the backing file, dropping unsynced changes
    pub fn reparse(&mut self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if !path.exists() {
            debug!("Config {} does not exist, using defaults", path.display());
            self.doc = toml::Table::new();
            self.dirty = false;
            return Ok(());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        self.doc = content
            .parse()
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        self.dirty = false;
        info!("Loaded config: {}", path.display());
        Ok(())
    }

    /// Write pending changes back to the file
    pub fn sync(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = self.path.as_ref() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
            let content = toml::to_string(&self.doc).context("Failed to serialize config")?;
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write config file: {}", path.display()))?;
            info!("Config written: {}", path.display());
        }
        self.dirty = false;
        Ok(())
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.doc.get(group).map_or(false, |v| v.is_table())
    }

    pub fn group(&self, group: &str) -> Option<&toml::Table> {
        self.doc.get(group)?.as_table()
    }

    /// Deserialize a whole group; missing or malformed groups give defaults
    pub fn typed_group<T>(&self, group: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let Some(table) = self.group(group) else {
            return T::default();
        };
        match toml::Value::Table(table.clone()).try_into() {
            Ok(value) => value,
            Err(e) => {
                warn!("Malformed config group [{}]: {}, using defaults", group, e);
                T::default()
            }
        }
    }

    pub fn key_list(&self, group: &str) -> Vec<String> {
        self.group(group)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn read_entry<T: DeserializeOwned>(&self, group: &str, key: &str) -> Option<T> {
        let value = self.group(group)?.get(key)?.clone();
        match value.try_into() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Malformed config entry {}.{}: {}", group, key, e);
                None
            }
        }
    }

    pub fn write_entry(&mut self, group: &str, key: &str, value: impl Into<toml::Value>) {
        let table = self
            .doc
            .entry(group.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if !table.is_table() {
            warn!("Config [{}] is not a table, replacing it", group);
            *table = toml::Value::Table(toml::Table::new());
        }
        if let toml::Value::Table(table) = table {
            table.insert(key.to_string(), value.into());
            self.dirty = true;
        }
    }

    pub fn delete_entry(&mut self, group: &str, key: &str) -> bool {
        let removed = self
            .doc
            .get_mut(group)
            .and_then(|v| v.as_table_mut())
            .and_then(|t| t.remove(key))
            .is_some();
        if removed {
            self.dirty = true;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_round_trip_in_memory() {
        let mut store = ConfigStore::in_memory();
        store.write_entry("Layout", "LayoutDefaultGlobal", 2i64);
        assert_eq!(store.read_entry::<u32>("Layout", "LayoutDefaultGlobal"), Some(2));
        assert_eq!(store.key_list("Layout"), vec!["LayoutDefaultGlobal"]);
        assert!(store.delete_entry("Layout", "LayoutDefaultGlobal"));
        assert!(!store.delete_entry("Layout", "LayoutDefaultGlobal"));
        assert!(store.key_list("Missing").is_empty());
    }

    #[test]
    fn test_wrong_type_reads_none() {
        let store = ConfigStore::parse("[Keyboard]\nRepeatRate = \"fast\"\n").unwrap();
        assert_eq!(store.read_entry::<u32>("Keyboard", "RepeatRate"), None);
        assert_eq!(
            store.read_entry::<String>("Keyboard", "RepeatRate").as_deref(),
            Some("fast")
        );
    }

    #[test]
    fn test_sync_and_reparse() {
        let dir = std::env::temp_dir().join(format!("inputcore-store-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = std::fs::remove_file(&path);

        let mut store = ConfigStore::open(&path).unwrap();
        assert!(!store.has_group("Layout"));
        store.write_entry("Layout", "SwitchMode", "Desktop");
        store.sync().unwrap();

        let reopened = ConfigStore::open(&path).unwrap();
        assert_eq!(
            reopened.read_entry::<String>("Layout", "SwitchMode").as_deref(),
            Some("Desktop")
        );

        store.write_entry("Layout", "SwitchMode", "Window");
        store.reparse().unwrap();
        assert_eq!(
            store.read_entry::<String>("Layout", "SwitchMode").as_deref(),
            Some("Desktop")
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
