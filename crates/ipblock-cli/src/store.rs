//! Persistent key-value configuration store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Configuration store errors
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt config file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Site-wide settings addressed by name
pub trait ConfigStore {
    fn get(&self, name: &str) -> Option<String>;

    /// # Errors
    ///
    /// Fails when the value cannot be persisted.
    fn set(&mut self, name: &str, value: &str) -> Result<(), ConfigStoreError>;

    /// Setting read as a 0/1 flag; missing or unparsable counts as off
    fn flag(&self, name: &str) -> bool {
        self.get(name)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .is_some_and(|v| v != 0)
    }
}

/// Settings kept in memory only
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    values: BTreeMap<String, String>,
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), ConfigStoreError> {
        self.values.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Settings persisted as a flat JSON object; every `set` rewrites the file
#[derive(Debug, Clone)]
pub struct JsonFileConfigStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileConfigStore {
    /// Open `path`, starting empty if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigStoreError> {
        let path = path.as_ref().to_path_buf();

        let values = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| ConfigStoreError::Json {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(ConfigStoreError::Io { path, source }),
        };

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), ConfigStoreError> {
        let json = serde_json::to_string_pretty(&self.values).map_err(|source| ConfigStoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|source| ConfigStoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl ConfigStore for JsonFileConfigStore {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), ConfigStoreError> {
        self.values.insert(name.to_string(), value.to_string());
        self.persist()?;
        tracing::debug!(name, value, path = %self.path.display(), "Config value saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag() {
        let mut store = MemoryConfigStore::default();
        assert!(!store.flag("enableipblocker"));
        store.set("enableipblocker", "1").unwrap();
        assert!(store.flag("enableipblocker"));
        store.set("enableipblocker", "junk").unwrap();
        assert!(!store.flag("enableipblocker"));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut store = JsonFileConfigStore::open(&path).unwrap();
        assert!(store.get("ipblockermessage").is_none());
        store.set("ipblockermessage", "Go away").unwrap();

        let reopened = JsonFileConfigStore::open(&path).unwrap();
        assert_eq!(reopened.get("ipblockermessage").as_deref(), Some("Go away"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonFileConfigStore::open(&path),
            Err(ConfigStoreError::Json { .. })
        ));
    }
}
