use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;

/// A string key-value medium holding whole serialized collections.
pub trait KeyValueStore {
    /// Value stored under `key`, or `None` if nothing was ever written.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Overwrite the value under `key`.
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;

    /// Directory where diagnostics about this store should be logged.
    fn log_dir(&self) -> Option<&Path> {
        None
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirStore { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        atomic_write(&self.path_for(key), value.as_bytes())
    }

    fn log_dir(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}

/// Process-local store, used by tests and embedders that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given key/value pairs.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        MemoryStore {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw value under `key`, for inspecting what was persisted.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dir_store_missing_key_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = DirStore::new(tmp.path());
        assert_eq!(store.get("todos-v1").unwrap(), None);
    }

    #[test]
    fn dir_store_set_then_get() {
        let tmp = TempDir::new().unwrap();
        let mut store = DirStore::new(tmp.path());
        store.set("todos-v1", "[]").unwrap();
        assert_eq!(store.get("todos-v1").unwrap().as_deref(), Some("[]"));
        assert!(tmp.path().join("todos-v1.json").exists());

        store.set("todos-v1", "[1]").unwrap();
        assert_eq!(store.get("todos-v1").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn dir_store_set_into_missing_dir_fails() {
        let tmp = TempDir::new().unwrap();
        let mut store = DirStore::new(tmp.path().join("nope"));
        assert!(store.set("todos-v1", "[]").is_err());
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::with_entries([("topics-v1", "[]")]);
        assert_eq!(store.raw("topics-v1"), Some("[]"));
        store.set("todos-v1", "[]").unwrap();
        assert_eq!(store.get("todos-v1").unwrap().as_deref(), Some("[]"));
        assert!(store.log_dir().is_none());
    }
}
