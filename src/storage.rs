//! Durable key-value storage for editor state.
//!
//! The playground persists two logical keys: the current source text and the
//! attached JSON fixtures. The host may be a browser shell, a desktop app,
//! or the bundled CLI, so everything above this module talks to the
//! [`KeyValueStore`] trait. Storage failures are never fatal: reads fall
//! back to "absent", writes log and continue.

use std::collections::HashMap;
use std::path::PathBuf;

/// Store key for the current script source text.
pub const SOURCE_KEY: &str = "playground.source";
/// Store key for the fixture list (JSON array of document strings).
pub const FIXTURES_KEY: &str = "playground.fixtures";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

impl KeyValueStore for Box<dyn KeyValueStore> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key)
    }
}

/// In-memory store, used in tests and as a null store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Directory-backed store: one file per key.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are dotted identifiers; anything path-like is flattened.
        let name: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            log::warn!("storage: cannot create {:?}: {e}", self.dir);
            return;
        }
        let path = self.path_for(key);
        if let Err(e) = std::fs::write(&path, value) {
            log::warn!("storage: cannot write {path:?}: {e}");
        }
    }

    fn remove(&mut self, key: &str) {
        let path = self.path_for(key);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("storage: cannot remove {path:?}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get(SOURCE_KEY).is_none());

        store.set(SOURCE_KEY, "let p = point(1.0, 2.0);");
        assert_eq!(store.get(SOURCE_KEY).as_deref(), Some("let p = point(1.0, 2.0);"));

        store.remove(SOURCE_KEY);
        assert!(store.get(SOURCE_KEY).is_none());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("geoplay-store-{}", std::process::id()));
        let mut store = FileStore::new(dir.clone());

        store.set(FIXTURES_KEY, "[\"{}\"]");
        assert_eq!(store.get(FIXTURES_KEY).as_deref(), Some("[\"{}\"]"));

        store.remove(FIXTURES_KEY);
        assert!(store.get(FIXTURES_KEY).is_none());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_key_flattening() {
        let store = FileStore::new(PathBuf::from("/tmp/x"));
        let path = store.path_for("a/b\\c.key");
        assert_eq!(path, PathBuf::from("/tmp/x/a_b_c.key"));
    }

    #[test]
    fn test_file_store_missing_key_is_absent() {
        let store = FileStore::new(std::env::temp_dir().join("geoplay-store-missing"));
        assert!(store.get("nope").is_none());
    }
}
