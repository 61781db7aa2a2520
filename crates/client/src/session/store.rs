//! Key-value backends for the persisted session.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Minimal string key-value store.
///
/// Values are opaque serialized strings; the session layer decides what
/// goes in them.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read a value, `None` if the key was never written or was removed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backend cannot be read.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backend cannot be written.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
///
/// The directory is created on first write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "herool-store-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("usuario").unwrap(), None);

        store.set("usuario", "{}").unwrap();
        assert_eq!(store.get("usuario").unwrap().as_deref(), Some("{}"));

        store.remove("usuario").unwrap();
        store.remove("usuario").unwrap();
        assert_eq!(store.get("usuario").unwrap(), None);
    }

    #[test]
    fn test_file_store_creates_directory() {
        let dir = scratch_dir("create");
        let store = FileStore::new(dir.join("nested"));

        assert_eq!(store.get("usuario").unwrap(), None);
        store.set("usuario", r#"{"id":1}"#).unwrap();
        assert!(dir.join("nested").join("usuario.json").exists());
        assert_eq!(
            store.get("usuario").unwrap().as_deref(),
            Some(r#"{"id":1}"#)
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_store_remove_is_idempotent() {
        let dir = scratch_dir("remove");
        let store = FileStore::new(&dir);

        store.remove("usuario").unwrap();
        store.set("usuario", "x").unwrap();
        store.remove("usuario").unwrap();
        store.remove("usuario").unwrap();
        assert_eq!(store.get("usuario").unwrap(), None);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
