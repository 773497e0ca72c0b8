//! Local key-value storage for session state.
//!
//! Session state is a flat string-to-string map behind `KeyValueStore`.
//! `MemoryStore` keeps it in process and `FileStore` in a JSON file. The
//! keychain-backed store lives in `session::keychain`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use zeroize::Zeroize;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Keychain operation failed: {0}")]
    Keychain(String),
}

/// Asynchronous string key-value storage.
///
/// `remove` and `clear` are idempotent: removing a missing key is not an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every key this store holds.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Zero every value in the map, then empty it.
fn wipe(map: &mut HashMap<String, String>) {
    for value in map.values_mut() {
        value.zeroize();
    }
    map.clear();
}

/// In-process store. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut guard = self.entries.write().await;
        if let Some(mut old) = guard.insert(key.to_string(), value.to_string()) {
            old.zeroize();
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if let Some(mut old) = self.entries.write().await.remove(key) {
            old.zeroize();
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        wipe(&mut *self.entries.write().await);
        Ok(())
    }
}

/// Store persisted as a single JSON object file.
///
/// Every mutation rewrites the whole file. The lock serializes
/// read-modify-write cycles within this process.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// File name used inside the data directory.
    pub const FILE_NAME: &'static str = "session.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `<dir>/session.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        let value = map.remove(key);
        wipe(&mut map);
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        let result = self.save(&map).await;
        wipe(&mut map);
        result
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(key).is_none() {
            return Ok(());
        }
        let result = self.save(&map).await;
        wipe(&mut map);
        result
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("token").await.unwrap(), None);

        store.set("token", "abc123").await.unwrap();
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("abc123"));

        store.set("token", "def456").await.unwrap();
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("def456"));

        store.remove("token").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);

        // Removing again is fine
        store.remove("token").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_clear() {
        let store = MemoryStore::new();
        store.set("token", "abc").await.unwrap();
        store.set("user", "{}").await.unwrap();
        assert_eq!(store.len().await, 2);

        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileStore::in_dir(dir.path());
        store.set("token", "abc123").await.unwrap();
        store.set("id_karyawan", "42").await.unwrap();

        let reopened = FileStore::in_dir(dir.path());
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("abc123"));
        assert_eq!(reopened.get("id_karyawan").await.unwrap().as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.get("token").await.unwrap(), None);
        store.remove("token").await.unwrap();
        store.clear().await.unwrap();

        // First write creates the parent directory
        store.set("remember_me", "true").await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_file_store_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        store.set("token", "abc").await.unwrap();
        assert!(store.path().exists());

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        tokio::fs::write(store.path(), b"not json").await.unwrap();

        let result = store.get("token").await;
        assert!(matches!(result, Err(StoreError::Serde(_))));
    }
}
