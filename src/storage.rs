// =============================================================================
// STORAGE MODULE
// =============================================================================
// Durable key-value blobs: the session fields and optional collection
// snapshots. Every write replaces a whole value; there are no partial patches.
//
// Backends:
// - MemoryStore: tests and throwaway sessions
// - FileStore:   one file per key under a directory
// - RedisStore:  a shared Redis instance
//
// LEARNING NOTE: all three are async. Callers sit inside tokio tasks (a store
// fetch, a login, a 401 on any request), so a blocking socket or disk call
// here would stall a runtime worker for the whole round-trip.
// =============================================================================

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{ClientError, ClientResult};

/// Suffix of the key a collection snapshot lives under (`skus-storage`).
pub const SNAPSHOT_SUFFIX: &str = "-storage";

/// Key of the snapshot for `collection`.
pub fn snapshot_key(collection: &str) -> String {
    format!("{collection}{SNAPSHOT_SUFFIX}")
}

/// String-keyed blob store that survives restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> ClientResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> ClientResult<()>;
}

// -----------------------------------------------------------------------------
// JSON HELPERS
// -----------------------------------------------------------------------------
// "Load on init, save on mutation" against any backend.

/// Reads and decodes the value under `key`. A missing key is `Ok(None)`.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> ClientResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encodes `value` and replaces whatever is stored under `key`.
pub async fn save_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> ClientResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

/// Opens the backend named by a `STORAGE_URL` value.
///
/// # Example
/// ```ignore
/// let kv = open_store("redis://localhost:6379").await?;
/// let kv = open_store("memory").await?;
/// let kv = open_store("/var/lib/catalog-admin").await?;
/// ```
pub async fn open_store(url: &str) -> ClientResult<Arc<dyn KeyValueStore>> {
    if url == "memory" {
        tracing::debug!("Using in-memory storage");
        return Ok(Arc::new(MemoryStore::new()));
    }
    if url.starts_with("redis://") || url.starts_with("rediss://") {
        tracing::debug!("Using Redis storage");
        return Ok(Arc::new(RedisStore::open(url).await?));
    }
    let path = url.strip_prefix("file://").unwrap_or(url);
    tracing::debug!(path = %path, "Using file storage");
    Ok(Arc::new(FileStore::new(path)))
}

// =============================================================================
// MEMORY BACKEND
// =============================================================================
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> ClientResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE BACKEND
// =============================================================================
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> ClientResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(ClientError::Storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.base_path.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let path = self.path_for(key)?;
        tracing::debug!(key, "storage get");
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let path = self.path_for(key)?;
        tracing::debug!(key, size = value.len(), "storage set");
        tokio::fs::create_dir_all(&self.base_path).await?;
        // Write-then-rename so readers never see half a blob
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> ClientResult<()> {
        let path = self.path_for(key)?;
        tracing::debug!(key, "storage remove");
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

// =============================================================================
// REDIS BACKEND
// =============================================================================
// ConnectionManager reconnects on its own and is cheap to clone; each call
// works on a clone so no lock is held across the round-trip.
pub struct RedisStore {
    connection: redis::aio::ConnectionManager,
    prefix: String,
}

impl RedisStore {
    pub async fn open(url: &str) -> ClientResult<Self> {
        let client = redis::Client::open(url)?;
        let connection = redis::aio::ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis");
        Ok(Self {
            connection,
            prefix: "catalog-admin:".to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let value = redis::cmd("GET")
            .arg(self.key(key))
            .query_async::<_, Option<String>>(&mut self.connection.clone())
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .query_async::<_, ()>(&mut self.connection.clone())
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> ClientResult<()> {
        redis::cmd("DEL")
            .arg(self.key(key))
            .query_async::<_, ()>(&mut self.connection.clone())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_file_store_roundtrip_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested"));

        assert_eq!(store.get("token").await.unwrap(), None);
        store.set("token", "abc").await.unwrap();
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("abc"));

        store.set("token", "def").await.unwrap();
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("def"));

        store.remove("token").await.unwrap();
        store.remove("token").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        FileStore::new(temp_dir.path())
            .set("userName", "alice")
            .await
            .unwrap();

        let reopened = FileStore::new(temp_dir.path());
        assert_eq!(reopened.get("userName").await.unwrap().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert!(store.set("../escape", "x").await.is_err());
        assert!(store.get("").await.is_err());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryStore::new();
        let blob = Blob {
            name: "attributes".into(),
            count: 3,
        };
        save_json(&store, "blob", &blob).await.unwrap();
        let loaded: Option<Blob> = load_json(&store, "blob").await.unwrap();
        assert_eq!(loaded, Some(blob));

        let missing: Option<Blob> = load_json(&store, "nope").await.unwrap();
        assert!(missing.is_none());

        store.set("broken", "{not json").await.unwrap();
        assert!(load_json::<Blob>(&store, "broken").await.is_err());
    }

    #[tokio::test]
    async fn test_open_store_memory() {
        let store = open_store("memory").await.unwrap();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_open_store_reports_unreachable_redis() {
        // Nothing listens on port 1
        let err = match open_store("redis://127.0.0.1:1").await {
            Ok(_) => panic!("connected to a closed port"),
            Err(err) => err,
        };
        assert!(matches!(err, ClientError::Storage(_)));
    }

    #[test]
    fn test_snapshot_key() {
        assert_eq!(snapshot_key("skus"), "skus-storage");
    }
}
