//! Local cache adapter - synchronous, best-effort key-value storage.
//!
//! The cache serves two roles: a boot-time fallback when the remote store is
//! unreachable, and a mirror written after every state mutation so a restart
//! restores the last known state before any network round-trip completes.
//!
//! Writes are best-effort by contract: a failed write is logged and dropped,
//! never propagated. There is no transactionality across keys.

use dashmap::DashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tally_engine::CollectionKind;

/// Synchronous get/set of named JSON blobs.
pub trait LocalCache: Send + Sync {
    /// Read a value, `None` if absent or unreadable.
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Write a value. Best-effort; failures are logged, not returned.
    fn set(&self, key: &str, value: serde_json::Value);
}

/// The namespaced cache key for a collection.
pub fn namespaced_key(prefix: &str, kind: CollectionKind) -> String {
    format!("{}_{}", prefix, kind.as_str())
}

/// In-memory cache, used in tests and as a null device for ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, serde_json::Value>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: serde_json::Value) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Durable cache storing one JSON file per key under a directory.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Open a cache rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are engine-controlled (`<prefix>_<collection>`), but sanitize
        // anyway so a hostile key cannot escape the cache directory.
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                // Unreadable entries are treated as absent; the remote copy
                // or a later mirror will repair them.
                tracing::warn!(key, error = %err, "discarding corrupt cache entry");
                None
            }
        }
    }

    fn set(&self, key: &str, value: serde_json::Value) {
        let path = self.path_for(key);
        let encoded = match serde_json::to_vec(&value) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to encode cache entry");
                return;
            }
        };

        if let Err(err) = fs::write(&path, encoded) {
            tracing::warn!(key, error = %err, "failed to write cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn namespaced_keys() {
        assert_eq!(
            namespaced_key("tally", CollectionKind::FixedBills),
            "tally_fixedBills"
        );
    }

    #[test]
    fn memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("missing"), None);

        let value = json!([{"id": 1, "description": "coffee"}]);
        cache.set("tally_expenses", value.clone());
        assert_eq!(cache.get("tally_expenses"), Some(value));
    }

    #[test]
    fn memory_cache_overwrites() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1));
        cache.set("k", json!(2));
        assert_eq!(cache.get("k"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn file_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();

        let value = json!({"currentBalance": 10.5, "transactions": []});
        cache.set("tally_accountBalance", value.clone());
        assert_eq!(cache.get("tally_accountBalance"), Some(value));
    }

    #[test]
    fn file_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = FileCache::new(dir.path()).unwrap();
            cache.set("tally_debts", json!([]));
        }

        let reopened = FileCache::new(dir.path()).unwrap();
        assert_eq!(reopened.get("tally_debts"), Some(json!([])));
    }

    #[test]
    fn file_cache_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        assert_eq!(cache.get("tally_expenses"), None);
    }

    #[test]
    fn file_cache_discards_corrupt_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();

        std::fs::write(dir.path().join("broken.json"), b"not json").unwrap();
        assert_eq!(cache.get("broken"), None);
    }

    #[test]
    fn file_cache_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();

        cache.set("../escape", json!(true));
        assert_eq!(cache.get("../escape"), Some(json!(true)));
        assert!(dir.path().join("___escape.json").exists());
    }
}
