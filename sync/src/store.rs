//! State store - the in-memory authoritative holder of the ledger plus sync
//! metadata.
//!
//! Every mutation synchronously mirrors the affected collection to the local
//! cache, so a restart restores the last known state before the remote
//! round-trip completes. All mutation happens under one mutex and never
//! spans an `await`; there is a single logical writer.

use crate::cache::{namespaced_key, LocalCache};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tally_engine::{CollectionKind, CollectionValue, Ledger, LedgerDocument};

/// Sync metadata for the UI. Never persisted remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_loading: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub sync_error: Option<String>,
    pub retry_count: u32,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            is_loading: false,
            last_sync: None,
            sync_error: None,
            retry_count: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    ledger: Ledger,
    status: SyncStatus,
}

/// In-memory state plus its synchronous cache mirror.
pub struct StateStore {
    inner: Mutex<Inner>,
    cache: Arc<dyn LocalCache>,
    cache_prefix: String,
}

impl StateStore {
    pub fn new(cache: Arc<dyn LocalCache>, cache_prefix: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            cache,
            cache_prefix: cache_prefix.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace one collection and mirror it to the cache. Total: this
    /// operation cannot fail; an unserializable value is logged and only the
    /// mirror is skipped.
    pub fn apply(&self, value: CollectionValue) {
        let kind = value.kind();
        self.mirror(kind, &value);
        self.lock().ledger.set_collection(value);
    }

    /// Apply every collection field present in `doc` (remote-wins) and
    /// mirror each applied field. Returns the kinds that were replaced.
    pub fn apply_remote(&self, doc: &LedgerDocument) -> Vec<CollectionKind> {
        let applied = self.lock().ledger.apply_document(doc);
        for kind in &applied {
            let value = self.collection(*kind);
            self.mirror(*kind, &value);
        }
        applied
    }

    /// Seed every collection from the cache. Missing or unreadable entries
    /// are skipped; this is the offline boot fallback, not a source of truth.
    pub fn restore_from_cache(&self) {
        for kind in CollectionKind::ALL {
            let key = namespaced_key(&self.cache_prefix, kind);
            let Some(raw) = self.cache.get(&key) else {
                continue;
            };

            match CollectionValue::from_json(kind, raw) {
                Ok(value) => self.lock().ledger.set_collection(value),
                Err(err) => {
                    tracing::warn!(collection = %kind, error = %err, "skipping unreadable cache entry");
                }
            }
        }
    }

    /// Replace the whole ledger (new session).
    pub fn reset(&self, ledger: Ledger) {
        let mut inner = self.lock();
        inner.ledger = ledger;
        inner.status = SyncStatus::default();
    }

    /// Clone out the full ledger.
    pub fn ledger(&self) -> Ledger {
        self.lock().ledger.clone()
    }

    /// Clone out one collection's current value.
    pub fn collection(&self, kind: CollectionKind) -> CollectionValue {
        self.lock().ledger.collection(kind)
    }

    /// Clone out the sync metadata.
    pub fn status(&self) -> SyncStatus {
        self.lock().status.clone()
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.lock().status.is_loading = is_loading;
    }

    /// A remote write landed: advance `last_sync`, clear the error, reset
    /// the retry counter.
    pub fn record_write_success(&self, now: DateTime<Utc>) {
        let mut inner = self.lock();
        inner.status.last_sync = Some(now);
        inner.status.sync_error = None;
        inner.status.retry_count = 0;
    }

    /// A snapshot was applied: advance `last_sync` and clear the error. The
    /// retry counter belongs to the write path and is left alone.
    pub fn record_snapshot_applied(&self, now: DateTime<Utc>) {
        let mut inner = self.lock();
        inner.status.last_sync = Some(now);
        inner.status.sync_error = None;
    }

    pub fn record_sync_error(&self, message: impl Into<String>) {
        self.lock().status.sync_error = Some(message.into());
    }

    pub fn set_retry_count(&self, retry_count: u32) {
        self.lock().status.retry_count = retry_count;
    }

    fn mirror(&self, kind: CollectionKind, value: &CollectionValue) {
        let key = namespaced_key(&self.cache_prefix, kind);
        match value.to_json() {
            Ok(json) => self.cache.set(&key, json),
            Err(err) => {
                tracing::warn!(collection = %kind, error = %err, "failed to mirror collection");
            }
        }
    }
}
