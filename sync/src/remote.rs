//! Remote store adapter - CRUD plus subscribe against the per-identity
//! ledger document.
//!
//! The document store merges at the document level and replaces at the field
//! level; writers always send the full document shape. Subscriptions are
//! modeled as a cancellable stream of [`SnapshotEvent`]s with an explicit
//! unsubscribe handle, so cleanup on identity loss is a single deterministic
//! call.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tally_engine::LedgerDocument;
use thiserror::Error;
use tokio::sync::mpsc;

/// Failures from the remote document store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Quota or rate-limit exhaustion. Terminal: the write retrier never
    /// retries these automatically.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The service could not be reached or answered with a server error.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The request itself failed (malformed, rejected, undecodable).
    #[error("request failed: {0}")]
    Request(String),
}

impl RemoteError {
    /// Terminal failures are surfaced immediately and never retried.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RemoteError::ResourceExhausted(_))
    }
}

/// One event on a document subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEvent {
    /// The document exists with this content (possibly a partial field set).
    Document(LedgerDocument),
    /// The document does not exist. Ignored by the reconciler; only
    /// bootstrap creates documents.
    Missing,
    /// The subscription reported an error; the stream stays up.
    Error(String),
}

/// A live document subscription.
///
/// Yields [`SnapshotEvent`]s as a [`Stream`]. Dropping the subscription (or
/// calling [`Subscription::unsubscribe`]) deregisters it from the store.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<SnapshotEvent>,
    _guard: SubscriptionGuard,
}

impl Subscription {
    /// Build a subscription from an event channel and a cleanup action run
    /// exactly once on unsubscribe/drop.
    pub fn new(
        events: mpsc::UnboundedReceiver<SnapshotEvent>,
        on_unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            _guard: SubscriptionGuard(Some(Box::new(on_unsubscribe))),
        }
    }

    /// Tear the subscription down. Equivalent to dropping it; provided so
    /// call sites can make cleanup explicit.
    pub fn unsubscribe(self) {}
}

impl Stream for Subscription {
    type Item = SnapshotEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

struct SubscriptionGuard(Option<Box<dyn FnOnce() + Send>>);

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(cleanup) = self.0.take() {
            cleanup();
        }
    }
}

/// CRUD plus subscribe against the per-identity ledger document.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the document, `Ok(None)` if it does not exist.
    async fn get_document(&self, identity_id: &str)
        -> Result<Option<LedgerDocument>, RemoteError>;

    /// Write the document. With `merge`, fields absent from `document` are
    /// left untouched; present fields are replaced wholesale.
    async fn set_document(
        &self,
        identity_id: &str,
        document: &LedgerDocument,
        merge: bool,
    ) -> Result<(), RemoteError>;

    /// Open a snapshot subscription for the identity's document.
    fn subscribe(&self, identity_id: &str) -> Subscription;
}

/// A remote write as observed by [`MemoryRemote`].
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub identity_id: String,
    pub document: LedgerDocument,
}

struct Watcher {
    identity_id: String,
    sender: mpsc::UnboundedSender<SnapshotEvent>,
}

/// In-process document store with snapshot fan-out.
///
/// Backs the test suite and offline development: documents live in memory,
/// every acknowledged write is echoed to subscribers of that identity (as the
/// real backend does), and failures can be scripted per write/read.
#[derive(Default)]
pub struct MemoryRemote {
    documents: DashMap<String, LedgerDocument>,
    watchers: Arc<DashMap<u64, Watcher>>,
    next_watcher_id: AtomicU64,
    fail_writes: Mutex<VecDeque<RemoteError>>,
    fail_reads: Mutex<VecDeque<RemoteError>>,
    writes: Mutex<Vec<WriteRecord>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without notifying subscribers or logging a write.
    pub fn insert_document(&self, identity_id: impl Into<String>, document: LedgerDocument) {
        self.documents.insert(identity_id.into(), document);
    }

    /// Queue errors returned by the next writes, in order.
    pub fn fail_next_writes(&self, errors: impl IntoIterator<Item = RemoteError>) {
        lock(&self.fail_writes).extend(errors);
    }

    /// Queue errors returned by the next reads, in order.
    pub fn fail_next_reads(&self, errors: impl IntoIterator<Item = RemoteError>) {
        lock(&self.fail_reads).extend(errors);
    }

    /// All acknowledged writes, oldest first.
    pub fn writes(&self) -> Vec<WriteRecord> {
        lock(&self.writes).clone()
    }

    pub fn write_count(&self) -> usize {
        lock(&self.writes).len()
    }

    /// Replace the stored document and notify subscribers, as if another
    /// device had written it.
    pub fn push_snapshot(&self, identity_id: &str, document: LedgerDocument) {
        self.documents
            .insert(identity_id.to_string(), document.clone());
        self.notify(identity_id, SnapshotEvent::Document(document));
    }

    /// Deliver a subscription error to subscribers of this identity.
    pub fn emit_error(&self, identity_id: &str, message: impl Into<String>) {
        self.notify(identity_id, SnapshotEvent::Error(message.into()));
    }

    /// Number of live subscriptions.
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    fn notify(&self, identity_id: &str, event: SnapshotEvent) {
        for entry in self.watchers.iter() {
            let watcher = entry.value();
            if watcher.identity_id == identity_id {
                let _ = watcher.sender.send(event.clone());
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn get_document(
        &self,
        identity_id: &str,
    ) -> Result<Option<LedgerDocument>, RemoteError> {
        if let Some(err) = lock(&self.fail_reads).pop_front() {
            return Err(err);
        }

        Ok(self
            .documents
            .get(identity_id)
            .map(|doc| doc.value().clone()))
    }

    async fn set_document(
        &self,
        identity_id: &str,
        document: &LedgerDocument,
        merge: bool,
    ) -> Result<(), RemoteError> {
        if let Some(err) = lock(&self.fail_writes).pop_front() {
            return Err(err);
        }

        let stored = if merge {
            let mut base = self
                .documents
                .get(identity_id)
                .map(|doc| doc.value().clone())
                .unwrap_or_default();
            base.merge_from(document);
            base
        } else {
            document.clone()
        };

        self.documents
            .insert(identity_id.to_string(), stored.clone());
        lock(&self.writes).push(WriteRecord {
            identity_id: identity_id.to_string(),
            document: document.clone(),
        });

        // Echo the acknowledged state to subscribers, the writer included.
        self.notify(identity_id, SnapshotEvent::Document(stored));
        Ok(())
    }

    fn subscribe(&self, identity_id: &str) -> Subscription {
        let (sender, events) = mpsc::unbounded_channel();

        // The current state is delivered immediately, like the real
        // backend's snapshot listener.
        let initial = match self.documents.get(identity_id) {
            Some(doc) => SnapshotEvent::Document(doc.value().clone()),
            None => SnapshotEvent::Missing,
        };
        let _ = sender.send(initial);

        let watcher_id = self.next_watcher_id.fetch_add(1, Ordering::Relaxed);
        self.watchers.insert(
            watcher_id,
            Watcher {
                identity_id: identity_id.to_string(),
                sender,
            },
        );

        let watchers = Arc::clone(&self.watchers);
        Subscription::new(events, move || {
            watchers.remove(&watcher_id);
        })
    }
}
