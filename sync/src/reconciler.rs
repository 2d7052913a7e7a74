//! Real-time reconciler - consumes the remote snapshot stream and overwrites
//! local state, remote-wins.
//!
//! Every snapshot where the document exists replaces the in-memory value and
//! the cache mirror for each field it carries, including echoes of this
//! device's own writes. There is deliberately no ordering between an
//! in-flight flush and an arriving snapshot: a snapshot may clobber a dirty
//! collection, and a flush that lands may be undone by the next echo. That
//! interleaving is part of the contract, not something to repair here.

use crate::remote::{SnapshotEvent, Subscription};
use crate::service::SessionHandle;
use crate::store::StateStore;
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle on a running reconciler task. Stopping it aborts the consumer and
/// drops the subscription, which deregisters it from the remote store.
pub(crate) struct ReconcilerHandle {
    task: JoinHandle<()>,
}

impl ReconcilerHandle {
    pub(crate) fn stop(&self) {
        self.task.abort();
    }
}

/// Spawn the snapshot consumer for the current session.
pub(crate) fn spawn(
    store: Arc<StateStore>,
    mut subscription: Subscription,
    session: SessionHandle,
) -> ReconcilerHandle {
    let task = tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            if !session.is_live() {
                break;
            }

            match event {
                SnapshotEvent::Document(doc) => {
                    let applied = store.apply_remote(&doc);
                    store.record_snapshot_applied(Utc::now());
                    tracing::debug!(collections = applied.len(), "remote snapshot applied");
                }
                SnapshotEvent::Missing => {
                    tracing::debug!("snapshot for absent document ignored");
                }
                SnapshotEvent::Error(message) => {
                    // Surfaced to the UI; the subscription stays up.
                    tracing::warn!(error = %message, "snapshot subscription error");
                    store.record_sync_error(message);
                }
            }
        }
    });

    ReconcilerHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::remote::{MemoryRemote, RemoteStore};
    use crate::Identity;
    use tally_engine::LedgerDocument;

    fn store() -> Arc<StateStore> {
        Arc::new(StateStore::new(Arc::new(MemoryCache::new()), "tally"))
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn snapshots_overwrite_state() {
        let store = store();
        let remote = MemoryRemote::new();
        let session = SessionHandle::new(Identity::new("uid-1"));

        let handle = spawn(store.clone(), remote.subscribe("uid-1"), session);

        remote.push_snapshot("uid-1", LedgerDocument::default_for("Remote", "r@example.com"));
        settle().await;

        assert_eq!(store.ledger().name, "Remote");
        assert!(store.status().last_sync.is_some());
        handle.stop();
    }

    #[tokio::test]
    async fn error_events_keep_the_stream_alive() {
        let store = store();
        let remote = MemoryRemote::new();
        let session = SessionHandle::new(Identity::new("uid-1"));

        let handle = spawn(store.clone(), remote.subscribe("uid-1"), session);

        remote.emit_error("uid-1", "listen interrupted");
        settle().await;
        assert_eq!(
            store.status().sync_error.as_deref(),
            Some("listen interrupted")
        );

        // A later snapshot still lands and clears the error.
        remote.push_snapshot("uid-1", LedgerDocument::default_for("Back", "b@example.com"));
        settle().await;
        assert_eq!(store.ledger().name, "Back");
        assert_eq!(store.status().sync_error, None);
        handle.stop();
    }

    #[tokio::test]
    async fn missing_document_events_are_ignored() {
        let store = store();
        let remote = MemoryRemote::new();
        let session = SessionHandle::new(Identity::new("uid-1"));

        // No document exists; the initial event is Missing.
        let handle = spawn(store.clone(), remote.subscribe("uid-1"), session);
        settle().await;

        assert_eq!(store.status().last_sync, None);
        assert_eq!(store.ledger().name, "");
        handle.stop();
    }

    #[tokio::test]
    async fn revoked_session_applies_nothing() {
        let store = store();
        let remote = MemoryRemote::new();
        let session = SessionHandle::new(Identity::new("uid-1"));

        let handle = spawn(store.clone(), remote.subscribe("uid-1"), session.clone());
        session.revoke();

        remote.push_snapshot("uid-1", LedgerDocument::default_for("Late", "l@example.com"));
        settle().await;

        assert_eq!(store.ledger().name, "");
        assert_eq!(store.status().last_sync, None);
        handle.stop();
    }

    #[tokio::test]
    async fn stop_deregisters_the_subscription() {
        let store = store();
        let remote = MemoryRemote::new();
        let session = SessionHandle::new(Identity::new("uid-1"));

        let handle = spawn(store.clone(), remote.subscribe("uid-1"), session);
        settle().await;
        assert_eq!(remote.watcher_count(), 1);

        handle.stop();
        settle().await;
        assert_eq!(remote.watcher_count(), 0);
    }
}
