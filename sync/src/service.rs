//! The sync service - explicit lifecycle object tying the engine together.
//!
//! Constructed once with an injected cache and remote store, then driven by
//! identity transitions: `start(identity)` bootstraps a session and
//! `stop()` tears it down. There is no ambient global state; consumers hold
//! the service (usually in an `Arc`) and call it directly.

use crate::cache::LocalCache;
use crate::error::SyncError;
use crate::identity::Identity;
use crate::reconciler::{self, ReconcilerHandle};
use crate::remote::RemoteStore;
use crate::retrier;
use crate::scheduler::FlushScheduler;
use crate::store::{StateStore, SyncStatus};
use crate::SyncConfig;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tally_engine::{CollectionKind, CollectionValue, Ledger, LedgerDocument};
use tokio::sync::watch;

/// Liveness token for one sync session.
///
/// Every spawned task holds a clone and re-checks it after each await:
/// once the identity changes, work belonging to the old session must neither
/// write remotely nor touch status, even if already in flight.
#[derive(Clone)]
pub(crate) struct SessionHandle {
    pub(crate) identity: Identity,
    live: Arc<AtomicBool>,
}

impl SessionHandle {
    pub(crate) fn new(identity: Identity) -> Self {
        Self {
            identity,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub(crate) fn revoke(&self) {
        self.live.store(false, Ordering::Release);
    }

    fn same_session(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.live, &other.live)
    }
}

struct Session {
    handle: SessionHandle,
    reconciler: Option<ReconcilerHandle>,
}

/// The synchronization engine.
pub struct SyncService {
    store: Arc<StateStore>,
    remote: Arc<dyn RemoteStore>,
    config: SyncConfig,
    scheduler: FlushScheduler,
    session: Mutex<Option<Session>>,
}

impl SyncService {
    /// Build a service over the given adapters.
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn LocalCache>,
        config: SyncConfig,
    ) -> Self {
        let store = Arc::new(StateStore::new(cache, config.cache_prefix.clone()));
        Self {
            store,
            remote,
            config,
            scheduler: FlushScheduler::new(),
            session: Mutex::new(None),
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session_handle(&self) -> Option<SessionHandle> {
        self.lock_session()
            .as_ref()
            .map(|session| session.handle.clone())
    }

    /// Start a session for `identity`: tear down any previous session, seed
    /// state from the local cache, load (or create) the remote document and
    /// start the reconciler.
    ///
    /// Bootstrap failures are recorded in the status for the UI and returned
    /// for callers that care; the session still comes up offline-usable and
    /// `is_loading` is always cleared.
    pub async fn start(&self, identity: Identity) -> Result<(), SyncError> {
        self.stop();

        tracing::info!(identity = %identity.id, "starting sync session");
        let handle = SessionHandle::new(identity.clone());
        *self.lock_session() = Some(Session {
            handle: handle.clone(),
            reconciler: None,
        });

        self.store.reset(Ledger::new(
            identity.display_name.clone().unwrap_or_default(),
            identity.email.clone().unwrap_or_default(),
        ));
        self.store.set_loading(true);
        self.store.restore_from_cache();

        let result = self.bootstrap(&handle).await;

        if handle.is_live() {
            self.store.set_loading(false);

            let subscription = self.remote.subscribe(&handle.identity.id);
            let handle_for_task = handle.clone();
            let reconciler = reconciler::spawn(self.store.clone(), subscription, handle_for_task);

            let mut session = self.lock_session();
            match session.as_mut() {
                Some(current) if current.handle.same_session(&handle) => {
                    current.reconciler = Some(reconciler);
                }
                // A competing start/stop won the race; this session is dead.
                _ => reconciler.stop(),
            }
        }

        result
    }

    async fn bootstrap(&self, session: &SessionHandle) -> Result<(), SyncError> {
        match self.remote.get_document(&session.identity.id).await {
            Ok(Some(doc)) => {
                if !session.is_live() {
                    return Err(SyncError::NoActiveSession);
                }

                let applied = self.store.apply_remote(&doc);
                self.store.record_snapshot_applied(Utc::now());
                tracing::info!(collections = applied.len(), "ledger loaded from remote");
                Ok(())
            }
            Ok(None) => {
                let name = session.identity.display_name.clone().unwrap_or_default();
                let email = session.identity.email.clone().unwrap_or_default();
                let mut doc = LedgerDocument::default_for(&name, &email);
                doc.last_updated = Some(Utc::now());

                match self
                    .remote
                    .set_document(&session.identity.id, &doc, true)
                    .await
                {
                    Ok(()) => {
                        if !session.is_live() {
                            return Err(SyncError::NoActiveSession);
                        }

                        self.store.apply_remote(&doc);
                        tracing::info!("created default remote ledger");
                        Ok(())
                    }
                    Err(err) => {
                        if session.is_live() {
                            self.store.record_sync_error(err.to_string());
                        }
                        tracing::warn!(error = %err, "failed to create default ledger");
                        Err(SyncError::Bootstrap(err.to_string()))
                    }
                }
            }
            Err(err) => {
                if session.is_live() {
                    self.store.record_sync_error(err.to_string());
                }
                tracing::warn!(error = %err, "failed to load remote ledger");
                Err(SyncError::Bootstrap(err.to_string()))
            }
        }
    }

    /// Tear down the current session: cancel every pending debounce timer,
    /// stop the reconciler and revoke in-flight work. The local cache keeps
    /// its last mirror so the same identity can come back offline.
    pub fn stop(&self) {
        self.scheduler.cancel_all();

        let session = self.lock_session().take();
        if let Some(session) = session {
            session.handle.revoke();
            if let Some(reconciler) = &session.reconciler {
                reconciler.stop();
            }
            self.store.set_loading(false);
            tracing::info!(identity = %session.handle.identity.id, "sync session stopped");
        }
    }

    /// Apply a mutated collection value: replace it in the state store,
    /// mirror it to the cache, and (given an active session) schedule the
    /// debounced remote flush.
    ///
    /// Always succeeds; without a session the change simply stays local.
    pub fn apply(&self, value: CollectionValue) {
        let kind = value.kind();
        self.store.apply(value);

        match self.session_handle() {
            Some(session) => self.schedule_flush(session, kind),
            None => {
                tracing::debug!(collection = %kind, "no active session; change kept locally only");
            }
        }
    }

    fn schedule_flush(&self, session: SessionHandle, kind: CollectionKind) {
        let store = self.store.clone();
        let remote = self.remote.clone();
        let config = self.config.clone();

        self.scheduler.schedule(kind, self.config.debounce, async move {
            if !session.is_live() {
                return;
            }

            // The value is read now, at expiry: the flush carries the
            // latest state, not a snapshot from mark time.
            let value = store.collection(kind);
            let _ = retrier::flush(&store, remote.as_ref(), &config, &session, kind, value).await;
        });
    }

    /// Manually re-push every collection at attempt 0. The escape hatch
    /// after retries were exhausted or a quota error was surfaced.
    pub async fn force_sync(&self) -> Result<(), SyncError> {
        let session = self.session_handle().ok_or(SyncError::NoActiveSession)?;
        self.scheduler.cancel_all();

        let mut first_error = None;
        for kind in CollectionKind::ALL {
            let value = self.store.collection(kind);
            if let Err(err) = retrier::flush(
                &self.store,
                self.remote.as_ref(),
                &self.config,
                &session,
                kind,
                value,
            )
            .await
            {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Drive the session from an identity provider: every transition to a
    /// new identity starts a session, every transition to `None` stops it.
    pub async fn run(&self, mut identities: watch::Receiver<Option<Identity>>) {
        let mut active: Option<String> = None;

        loop {
            let next = identities.borrow_and_update().clone();
            let next_id = next.as_ref().map(|identity| identity.id.clone());

            if next_id != active {
                match next {
                    Some(identity) => {
                        let _ = self.start(identity).await;
                    }
                    None => self.stop(),
                }
                active = next_id;
            }

            if identities.changed().await.is_err() {
                break;
            }
        }

        // Provider went away; clean up like a logout.
        self.stop();
    }

    /// Clone out the full ledger.
    pub fn ledger(&self) -> Ledger {
        self.store.ledger()
    }

    /// Clone out one collection's current value.
    pub fn collection(&self, kind: CollectionKind) -> CollectionValue {
        self.store.collection(kind)
    }

    /// Clone out the sync metadata.
    pub fn status(&self) -> SyncStatus {
        self.store.status()
    }

    /// The identity of the active session, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.session_handle().map(|session| session.identity)
    }

    /// Pending debounce timers (observability, tests).
    pub fn pending_flushes(&self) -> usize {
        self.scheduler.pending()
    }
}
