//! # Tally Sync
//!
//! The synchronization engine for the Tally personal-finance ledger.
//!
//! Tally keeps three copies of the ledger consistent: the in-memory state,
//! a durable local cache, and the authoritative remote document - under
//! bursty local edits, asynchronous remote snapshots, and quota or network
//! failures. The ledger stays fully usable offline; remote health only ever
//! affects the sync metadata shown to the UI.
//!
//! ## Architecture
//!
//! - [`SyncService`] - the lifecycle object. `start(identity)` bootstraps a
//!   session (cache fallback, remote load or default-document creation,
//!   snapshot subscription); `stop()` cancels every pending timer and
//!   unsubscribes. No global state: adapters are injected at construction.
//! - State store - in-memory ledger plus [`SyncStatus`], mirrored to the
//!   [`LocalCache`] synchronously on every mutation.
//! - Debounced scheduler - per-collection quiet window (2 s by default), so
//!   a burst of edits becomes one remote write carrying the final state.
//! - Write retrier - full-document writes with bounded fixed-delay retries;
//!   quota exhaustion is terminal and leaves the cache as the durable copy.
//! - Reconciler - consumes the remote snapshot stream and overwrites local
//!   state unconditionally (remote wins; no merge, no per-record diff).
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tally_engine::{mutation, CollectionKind, CollectionValue};
//! use tally_sync::{Identity, MemoryCache, MemoryRemote, SyncConfig, SyncService};
//!
//! # async fn demo() -> Result<(), tally_sync::SyncError> {
//! let service = SyncService::new(
//!     Arc::new(MemoryRemote::new()),
//!     Arc::new(MemoryCache::new()),
//!     SyncConfig::default(),
//! );
//!
//! service.start(Identity::with_profile("uid-1", "Alice", "alice@example.com")).await?;
//!
//! // Mutate through the pure engine, then hand the result to the service.
//! if let CollectionValue::Expenses(expenses) = service.collection(CollectionKind::Expenses) {
//!     if let Ok(next) = mutation::toggle_paid(&expenses, 1) {
//!         service.apply(CollectionValue::Expenses(next));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod remote;
pub mod scheduler;
pub mod service;
pub mod store;

mod reconciler;
mod retrier;

// Re-export main types at crate root
pub use cache::{namespaced_key, FileCache, LocalCache, MemoryCache};
pub use config::{ConfigError, SyncConfig};
pub use error::SyncError;
pub use http::HttpRemoteStore;
pub use identity::Identity;
pub use remote::{MemoryRemote, RemoteError, RemoteStore, SnapshotEvent, Subscription, WriteRecord};
pub use retrier::QUOTA_EXCEEDED_MESSAGE;
pub use scheduler::FlushScheduler;
pub use service::SyncService;
pub use store::{StateStore, SyncStatus};
