//! Error taxonomy for the sync engine.
//!
//! No failure here is fatal: every variant ends up recorded in
//! [`crate::SyncStatus::sync_error`] for the UI, and local mutation stays
//! fully available regardless of remote health.

use thiserror::Error;

/// Errors surfaced by the sync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A remote write failed. `terminal` distinguishes quota exhaustion
    /// (never retried automatically) from transient failures (retried up to
    /// the configured bound).
    #[error("remote write failed: {message}")]
    Write { message: String, terminal: bool },

    /// Initial load or default-document creation failed.
    #[error("bootstrap failed: {0}")]
    Bootstrap(String),

    /// The snapshot subscription reported an error; the subscription itself
    /// stays up.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// An operation that needs an active identity ran without one.
    #[error("no active sync session")]
    NoActiveSession,
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
