//! Write retrier - pushes a collection to the remote store, classifying
//! failures and retrying the transient kind up to a fixed bound.
//!
//! The written payload is always the full identity-scoped document: the
//! remote store merges at the document level but replaces whole fields, so a
//! partial collection must never be written. Collections other than the one
//! being flushed are re-read from the state store on every attempt.

use crate::error::SyncError;
use crate::remote::RemoteStore;
use crate::service::SessionHandle;
use crate::store::StateStore;
use crate::SyncConfig;
use chrono::Utc;
use tally_engine::{CollectionKind, CollectionValue};

/// User-facing message for quota exhaustion. The local cache stays the
/// durable copy until a later write succeeds.
pub const QUOTA_EXCEEDED_MESSAGE: &str =
    "Storage quota exceeded - changes are saved on this device only";

/// Push `value` as the new content of `kind`, retrying transient failures.
///
/// Success resets the retry bookkeeping; a terminal (quota) failure is
/// surfaced once and never retried; transient failures retry after a fixed
/// delay until `config.max_retries` attempts have failed beyond the first.
pub(crate) async fn flush(
    store: &StateStore,
    remote: &dyn RemoteStore,
    config: &SyncConfig,
    session: &SessionHandle,
    kind: CollectionKind,
    value: CollectionValue,
) -> Result<(), SyncError> {
    let mut attempt: u32 = 0;

    loop {
        if !session.is_live() {
            return Err(SyncError::NoActiveSession);
        }

        let mut document = store.ledger().to_document();
        document.set_collection(value.clone());
        let now = Utc::now();
        document.last_updated = Some(now);
        document.last_sync_attempt = Some(now);

        let result = remote
            .set_document(&session.identity.id, &document, true)
            .await;

        // The identity may have changed while the write was in flight; a
        // dead session must not touch status or schedule more work.
        if !session.is_live() {
            return Err(SyncError::NoActiveSession);
        }

        match result {
            Ok(()) => {
                store.record_write_success(Utc::now());
                tracing::debug!(collection = %kind, attempt, "collection flushed");
                return Ok(());
            }
            Err(err) if err.is_terminal() => {
                tracing::warn!(collection = %kind, error = %err, "write quota exhausted");
                store.record_sync_error(QUOTA_EXCEEDED_MESSAGE);
                return Err(SyncError::Write {
                    message: err.to_string(),
                    terminal: true,
                });
            }
            Err(err) => {
                store.record_sync_error(err.to_string());

                if attempt >= config.max_retries {
                    store.set_retry_count(attempt + 1);
                    tracing::warn!(
                        collection = %kind,
                        attempts = attempt + 1,
                        error = %err,
                        "giving up on flush until forced"
                    );
                    return Err(SyncError::Write {
                        message: err.to_string(),
                        terminal: false,
                    });
                }

                tracing::debug!(collection = %kind, attempt, error = %err, "retrying flush");
                tokio::time::sleep(config.retry_delay).await;
                attempt += 1;
            }
        }
    }
}
