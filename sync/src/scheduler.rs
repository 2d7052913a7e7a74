//! Debounced persistence scheduler.
//!
//! One cancellable timer per collection: marking a collection dirty cancels
//! any pending timer for it and starts a fresh quiet window, so a burst of
//! edits (toggling several installments, say) collapses into a single remote
//! write carrying the final state.

use dashmap::DashMap;
use std::future::Future;
use std::time::Duration;
use tally_engine::CollectionKind;
use tokio::task::JoinHandle;

/// Per-collection debounce timers.
#[derive(Debug, Default)]
pub struct FlushScheduler {
    timers: DashMap<CollectionKind, JoinHandle<()>>,
}

impl FlushScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the quiet window for `kind`. When it elapses
    /// undisturbed, `flush` runs. A prior pending timer for the same
    /// collection is cancelled: last mark wins.
    pub fn schedule<F>(&self, kind: CollectionKind, delay: Duration, flush: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some((_, previous)) = self.timers.remove(&kind) {
            previous.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            flush.await;
        });

        self.timers.insert(kind, handle);
        tracing::debug!(collection = %kind, ?delay, "flush scheduled");
    }

    /// Cancel the pending timer for one collection, if any.
    pub fn cancel(&self, kind: CollectionKind) {
        if let Some((_, handle)) = self.timers.remove(&kind) {
            handle.abort();
        }
    }

    /// Synchronously cancel every pending timer. Called on identity loss,
    /// before any new session may start.
    pub fn cancel_all(&self) {
        let kinds: Vec<CollectionKind> = self.timers.iter().map(|entry| *entry.key()).collect();
        for kind in kinds {
            self.cancel(kind);
        }
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.timers
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter_flush(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_quiet_window() {
        let scheduler = FlushScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(
            CollectionKind::Expenses,
            Duration::from_millis(2_000),
            counter_flush(&fired),
        );
        assert_eq!(scheduler.pending(), 1);

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn remark_supersedes_pending_timer() {
        let scheduler = FlushScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            scheduler.schedule(
                CollectionKind::Expenses,
                Duration::from_millis(2_000),
                counter_flush(&fired),
            );
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_millis(2_500)).await;

        // Three marks inside the window, exactly one flush.
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn collections_debounce_independently() {
        let scheduler = FlushScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(
            CollectionKind::Expenses,
            Duration::from_millis(2_000),
            counter_flush(&fired),
        );
        scheduler.schedule(
            CollectionKind::Debts,
            Duration::from_millis(2_000),
            counter_flush(&fired),
        );
        assert_eq!(scheduler.pending(), 2);

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_prevents_firing() {
        let scheduler = FlushScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(
            CollectionKind::Expenses,
            Duration::from_millis(2_000),
            counter_flush(&fired),
        );
        scheduler.schedule(
            CollectionKind::BankAccounts,
            Duration::from_millis(2_000),
            counter_flush(&fired),
        );
        scheduler.cancel_all();

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 0);
    }
}
