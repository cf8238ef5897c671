use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::time::Instant;

/// Point-in-time view of a forwarder's dispatch counters.
///
/// Facts only: every field is a count of things that already happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Failed attempts that were put back on the queue.
    pub requeued: u64,
    /// Targets abandoned after using their whole attempt budget.
    pub exhausted: u64,
    /// Entries dropped because the forwarder was cancelled.
    pub cancelled: u64,
    pub last_dispatch: Option<Instant>,
}

/// Shared dispatch counters, readable while a batch stream is being consumed.
#[derive(Debug, Default)]
pub struct ForwarderStats {
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    requeued: AtomicU64,
    exhausted: AtomicU64,
    cancelled: AtomicU64,
    last_dispatch: Mutex<Option<Instant>>,
}

impl ForwarderStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        *self
            .last_dispatch
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    pub(crate) fn on_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_failure(&self, requeued: bool) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        if requeued {
            self.requeued.fetch_add(1, Ordering::Relaxed);
        } else {
            self.exhausted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn on_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            last_dispatch: *self
                .last_dispatch
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stats_count_outcomes() {
        let stats = ForwarderStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());

        stats.on_dispatch();
        stats.on_success();
        stats.on_dispatch();
        stats.on_failure(true);
        stats.on_dispatch();
        stats.on_failure(false);
        stats.on_cancelled();

        let snap = stats.snapshot();
        assert_eq!(snap.dispatched, 3);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.failed, 2);
        assert_eq!(snap.requeued, 1);
        assert_eq!(snap.exhausted, 1);
        assert_eq!(snap.cancelled, 1);
        assert!(snap.last_dispatch.is_some());
    }
}
