//! Round executor.

use super::queue::{PendingQueue, QueueEntry};
use crate::forwarder::{CancelHandle, ForwarderStats};
use crate::resilience::{AttemptTracker, SlotScheduler};
use crate::transport::Fetcher;
use crate::types::FetchRecord;
use futures::StreamExt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Dispatches one drained set of queue entries concurrently.
///
/// Each entry waits for its own slot, so entries whose slot has already passed
/// go out immediately while later ones sleep. Failures are charged to the
/// attempt tracker and, budget permitting, re-enqueued with a fresh slot for a
/// later round.
pub struct RoundExecutor {
    fetcher: Arc<dyn Fetcher>,
    scheduler: Arc<SlotScheduler>,
    tracker: Arc<AttemptTracker>,
    queue: Arc<PendingQueue>,
    cancel: CancelHandle,
    stats: Arc<ForwarderStats>,
}

impl RoundExecutor {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        scheduler: Arc<SlotScheduler>,
        tracker: Arc<AttemptTracker>,
        queue: Arc<PendingQueue>,
    ) -> Self {
        Self {
            fetcher,
            scheduler,
            tracker,
            queue,
            cancel: CancelHandle::new(),
            stats: Arc::new(ForwarderStats::new()),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_stats(mut self, stats: Arc<ForwarderStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &Arc<ForwarderStats> {
        &self.stats
    }

    /// Run every entry to a terminal outcome and return one record per dispatch.
    ///
    /// Record order follows completion, not input order.
    pub async fn run_round(&self, entries: Vec<QueueEntry>) -> Vec<FetchRecord> {
        let width = entries.len().max(1);
        futures::stream::iter(entries)
            .map(|entry| self.dispatch(entry))
            .buffer_unordered(width)
            .filter_map(|record| async move { record })
            .collect()
            .await
    }

    async fn dispatch(&self, entry: QueueEntry) -> Option<FetchRecord> {
        let QueueEntry { target, slot, .. } = entry;
        let attempt = self.tracker.attempts(&target) + 1;

        let now = Instant::now();
        if slot > now {
            debug!(target = %target, attempt, slot_delay_ms = (slot - now).as_millis() as u64, "waiting for slot");
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.stats.on_cancelled();
                return None;
            }
            _ = tokio::time::sleep_until(slot) => {}
        }

        self.stats.on_dispatch();
        debug!(target = %target, attempt, "dispatching");
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.stats.on_cancelled();
                return None;
            }
            outcome = self.fetcher.fetch(&target) => outcome,
        };

        match outcome {
            Ok(payload) => {
                self.stats.on_success();
                Some(FetchRecord::success(target, payload, attempt))
            }
            Err(err) => {
                let failures = self.tracker.record_failure(&target);
                let requeue = self.tracker.may_retry(&target);
                if requeue {
                    let next = self.scheduler.next_slot();
                    self.queue.enqueue(QueueEntry::new(target.clone(), next));
                    debug!(target = %target, failures, error = %err, "request failed, re-enqueued");
                } else {
                    warn!(target = %target, failures, error = %err, "request failed, attempt budget exhausted");
                }
                self.stats.on_failure(requeue);
                Some(FetchRecord::failure(target, attempt, err.to_string()))
            }
        }
    }
}
