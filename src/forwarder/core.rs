use crate::batch::{BatchCollector, PendingQueue, RoundExecutor};
use crate::config::ForwarderConfig;
use crate::forwarder::{CancelHandle, ForwarderBuilder, ForwarderStats};
use crate::resilience::{AttemptTracker, SlotScheduler, SlotSchedulerSnapshot};
use crate::transport::Fetcher;
use crate::types::{FetchRecord, Target};
use crate::{BatchStream, RecordStream, Result};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Rate-limited, retrying, batching request forwarder.
///
/// One forwarder serves one input sequence: [`collect_at_rate`](Self::collect_at_rate)
/// consumes it, and the attempt counts and slot chain die with the stream.
pub struct Forwarder {
    config: ForwarderConfig,
    fetcher: Arc<dyn Fetcher>,
    scheduler: Arc<SlotScheduler>,
    tracker: Arc<AttemptTracker>,
    queue: Arc<PendingQueue>,
    cancel: CancelHandle,
    stats: Arc<ForwarderStats>,
}

impl Forwarder {
    pub fn builder() -> ForwarderBuilder {
        ForwarderBuilder::new()
    }

    /// Build a forwarder with `config` and the default HTTP transport.
    pub fn new(config: ForwarderConfig) -> Result<Self> {
        ForwarderBuilder::new().config(config).build()
    }

    pub(crate) fn assemble(
        config: ForwarderConfig,
        fetcher: Arc<dyn Fetcher>,
        cancel: CancelHandle,
        stats: Arc<ForwarderStats>,
    ) -> Result<Self> {
        let min_interval = config.min_interval()?;
        info!(
            min_interval_ms = min_interval.as_secs_f64() * 1000.0,
            max_frequency = config.max_frequency,
            max_attempts = config.max_attempts,
            batch_size = config.batch_size,
            "forwarder ready"
        );
        Ok(Self {
            scheduler: Arc::new(SlotScheduler::with_origin(min_interval, Instant::now())),
            tracker: Arc::new(AttemptTracker::new(config.max_attempts)),
            queue: Arc::new(PendingQueue::new()),
            config,
            fetcher,
            cancel,
            stats,
        })
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    pub fn min_interval(&self) -> Duration {
        self.scheduler.min_interval()
    }

    /// A handle that abandons remaining work when cancelled. Clone it before
    /// consuming the forwarder.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Dispatch counters, readable while the batch stream is consumed.
    pub fn stats(&self) -> Arc<ForwarderStats> {
        Arc::clone(&self.stats)
    }

    /// Failed attempts recorded so far for `target`.
    pub fn attempts(&self, target: &Target) -> u32 {
        self.tracker.attempts(target)
    }

    /// How far ahead of the clock the slot chain currently reaches.
    pub fn schedule(&self) -> SlotSchedulerSnapshot {
        self.scheduler.snapshot()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Lazily fetch `targets`, yielding one [`Batch`](crate::types::Batch) per
    /// `batch_size` inputs and a final batch for the remainder and all retries.
    pub fn collect_at_rate<'a, I>(self, targets: I) -> BatchStream<'a>
    where
        I: IntoIterator,
        I::Item: Into<Target> + Send + 'a,
        I::IntoIter: Send + 'a,
    {
        let executor = RoundExecutor::new(
            self.fetcher,
            Arc::clone(&self.scheduler),
            self.tracker,
            Arc::clone(&self.queue),
        )
        .with_cancel(self.cancel.clone())
        .with_stats(self.stats);

        BatchCollector::new(
            self.config.batch_size,
            self.scheduler,
            self.queue,
            executor,
            self.cancel,
        )
        .into_stream(targets)
    }

    /// Like [`collect_at_rate`](Self::collect_at_rate), flattened to one record per attempt.
    pub fn forward<'a, I>(self, targets: I) -> RecordStream<'a>
    where
        I: IntoIterator,
        I::Item: Into<Target> + Send + 'a,
        I::IntoIter: Send + 'a,
    {
        Box::pin(
            self.collect_at_rate(targets)
                .flat_map(|batch| futures::stream::iter(batch.into_records())),
        )
    }
}

/// Fetch `targets` with a default forwarder (no rate limit, 2 attempts, batches of 20).
pub fn forward<'a, I>(targets: I) -> Result<RecordStream<'a>>
where
    I: IntoIterator,
    I::Item: Into<Target> + Send + 'a,
    I::IntoIter: Send + 'a,
{
    Ok(Forwarder::new(ForwarderConfig::default())?.forward(targets))
}
