//! Batch collector.

use super::executor::RoundExecutor;
use super::queue::{PendingQueue, QueueEntry};
use crate::forwarder::CancelHandle;
use crate::resilience::SlotScheduler;
use crate::types::{Batch, Target};
use crate::BatchStream;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

/// Feeds input targets into the pending queue and cuts the output into batches.
///
/// A round runs after every `batch_size`-th input target. Retries enqueued by a
/// round do not count toward the next boundary; they ride along with whichever
/// round drains them. Once the input is exhausted the queue is flushed until
/// nothing is left, including retries of retries.
pub struct BatchCollector {
    batch_size: usize,
    scheduler: Arc<SlotScheduler>,
    queue: Arc<PendingQueue>,
    executor: RoundExecutor,
    cancel: CancelHandle,
    produced: usize,
}

impl BatchCollector {
    /// `batch_size` must be positive; [`crate::ForwarderConfig::validate`] guarantees it.
    pub fn new(
        batch_size: usize,
        scheduler: Arc<SlotScheduler>,
        queue: Arc<PendingQueue>,
        executor: RoundExecutor,
        cancel: CancelHandle,
    ) -> Self {
        Self {
            batch_size: batch_size.max(1),
            scheduler,
            queue,
            executor,
            cancel,
            produced: 0,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Allocate a slot for `target` and put it at the back of the queue.
    pub fn enqueue(&self, target: Target) -> usize {
        let slot = self.scheduler.next_slot();
        self.queue.enqueue(QueueEntry::new(target, slot))
    }

    /// Drain the queue and run a single round over it.
    pub async fn process_queue(&mut self) -> Batch {
        let started = Instant::now();
        let mut batch = Batch::new(self.produced);
        let entries = self.queue.drain();
        batch.extend(self.executor.run_round(entries).await);
        self.finish(batch, started)
    }

    /// Run rounds until the queue stays empty (or the forwarder is cancelled).
    ///
    /// With an unlimited attempt budget a target that never succeeds keeps this
    /// looping until cancelled.
    pub async fn flush(&mut self) -> Batch {
        let started = Instant::now();
        let mut batch = Batch::new(self.produced);
        while !self.queue.is_empty() && !self.cancel.is_cancelled() {
            let entries = self.queue.drain();
            batch.extend(self.executor.run_round(entries).await);
        }
        self.finish(batch, started)
    }

    fn finish(&mut self, mut batch: Batch, started: Instant) -> Batch {
        batch.elapsed = started.elapsed();
        if !batch.is_empty() {
            self.produced += 1;
            info!(
                batch = batch.index,
                records = batch.len(),
                succeeded = batch.success_count(),
                rounds = batch.rounds,
                elapsed_ms = batch.elapsed.as_millis() as u64,
                "batch complete"
            );
        }
        batch
    }

    /// Turn the collector into a lazy, single-pass stream of batches over `targets`.
    ///
    /// Input is pulled only as batches are requested, so unbounded iterators work.
    pub fn into_stream<'a, I>(self, targets: I) -> BatchStream<'a>
    where
        I: IntoIterator,
        I::Item: Into<Target> + Send + 'a,
        I::IntoIter: Send + 'a,
    {
        let state = CollectState {
            collector: self,
            targets: targets.into_iter(),
            consumed: 0,
            exhausted: false,
        };

        Box::pin(futures::stream::unfold(state, |mut st| async move {
            if st.exhausted || st.collector.cancel.is_cancelled() {
                return None;
            }
            loop {
                let Some(item) = st.targets.next() else {
                    break;
                };
                st.collector.enqueue(item.into());
                st.consumed += 1;
                if st.consumed % st.collector.batch_size == 0 {
                    let batch = st.collector.process_queue().await;
                    return Some((batch, st));
                }
            }
            st.exhausted = true;
            let batch = st.collector.flush().await;
            if batch.is_empty() {
                None
            } else {
                Some((batch, st))
            }
        }))
    }
}

struct CollectState<I> {
    collector: BatchCollector,
    targets: I,
    consumed: usize,
    exhausted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::AttemptTracker;
    use crate::transport::Fetcher;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::time::Duration;

    struct AlwaysOk;

    #[async_trait]
    impl Fetcher for AlwaysOk {
        async fn fetch(&self, target: &Target) -> Result<serde_json::Value> {
            Ok(serde_json::json!(target.as_str()))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Fetcher for AlwaysFails {
        async fn fetch(&self, _target: &Target) -> Result<serde_json::Value> {
            Err(Error::runtime("unreachable"))
        }
    }

    fn collector(fetcher: Arc<dyn Fetcher>, batch_size: usize, max_attempts: u32) -> BatchCollector {
        let scheduler = Arc::new(SlotScheduler::with_origin(Duration::ZERO, Instant::now()));
        let tracker = Arc::new(AttemptTracker::new(max_attempts));
        let queue = Arc::new(PendingQueue::new());
        let executor = RoundExecutor::new(fetcher, scheduler.clone(), tracker, queue.clone());
        BatchCollector::new(batch_size, scheduler, queue, executor, CancelHandle::new())
    }

    #[tokio::test]
    async fn test_batches_follow_boundaries() {
        let c = collector(Arc::new(AlwaysOk), 3, 1);
        let targets = (0..7).map(|i| format!("t{}", i));
        let batches: Vec<Batch> = c.into_stream(targets).collect().await;

        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        let indices: Vec<usize> = batches.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_trailing_batch() {
        let c = collector(Arc::new(AlwaysOk), 2, 1);
        let batches: Vec<Batch> = c.into_stream(vec!["a", "b", "c", "d"]).collect().await;
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 2 && b.rounds == 1));
    }

    #[tokio::test]
    async fn test_empty_input_yields_nothing() {
        let c = collector(Arc::new(AlwaysOk), 4, 1);
        let batches: Vec<Batch> = c.into_stream(Vec::<String>::new()).collect().await;
        assert!(batches.is_empty());
    }

    #[tokio::test]
    async fn test_retries_ride_along_with_next_round() {
        let c = collector(Arc::new(AlwaysFails), 2, 2);
        let batches: Vec<Batch> = c.into_stream(vec!["a", "b", "c", "d"]).collect().await;

        // Round 1: a, b fail and are re-enqueued.
        // Round 2: retries of a, b plus c, d. a, b are exhausted; c, d re-enqueued.
        // Flush: retries of c, d.
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 4, 2]);
        assert!(batches.iter().all(|b| b.success_count() == 0));
    }

    #[tokio::test]
    async fn test_lazy_input_is_pulled_on_demand() {
        let c = collector(Arc::new(AlwaysOk), 5, 1);
        let endless = (0u64..).map(|i| format!("t{}", i));
        let mut stream = c.into_stream(endless);

        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 5);
        assert_eq!(second.records[0].target.as_str().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_collector_stops() {
        let c = collector(Arc::new(AlwaysOk), 1, 1);
        let cancel = c.cancel.clone();
        let mut stream = c.into_stream(vec!["a", "b", "c"]);

        assert!(stream.next().await.is_some());
        cancel.cancel();
        assert!(stream.next().await.is_none());
    }
}
