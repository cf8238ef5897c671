//! # rate-forwarder
//!
//! 这是一个限速、自动重试、分批输出的请求转发库。
//!
//! Rate-limited, retrying, batching request forwarder: fetch a (possibly
//! unbounded) sequence of targets concurrently, never exceeding a configured
//! request frequency, retrying failures up to a per-target budget, and handing
//! results back as a lazy stream of batches.
//!
//! ## Overview
//!
//! Each input target is assigned a dispatch slot when enqueued. Slots are
//! spaced at least `1 / max_frequency` apart, so bursts are smoothed without a
//! token bucket. After every `batch_size` inputs the pending queue is drained
//! and dispatched concurrently; failures are re-enqueued with a fresh slot and
//! ride along with the next round. When the input ends, the queue is flushed
//! until nothing remains.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use rate_forwarder::{Forwarder, ForwarderConfig};
//!
//! #[tokio::main]
//! async fn main() -> rate_forwarder::Result<()> {
//!     let forwarder = Forwarder::new(
//!         ForwarderConfig::new()
//!             .with_max_frequency(5.0)
//!             .with_max_attempts(3)
//!             .with_batch_size(10),
//!     )?;
//!
//!     let urls = vec![
//!         "https://httpbin.org/json",
//!         "https://httpbin.org/status/503",
//!     ];
//!     let mut batches = forwarder.collect_at_rate(urls);
//!     while let Some(batch) = batches.next().await {
//!         for record in batch.iter() {
//!             println!("{} ok={} attempt={}", record.target, record.success, record.attempt);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`forwarder`] | Public aggregate, builder, cancellation and stats |
//! | [`batch`] | Pending queue, round executor and batch collector |
//! | [`resilience`] | Slot scheduling and per-target attempt tracking |
//! | [`transport`] | The [`transport::Fetcher`] seam and its HTTP implementation |
//! | [`config`] | Layered configuration (defaults, env, file) |
//! | [`types`] | Targets, fetch records and batches |

pub mod batch;
pub mod config;
pub mod forwarder;
pub mod resilience;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use config::ForwarderConfig;
pub use forwarder::{forward, CancelHandle, Forwarder, ForwarderBuilder, StatsSnapshot};
pub use types::{Batch, FetchRecord, Target};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Lazy, single-pass stream of batches produced by [`Forwarder::collect_at_rate`].
pub type BatchStream<'a> = Pin<Box<dyn Stream<Item = Batch> + Send + 'a>>;

/// Batches flattened into individual records, see [`Forwarder::forward`].
pub type RecordStream<'a> = Pin<Box<dyn Stream<Item = FetchRecord> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
