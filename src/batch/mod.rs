//! 批处理模块：按批次收集目标并以限速方式并发执行。
//!
//! # Batching
//!
//! Input targets are enqueued with a dispatch slot, drained in rounds, and the
//! records of each round (plus any retries it produced) are handed out as a
//! [`Batch`](crate::types::Batch).
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PendingQueue`] | FIFO of targets waiting for their slot |
//! | [`RoundExecutor`] | Runs one drained round concurrently, re-enqueues failures |
//! | [`BatchCollector`] | Cuts the input into batches and flushes the tail |

pub mod collector;
pub mod executor;
pub mod queue;

pub use collector::BatchCollector;
pub use executor::RoundExecutor;
pub use queue::{PendingQueue, QueueEntry};
