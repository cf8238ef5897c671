//! 弹性模块：提供按频率分配发送时间槽和按目标计数重试次数的机制。
//!
//! # Resilience Primitives Module
//!
//! The two pieces of shared state that keep the forwarder within its limits.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`slot_scheduler`] | Converts a maximum frequency into strictly spaced dispatch slots |
//! | [`attempt_tracker`] | Counts failed attempts per target against the retry budget |
//!
//! ## Slot Scheduler
//!
//! Every enqueue takes the next slot, `min_interval` after the previous one.
//! Because slots are chained off each other rather than off the clock, a burst
//! of enqueues is spread out over time:
//!
//! ```rust
//! use rate_forwarder::resilience::slot_scheduler::SlotScheduler;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scheduler = SlotScheduler::from_frequency(10.0).unwrap(); // 10 req/s
//! let first = scheduler.next_slot();
//! let second = scheduler.next_slot();
//! assert_eq!(second - first, Duration::from_millis(100));
//! # }
//! ```
//!
//! ## Attempt Tracker
//!
//! ```rust
//! use rate_forwarder::resilience::attempt_tracker::AttemptTracker;
//! use rate_forwarder::types::Target;
//!
//! let tracker = AttemptTracker::new(2);
//! let target = Target::from("https://api.example.com/flaky");
//! tracker.record_failure(&target);
//! assert!(tracker.may_retry(&target));
//! tracker.record_failure(&target);
//! assert!(!tracker.may_retry(&target));
//! ```

pub mod attempt_tracker;
pub mod slot_scheduler;

pub use attempt_tracker::AttemptTracker;
pub use slot_scheduler::{SlotScheduler, SlotSchedulerSnapshot};
