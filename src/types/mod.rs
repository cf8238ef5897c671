//! 类型模块：定义请求目标、单次请求记录和批次结果。
//!
//! # Types Module
//!
//! Core value types that flow through the forwarder.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Target`] | Opaque, cheaply clonable request identifier (usually a URL) |
//! | [`FetchRecord`] | Outcome of one dispatch attempt for one target |
//! | [`Batch`] | Records produced by one executor round (or the final flush) |
//!
//! ## Example
//!
//! ```rust
//! use rate_forwarder::types::{Batch, FetchRecord, Target};
//!
//! let target = Target::from("https://api.example.com/items/1");
//! let mut batch = Batch::new(0);
//! batch.extend(vec![FetchRecord::success(target, serde_json::json!({"id": 1}), 1)]);
//! assert!(batch.all_succeeded());
//! ```

pub mod record;
pub mod target;

pub use record::{Batch, FetchRecord};
pub use target::Target;
