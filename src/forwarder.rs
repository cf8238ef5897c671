//! Forwarder aggregate: the public entry point that wires configuration, slot
//! scheduling, attempt tracking and the batch pipeline together.
//!
//! Implementation details are split into submodules under `src/forwarder/`.

pub mod builder;
pub mod cancel;
pub mod core;
pub mod stats;

pub use self::core::{forward, Forwarder};
pub use builder::ForwarderBuilder;
pub use cancel::CancelHandle;
pub use stats::{ForwarderStats, StatsSnapshot};
