//! Network boundary.
//!
//! The forwarder talks to the outside world only through the [`Fetcher`] trait,
//! so the dispatch logic can be driven by [`HttpTransport`] in production and by
//! scripted fetchers in tests.

pub mod http;

pub use http::{HttpTransport, HttpTransportConfig};

use crate::types::Target;
use crate::Result;
use async_trait::async_trait;

/// Performs one request for one target.
///
/// Any `Err` counts as a failed attempt against the target's retry budget.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &Target) -> Result<serde_json::Value>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
