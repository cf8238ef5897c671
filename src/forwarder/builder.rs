use crate::config::ForwarderConfig;
use crate::forwarder::core::Forwarder;
use crate::forwarder::{CancelHandle, ForwarderStats};
use crate::transport::{Fetcher, HttpTransport, HttpTransportConfig};
use crate::Result;
use std::sync::Arc;

/// Builder for creating forwarders with custom configuration.
///
/// Starts from [`ForwarderConfig::default`]; nothing is validated until [`build`](Self::build).
pub struct ForwarderBuilder {
    config: ForwarderConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    transport_config: Option<HttpTransportConfig>,
    cancel: CancelHandle,
    stats: Option<Arc<ForwarderStats>>,
}

impl ForwarderBuilder {
    pub fn new() -> Self {
        Self {
            config: ForwarderConfig::default(),
            fetcher: None,
            transport_config: None,
            cancel: CancelHandle::new(),
            stats: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ForwarderConfig) -> Self {
        self.config = config;
        self
    }

    /// Requests per second ceiling; 0 disables rate limiting.
    pub fn max_frequency(mut self, f: f64) -> Self {
        self.config.max_frequency = f;
        self
    }

    /// Attempts per target; 0 means unlimited.
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn batch_size(mut self, s: usize) -> Self {
        self.config.batch_size = s;
        self
    }

    /// Inject the component that performs requests. Defaults to an [`HttpTransport`].
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Settings for the default HTTP transport. Ignored when a fetcher is injected.
    pub fn transport_config(mut self, cfg: HttpTransportConfig) -> Self {
        self.transport_config = Some(cfg);
        self
    }

    /// Share a cancel handle created elsewhere.
    pub fn cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Share a stats sink created elsewhere.
    pub fn stats(mut self, stats: Arc<ForwarderStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Validate the configuration and assemble the forwarder.
    pub fn build(self) -> Result<Forwarder> {
        self.config.validate()?;
        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(f) => f,
            None => Arc::new(match self.transport_config {
                Some(cfg) => HttpTransport::with_config(cfg)?,
                None => HttpTransport::new()?,
            }),
        };
        let stats = self.stats.unwrap_or_else(|| Arc::new(ForwarderStats::new()));
        Forwarder::assemble(self.config, fetcher, self.cancel, stats)
    }
}

impl Default for ForwarderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
