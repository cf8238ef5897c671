use super::{Fetcher, TransportError};
use crate::types::Target;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use reqwest::Proxy;
use std::env;
use std::time::Duration;
use tracing::debug;

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub proxy_url: Option<String>,
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            proxy_url: None,
            user_agent: format!("rate-forwarder/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpTransportConfig {
    /// Defaults, overridden by `FORWARDER_HTTP_*` and `FORWARDER_PROXY_URL` when set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: env_u64("FORWARDER_HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            pool_max_idle_per_host: env::var("FORWARDER_HTTP_POOL_MAX_IDLE_PER_HOST")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.pool_max_idle_per_host),
            pool_idle_timeout: env_u64("FORWARDER_HTTP_POOL_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.pool_idle_timeout),
            proxy_url: env::var("FORWARDER_PROXY_URL").ok().filter(|s| !s.is_empty()),
            user_agent: defaults.user_agent,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.parse::<u64>().ok())
}

/// GETs targets over one shared, pooled `reqwest::Client` and decodes JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from environment-overridable defaults.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpTransportConfig::from_env())
    }

    pub fn with_config(cfg: HttpTransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .pool_max_idle_per_host(cfg.pool_max_idle_per_host)
            .pool_idle_timeout(Some(cfg.pool_idle_timeout))
            .user_agent(cfg.user_agent);

        if let Some(proxy_url) = &cfg.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    "invalid proxy url",
                    ErrorContext::new()
                        .with_field_path("env.FORWARDER_PROXY_URL")
                        .with_details(e.to_string())
                        .with_source("http_transport"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `target`, requiring a 2xx status and a JSON body.
    pub async fn get_json(&self, target: &Target) -> Result<serde_json::Value> {
        let url = url::Url::parse(target.as_str()).map_err(|e| {
            Error::validation_with_context(
                format!("target is not a valid absolute URL: {}", target),
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("http_transport"),
            )
        })?;

        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(TransportError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Remote {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown status").to_string(),
            });
        }

        let body = response.bytes().await.map_err(TransportError::Http)?;
        debug!(target = %target, status = status.as_u16(), bytes = body.len(), "response received");
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Fetcher for HttpTransport {
    async fn fetch(&self, target: &Target) -> Result<serde_json::Value> {
        self.get_json(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_config_defaults() {
        let cfg = HttpTransportConfig::default();
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.pool_max_idle_per_host, 32);
        assert_eq!(cfg.pool_idle_timeout, Duration::from_secs(90));
        assert!(cfg.proxy_url.is_none());
        assert!(cfg.user_agent.starts_with("rate-forwarder/"));
    }

    #[test]
    fn test_invalid_proxy_is_configuration_error() {
        let cfg = HttpTransportConfig::default().with_proxy_url("http://[::1");
        let err = HttpTransport::with_config(cfg).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_relative_target_is_rejected_before_sending() {
        let transport = HttpTransport::from_client(reqwest::Client::new());
        let err = transport.get_json(&Target::new("/relative/path")).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
