//! Forwarder configuration.
//!
//! Values are resolved in layers: built-in defaults, then `FORWARDER_*`
//! environment variables, then an optional YAML/JSON file, then explicit
//! builder calls.

use crate::resilience::slot_scheduler::min_interval_for;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_MAX_FREQUENCY: &str = "FORWARDER_MAX_FREQUENCY";
pub const ENV_MAX_ATTEMPTS: &str = "FORWARDER_MAX_ATTEMPTS";
pub const ENV_BATCH_SIZE: &str = "FORWARDER_BATCH_SIZE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForwarderConfig {
    /// Requests per second ceiling; 0 disables rate limiting.
    pub max_frequency: f64,
    /// Dispatch attempts allowed per target; 0 means unlimited.
    pub max_attempts: u32,
    /// Input targets per yielded batch.
    pub batch_size: usize,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            max_frequency: 0.0,
            max_attempts: 2,
            batch_size: 20,
        }
    }
}

impl ForwarderConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_max_frequency(mut self, f: f64) -> Self {
        self.max_frequency = f;
        self
    }
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }
    pub fn with_batch_size(mut self, s: usize) -> Self {
        self.batch_size = s;
        self
    }

    /// Reject values the forwarder cannot run with.
    pub fn validate(&self) -> Result<()> {
        min_interval_for(self.max_frequency)?;
        if self.batch_size == 0 {
            return Err(Error::configuration_with_context(
                "batch_size must be positive",
                ErrorContext::new()
                    .with_field_path("batch_size")
                    .with_source("config_validator"),
            ));
        }
        Ok(())
    }

    /// Minimum spacing between dispatches implied by `max_frequency`.
    pub fn min_interval(&self) -> Result<Duration> {
        min_interval_for(self.max_frequency)
    }

    /// Defaults overlaid with `FORWARDER_MAX_FREQUENCY`, `FORWARDER_MAX_ATTEMPTS`
    /// and `FORWARDER_BATCH_SIZE`. Unparseable values are configuration errors.
    pub fn from_env() -> Result<Self> {
        Self::default().overlay_env()
    }

    /// Apply any `FORWARDER_*` variables that are set on top of `self`.
    pub fn overlay_env(mut self) -> Result<Self> {
        if let Some(v) = env_parse::<f64>(ENV_MAX_FREQUENCY)? {
            self.max_frequency = v;
        }
        if let Some(v) = env_parse::<u32>(ENV_MAX_ATTEMPTS)? {
            self.max_attempts = v;
        }
        if let Some(v) = env_parse::<usize>(ENV_BATCH_SIZE)? {
            self.batch_size = v;
        }
        Ok(self)
    }

    /// Parse a YAML (or JSON) document. Missing keys keep their defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::default().overlay_yaml_str(content)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::default().overlay_file(path)
    }

    /// Apply the keys present in a YAML (or JSON) document on top of `self`.
    pub fn overlay_yaml_str(self, content: &str) -> Result<Self> {
        let overlay: ConfigOverlay = serde_yaml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                "invalid forwarder configuration",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })?;
        Ok(overlay.apply(self))
    }

    /// Like [`overlay_yaml_str`](Self::overlay_yaml_str), reading from `path`.
    pub fn overlay_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        self.overlay_yaml_str(&content).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_field_path(path.display().to_string()),
            },
            other => other,
        })
    }
}

/// A configuration document where every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigOverlay {
    max_frequency: Option<f64>,
    max_attempts: Option<u32>,
    batch_size: Option<usize>,
}

impl ConfigOverlay {
    fn apply(self, mut base: ForwarderConfig) -> ForwarderConfig {
        if let Some(v) = self.max_frequency {
            base.max_frequency = v;
        }
        if let Some(v) = self.max_attempts {
            base.max_attempts = v;
        }
        if let Some(v) = self.batch_size {
            base.batch_size = v;
        }
        base
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map(Some).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot parse {}", key),
                ErrorContext::new()
                    .with_field_path(format!("env.{}", key))
                    .with_details(format!("{:?}: {}", raw, e))
                    .with_source("config_loader"),
            )
        }),
        _ => Ok(None),
    }
}
