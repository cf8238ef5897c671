//! Request targets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque identifier of one remote resource, usually an absolute URL.
///
/// Cloning is cheap: a target is shared between the pending queue, the attempt
/// tracker and every record produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Target(Arc<str>);

impl Target {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&String> for Target {
    fn from(s: &String) -> Self {
        Self::new(s)
    }
}

impl From<url::Url> for Target {
    fn from(u: url::Url) -> Self {
        Self::from(String::from(u))
    }
}

impl From<Target> for String {
    fn from(t: Target) -> Self {
        t.0.to_string()
    }
}
