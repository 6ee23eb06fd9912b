//! Cache version tags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the one cache store that is live for a worker version.
///
/// The tag renders as `{prefix}-v{version}`, e.g. `medicare-cache-v2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheVersion {
    prefix: String,
    version: u32,
}

impl CacheVersion {
    pub fn new(prefix: &str, version: u32) -> Self {
        Self { prefix: prefix.to_string(), version }
    }

    /// Store name for this version.
    pub fn name(&self) -> String {
        format!("{}-v{}", self.prefix, self.version)
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-v{}", self.prefix, self.version)
    }
}
