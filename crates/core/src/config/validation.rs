//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `base_url` is not an absolute http(s) URL
    /// - `cache_prefix` is empty
    /// - `tunnel_host_pattern` is not a valid regex
    /// - `api_prefix` does not start with `/`
    /// - `offline_page` or `placeholder_image` is empty
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url()?;

        if self.cache_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_prefix".into(), reason: "must not be empty".into() });
        }

        if let Some(pattern) = &self.tunnel_host_pattern {
            regex::Regex::new(pattern)
                .map_err(|e| ConfigError::Invalid { field: "tunnel_host_pattern".into(), reason: e.to_string() })?;
        }

        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid { field: "api_prefix".into(), reason: "must start with '/'".into() });
        }

        if self.offline_page.is_empty() {
            return Err(ConfigError::Missing {
                field: "offline_page".into(),
                hint: "Set MEDISW_OFFLINE_PAGE to the fallback document path".into(),
            });
        }
        if self.placeholder_image.is_empty() {
            return Err(ConfigError::Missing {
                field: "placeholder_image".into(),
                hint: "Set MEDISW_PLACEHOLDER_IMAGE to the fallback image path".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !self.static_assets.iter().any(|p| p == &self.offline_page) {
            tracing::warn!(
                offline_page = %self.offline_page,
                "offline_page is not part of static_assets; navigations will fall back to a synthesized response"
            );
        }

        Ok(())
    }
}
