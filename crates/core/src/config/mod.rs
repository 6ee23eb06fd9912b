//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MEDISW_*)
//! 2. TOML config file (if MEDISW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::CacheVersion;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (MEDISW_*)
/// 2. TOML config file (if MEDISW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL the application shell is served from.
    ///
    /// Its origin is the worker's own origin; manifest paths resolve against it.
    /// Set via MEDISW_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Prefix of the cache store name.
    ///
    /// Set via MEDISW_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Cache schema version. Bumping it invalidates every cached asset on
    /// the next activation.
    ///
    /// Set via MEDISW_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: u32,

    /// Static asset manifest cached at install time, relative to `base_url`.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Regex matched against the full URL of cross-origin requests. A match
    /// lets a development tunnel host through the origin check.
    ///
    /// Set via MEDISW_TUNNEL_HOST_PATTERN environment variable.
    #[serde(default = "default_tunnel_host_pattern")]
    pub tunnel_host_pattern: Option<String>,

    /// Path fragment that marks API requests; those always bypass the cache.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Page served when a navigation cannot reach the network.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Image served when an image request cannot reach the network.
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,

    /// Icon shown on push notifications.
    #[serde(default = "default_placeholder_image")]
    pub notification_icon: String,

    /// Badge shown on push notifications.
    #[serde(default = "default_notification_badge")]
    pub notification_badge: String,

    /// Worker script checked on development hosts before registering. A 404
    /// or a non-JavaScript answer unregisters the worker.
    #[serde(default = "default_worker_script")]
    pub worker_script: String,

    /// Activate a freshly installed worker without waiting for open pages
    /// to close.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Path to SQLite cache database.
    ///
    /// Set via MEDISW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via MEDISW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Largest response body written to the cache. Bigger responses are
    /// still returned to the caller.
    ///
    /// Set via MEDISW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via MEDISW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/".into()
}

fn default_cache_prefix() -> String {
    "medicare-cache".into()
}

fn default_cache_version() -> u32 {
    2
}

fn default_static_assets() -> Vec<String> {
    [
        "./",
        "./index.html",
        "./manifest.json",
        "./logo192.png",
        "./logo512.png",
        "./favicon.ico",
        "./offline.html",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_tunnel_host_pattern() -> Option<String> {
    Some("ngrok".into())
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_offline_page() -> String {
    "./offline.html".into()
}

fn default_placeholder_image() -> String {
    "./logo192.png".into()
}

fn default_notification_badge() -> String {
    "./favicon.ico".into()
}

fn default_worker_script() -> String {
    "./service-worker.js".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./medisw-cache.sqlite")
}

fn default_user_agent() -> String {
    "medisw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            static_assets: default_static_assets(),
            tunnel_host_pattern: default_tunnel_host_pattern(),
            api_prefix: default_api_prefix(),
            offline_page: default_offline_page(),
            placeholder_image: default_placeholder_image(),
            notification_icon: default_placeholder_image(),
            notification_badge: default_notification_badge(),
            worker_script: default_worker_script(),
            skip_waiting: true,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The cache version tag this configuration describes.
    pub fn cache_version(&self) -> CacheVersion {
        CacheVersion::new(&self.cache_prefix, self.cache_version)
    }

    /// Parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `base_url` is not an absolute http(s) URL.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid { field: "base_url".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid {
                field: "base_url".into(),
                reason: format!("unsupported scheme: {scheme}"),
            }),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `MEDISW_`
    /// 2. TOML file from `MEDISW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MEDISW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("MEDISW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000/");
        assert_eq!(config.cache_version().name(), "medicare-cache-v2");
        assert_eq!(config.static_assets.len(), 7);
        assert_eq!(config.static_assets.last().map(String::as_str), Some("./offline.html"));
        assert_eq!(config.tunnel_host_pattern.as_deref(), Some("ngrok"));
        assert_eq!(config.api_prefix, "/api/");
        assert_eq!(config.offline_page, "./offline.html");
        assert_eq!(config.placeholder_image, "./logo192.png");
        assert_eq!(config.notification_badge, "./favicon.ico");
        assert_eq!(config.worker_script, "./service-worker.js");
        assert!(config.skip_waiting);
        assert_eq!(config.db_path, PathBuf::from("./medisw-cache.sqlite"));
        assert_eq!(config.max_bytes, 5_242_880);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_parsed_base_url() {
        let config = AppConfig::default();
        let url = config.parsed_base_url().unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(3000));
    }

    #[test]
    fn test_parsed_base_url_rejects_file_scheme() {
        let config = AppConfig { base_url: "file:///srv/app/".into(), ..Default::default() };
        assert!(matches!(config.parsed_base_url(), Err(ConfigError::Invalid { field, .. }) if field == "base_url"));
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "medisw.toml",
                r#"
                    base_url = "https://reports.example.org/app/"
                    cache_version = 3
                    static_assets = ["./index.html", "./offline.html"]
                "#,
            )?;
            jail.set_env("MEDISW_CONFIG_FILE", "medisw.toml");
            jail.set_env("MEDISW_CACHE_PREFIX", "app-cache");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.cache_version().name(), "app-cache-v3");
            assert_eq!(config.static_assets, vec!["./index.html", "./offline.html"]);
            assert_eq!(config.base_url, "https://reports.example.org/app/");
            Ok(())
        });
    }
}
