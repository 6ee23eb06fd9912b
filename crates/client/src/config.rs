//! Resolved worker configuration.
//!
//! `AppConfig` holds what the operator wrote; `WorkerConfig` holds the same
//! values parsed into the types the router works with (absolute URLs, a
//! compiled tunnel pattern, the cache version tag).

use medisw_core::{AppConfig, CacheVersion, Error};
use regex::Regex;
use url::Url;

use crate::fetch::resolve;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the application shell; its origin is the worker's origin.
    pub base_url: Url,
    pub cache_version: CacheVersion,
    /// Install-time manifest, resolved and in order.
    pub static_assets: Vec<Url>,
    /// Cross-origin URLs matching this pattern are treated as same-origin.
    pub tunnel_host: Option<Regex>,
    pub api_prefix: String,
    pub offline_page: Url,
    pub placeholder_image: Url,
    pub notification_icon: Url,
    pub notification_badge: Url,
    pub worker_script: Url,
    pub skip_waiting: bool,
    /// Responses with bigger bodies are served but never cached.
    pub max_entry_bytes: usize,
}

impl WorkerConfig {
    /// Resolve every path in `config` against its base URL.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let base_url = config
            .parsed_base_url()
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let at = |path: &str| resolve(&base_url, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")));

        let static_assets = config
            .static_assets
            .iter()
            .map(|p| at(p))
            .collect::<Result<Vec<_>, _>>()?;

        let tunnel_host = config
            .tunnel_host_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| Error::InvalidInput(format!("tunnel_host_pattern: {e}")))?;

        Ok(Self {
            static_assets,
            tunnel_host,
            api_prefix: config.api_prefix.clone(),
            offline_page: at(&config.offline_page)?,
            placeholder_image: at(&config.placeholder_image)?,
            notification_icon: at(&config.notification_icon)?,
            notification_badge: at(&config.notification_badge)?,
            worker_script: at(&config.worker_script)?,
            skip_waiting: config.skip_waiting,
            max_entry_bytes: config.max_bytes,
            cache_version: config.cache_version(),
            base_url,
        })
    }

    /// Name of the store that is live for this version.
    pub fn cache_name(&self) -> String {
        self.cache_version.name()
    }

    /// Resolve a path or URL against the base URL.
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        resolve(&self.base_url, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    /// Loopback hosts and tunnel hosts count as development hosts, where the
    /// worker script is checked before registering.
    pub fn is_development_host(&self) -> bool {
        let loopback = match self.base_url.host() {
            Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
            Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        };
        loopback
            || self
                .tunnel_host
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(self.base_url.as_str()))
    }

    /// Same configuration under a different cache version.
    pub fn with_version(mut self, version: CacheVersion) -> Self {
        self.cache_version = version;
        self
    }
}
