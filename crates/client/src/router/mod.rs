//! Offline cache router.
//!
//! ### Classification
//! - Every request gets exactly one [`RequestClass`]; see [`classify`].
//!
//! ### Strategies
//! - Passthrough classes go to the network and surface its errors.
//! - Navigations are network-first with the offline page as fallback.
//! - Assets are cache-first; valid misses are written back in the background.
//!
//! ### Failure isolation
//! - Intercepted classes always produce a response. Background cache writes
//!   are tracked in a `JoinSet`, their failures logged and dropped.

pub mod classify;
mod strategy;

pub use classify::{RequestClass, classify};

use std::fmt;
use std::sync::Arc;

use medisw_core::{CacheDb, Error, Request, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::config::WorkerConfig;
use crate::fetch::Network;

/// Where a routed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
    Placeholder,
    Synthesized,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::OfflineFallback => "offline_fallback",
            ResponseSource::Placeholder => "placeholder",
            ResponseSource::Synthesized => "synthesized",
        }
    }
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response plus how the router produced it.
#[derive(Debug, Clone)]
pub struct RoutedResponse {
    pub class: RequestClass,
    pub source: ResponseSource,
    pub response: Response,
}

/// Decides, per request, between cache and network.
pub struct CacheRouter {
    config: Arc<WorkerConfig>,
    cache: CacheDb,
    network: Arc<dyn Network>,
    pending: Mutex<JoinSet<()>>,
}

impl CacheRouter {
    pub fn new(config: Arc<WorkerConfig>, cache: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { config, cache, network, pending: Mutex::new(JoinSet::new()) }
    }

    /// Route one request.
    ///
    /// # Errors
    ///
    /// Only passthrough classes return errors, and only the network's own.
    /// Navigation and asset requests always resolve to a response.
    pub async fn handle(&self, request: Request) -> Result<RoutedResponse, Error> {
        let class = classify(&request, &self.config);
        tracing::debug!(method = %request.method, url = %request.url, %class, "routing request");

        if !class.is_intercepted() {
            return self.forward(class, &request).await;
        }
        if class == RequestClass::Navigation {
            Ok(self.network_first(&request).await)
        } else {
            Ok(self.cache_first(&request).await)
        }
    }

    /// Send `request` to the network without consulting the cache, as when
    /// no worker is registered.
    pub async fn bypass(&self, request: Request) -> Result<RoutedResponse, Error> {
        let class = classify(&request, &self.config);
        self.forward(class, &request).await
    }

    async fn forward(&self, class: RequestClass, request: &Request) -> Result<RoutedResponse, Error> {
        let response = self.network.fetch(request).await?;
        Ok(RoutedResponse { class, source: ResponseSource::Network, response })
    }

    /// Wait for every background cache write started so far. New writes may
    /// start while this waits; they are not included.
    pub async fn settle(&self) {
        let mut drained = std::mem::take(&mut *self.pending.lock().await);
        while let Some(joined) = drained.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("background cache write task failed: {}", e);
            }
        }
    }
}
