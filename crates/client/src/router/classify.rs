//! Request classification.
//!
//! Checks run in a fixed order and the first match wins:
//! origin, then method, then API prefix, then navigation mode.

use std::fmt;

use medisw_core::{Request, RequestMode};
use serde::{Deserialize, Serialize};

use crate::config::WorkerConfig;
use crate::fetch::same_origin;

/// What the router does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// Foreign origin, not a tunnel host: not intercepted.
    CrossOriginIgnored,
    /// Not a GET: straight to the network.
    NonGetPassthrough,
    /// API call: straight to the network, never cached.
    ApiPassthrough,
    /// Full-page navigation: network first, offline page on failure.
    Navigation,
    /// Sub-resource: cache first.
    Asset,
}

impl RequestClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::CrossOriginIgnored => "cross_origin_ignored",
            RequestClass::NonGetPassthrough => "non_get_passthrough",
            RequestClass::ApiPassthrough => "api_passthrough",
            RequestClass::Navigation => "navigation",
            RequestClass::Asset => "asset",
        }
    }

    /// Whether the router answers this class itself (and so never lets a
    /// fetch error escape).
    pub fn is_intercepted(&self) -> bool {
        matches!(self, RequestClass::Navigation | RequestClass::Asset)
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `request` for the worker described by `config`.
pub fn classify(request: &Request, config: &WorkerConfig) -> RequestClass {
    let tunneled = || {
        config
            .tunnel_host
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(request.url.as_str()))
    };

    if !same_origin(&request.url, &config.base_url) && !tunneled() {
        return RequestClass::CrossOriginIgnored;
    }

    if !request.is_get() {
        return RequestClass::NonGetPassthrough;
    }

    // Path only; a query string mentioning the prefix does not count.
    if request.url.path().contains(config.api_prefix.as_str()) {
        return RequestClass::ApiPassthrough;
    }

    if request.mode == RequestMode::Navigate {
        return RequestClass::Navigation;
    }

    RequestClass::Asset
}
