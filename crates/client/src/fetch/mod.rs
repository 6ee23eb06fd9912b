//! Network access for the offline router.
//!
//! ### Network seam
//! - The router only talks to the network through the [`Network`] trait, so
//!   tests and alternative transports can stand in for `reqwest`.
//!
//! ### FetchClient
//! - Single attempt per call, no retries; the configured timeout is the only
//!   deadline.
//! - Redirects are followed (max 5). Bodies are returned whole; the size
//!   limit applies to what the router caches, not to what callers receive.
//! - Responses whose final URL shares the app origin are typed `basic`;
//!   cross-origin responses are `cors` for CORS-mode requests and `opaque`
//!   otherwise. Status and body are kept so passthrough callers still see
//!   them; only the type drives caching decisions.

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, resolve, same_origin};

use medisw_core::{Error, Request, RequestMode, Response, ResponseType};

/// Anything that can perform a single network fetch.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch `request` once. Transport failures (offline, DNS, timeout)
    /// are `Err`; HTTP error statuses are `Ok` responses.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "medisw/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// The application's own origin, used to type responses.
    pub origin: Url,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "medisw/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            origin: Url::parse("http://localhost:3000/").expect("static URL parses"),
        }
    }
}

impl FetchConfig {
    /// Build from the loaded application configuration.
    pub fn from_app_config(config: &medisw_core::AppConfig) -> Result<Self, Error> {
        let origin = config
            .parsed_base_url()
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            origin,
            ..Default::default()
        })
    }
}

/// reqwest-backed [`Network`] implementation.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn response_type(&self, final_url: &Url, mode: RequestMode) -> ResponseType {
        if same_origin(final_url, &self.config.origin) {
            ResponseType::Basic
        } else if mode == RequestMode::Cors {
            ResponseType::Cors
        } else {
            ResponseType::Opaque
        }
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("timed out fetching {}: {}", request.url, e))
            } else {
                Error::Network(format!("network error fetching {}: {}", request.url, e))
            }
        })?;

        let status = response.status();

        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        let response_type = self.response_type(&final_url, request.mode);
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} ({}, {}) in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            response_type,
            fetch_ms,
            bytes.len()
        );

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: bytes,
            response_type,
            url: Some(final_url),
        })
    }
}
