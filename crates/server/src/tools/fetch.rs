//! sw_fetch tool implementation.
//!
//! Routes one request through the worker exactly as the application shell
//! would issue it, and reports which path produced the response.

use chrono::Utc;
use medisw_client::{RequestClass, ResponseSource, ServiceWorker};
use medisw_core::{Destination, Request, RequestMode, ResponseType};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the app base URL.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "no-cors" (default) or "cors".
    #[serde(default)]
    pub mode: RequestMode,

    /// Request destination, e.g. "image" or "script". Empty by default.
    #[serde(default)]
    pub destination: Destination,

    #[serde(default)]
    pub headers: Vec<HeaderParam>,

    /// Request body as text.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderParam {
    pub name: String,
    pub value: String,
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub class: RequestClass,
    pub source: ResponseSource,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    pub content_type: Option<String>,
    pub headers: Vec<HeaderParam>,
    /// Body as UTF-8, absent for binary bodies.
    pub body: Option<String>,
    pub body_len: usize,
    /// ISO8601 timestamp of when the request was handled.
    pub handled_at: String,
}

fn build_request(worker: &ServiceWorker, params: SwFetchParams) -> Result<Request, McpError> {
    if params.url.trim().is_empty() {
        return Err(medisw_core::Error::InvalidInput("url cannot be empty".into()).into());
    }
    let url = worker.config().resolve(&params.url)?;

    let mut request = Request::get(url)
        .with_method(&params.method)
        .with_mode(params.mode)
        .with_destination(params.destination);
    for header in &params.headers {
        request = request.with_header(&header.name, &header.value);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }
    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, params)?;
    let url = request.url.to_string();

    let routed = worker.handle_fetch(request).await?;
    let response = routed.response;

    let output = SwFetchOutput {
        url,
        class: routed.class,
        source: routed.source,
        status: response.status,
        status_text: response.status_text.clone(),
        response_type: response.response_type,
        content_type: response.content_type().map(String::from),
        headers: response
            .headers
            .iter()
            .map(|(name, value)| HeaderParam { name: name.clone(), value: value.clone() })
            .collect(),
        body: std::str::from_utf8(&response.body).ok().map(String::from),
        body_len: response.body.len(),
        handled_at: Utc::now().to_rfc3339(),
    };
    json_result(&output)
}
