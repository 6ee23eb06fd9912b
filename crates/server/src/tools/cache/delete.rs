//! sw_cache_delete tool implementation.
//!
//! Deletes a whole store, or a single entry when a URL is given.

use medisw_core::{CacheDb, Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::tools::json_result;

/// Parameters for the sw_cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteParams {
    pub store: String,

    /// Absolute URL of a single GET entry to remove.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteOutput {
    pub store: String,
    pub url: Option<String>,
    pub deleted: bool,
}

/// Implementation of the sw_cache_delete tool.
pub async fn delete_impl(cache: &CacheDb, params: CacheDeleteParams) -> Result<CallToolResult, McpError> {
    if params.store.trim().is_empty() {
        return Err(Error::InvalidInput("store cannot be empty".into()).into());
    }

    let deleted = match &params.url {
        Some(raw) => {
            let url = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
            cache.store(&params.store).delete(&Request::get(url)).await?
        }
        None => cache.delete_store(&params.store).await?,
    };

    if deleted {
        tracing::info!(store = %params.store, url = ?params.url, "deleted from cache");
    }
    json_result(&CacheDeleteOutput { store: params.store, url: params.url, deleted })
}
