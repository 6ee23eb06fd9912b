//! sw_caches tool implementation.
//!
//! Lists every store, or the entries of one store.

use medisw_core::cache::StoreSummary;
use medisw_core::{CacheDb, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the sw_caches tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// List the entry URLs of this store instead of all stores.
    #[serde(default)]
    pub store: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub stores: Vec<StoreSummary>,
    /// Entry URLs of the requested store, in insertion order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
}

/// Implementation of the sw_caches tool.
pub async fn list_impl(cache: &CacheDb, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let stores = cache.store_summaries().await?;

    let keys = match params.store {
        Some(name) => {
            if !cache.has_store(&name).await? {
                return Err(Error::NotFound(format!("cache store {name}")).into());
            }
            Some(cache.store(&name).keys().await?)
        }
        None => None,
    };

    json_result(&CacheListOutput { stores, keys })
}
