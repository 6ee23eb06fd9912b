//! MCP tool implementations.
//!
//! Each tool is a `*_impl` function over a shared [`ServiceWorker`] so the
//! handler stays a thin routing layer.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod notify;

#[cfg(test)]
pub(crate) mod testing;

use medisw_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Pretty JSON text content, the shape every tool returns.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
