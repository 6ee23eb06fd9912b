//! MCP server handler implementation.
//!
//! This module defines the server handler that routes tool calls to the
//! worker operations in [`crate::tools`].
use std::sync::Arc;

use crate::tools::{
    cache::{CacheDeleteParams, CacheListParams, delete_impl, list_impl},
    fetch::{SwFetchParams, fetch_impl},
    lifecycle::{activate_impl, install_impl, register_impl, status_impl, unregister_impl},
    notify::{SwNotificationClickParams, SwPushParams, click_impl, push_impl},
};

use medisw_client::ServiceWorker;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// MCP server driving one offline worker.
#[derive(Clone)]
pub struct MediswServer {
    worker: Arc<ServiceWorker>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MediswServer {
    pub fn new(worker: Arc<ServiceWorker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Register the worker: on development hosts check the worker script first, then install and activate."
    )]
    async fn sw_register(&self) -> Result<CallToolResult, McpError> {
        register_impl(&self.worker).await
    }

    #[tool(description = "Unregister the worker: delete every cache store and release controlled clients.")]
    async fn sw_unregister(&self) -> Result<CallToolResult, McpError> {
        unregister_impl(&self.worker).await
    }

    #[tool(description = "Fetch the static manifest into the current versioned cache. Fails, storing nothing, if any entry cannot be fetched.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Activate the installed worker: delete caches from older versions and claim open clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    #[tool(description = "Report worker state, cache stores, open clients and visible notifications.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }

    /// Route a request through the offline cache router.
    ///
    /// Navigations are network-first with an offline page fallback; other
    /// same-origin GETs are cache-first. API calls and non-GETs pass through.
    #[tool(description = "Route a request through the offline router. Returns the response and whether it came from network, cache or a fallback.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache stores with entry counts, or the entry URLs of one store.")]
    async fn sw_caches(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(self.worker.cache(), params.0).await
    }

    #[tool(description = "Delete a cache store, or one entry of it when url is given.")]
    async fn sw_cache_delete(&self, params: Parameters<CacheDeleteParams>) -> Result<CallToolResult, McpError> {
        delete_impl(self.worker.cache(), params.0).await
    }

    #[tool(description = "Deliver a push message. Data must be JSON with title, body and optional url.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Click a notification: close it and focus or open a window at its URL.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for MediswServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "medisw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!(
                "Offline cache worker for {} (cache {}).",
                self.worker.config().base_url,
                self.worker.config().cache_name()
            )),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
