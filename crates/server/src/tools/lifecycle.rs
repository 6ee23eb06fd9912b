//! sw_register, sw_unregister, sw_install, sw_activate and sw_status tool
//! implementations.

use medisw_client::{Notification, ServiceWorker, WindowClient, WorkerState};
use medisw_core::cache::StoreSummary;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Snapshot of the worker for the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusOutput {
    pub state: WorkerState,
    /// Store that is live for the running version.
    pub cache_name: String,
    pub stores: Vec<StoreSummary>,
    pub clients: Vec<WindowClient>,
    /// Notifications shown and not yet clicked.
    pub notifications: Vec<Notification>,
}

/// Check the worker script where needed, then install and activate.
pub async fn register_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let registration = worker.register().await?;
    json_result(&registration)
}

/// Drop every store and stop intercepting requests.
pub async fn unregister_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.unregister().await?;
    json_result(&report)
}

/// Run the install protocol for the current version.
pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&report)
}

/// Run the activation protocol.
pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&report)
}

pub async fn status_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let output = StatusOutput {
        state: worker.state().await,
        cache_name: worker.config().cache_name(),
        stores: worker.cache().store_summaries().await?,
        clients: worker.clients().list().await,
        notifications: worker.notifications().list().await,
    };
    json_result(&output)
}
