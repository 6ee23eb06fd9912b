//! sw_push and sw_notification_click tool implementations.

use medisw_client::ServiceWorker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push message data, expected to be `{"title", "body", "url"?}` JSON.
    pub data: String,
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Id of a notification previously returned by sw_push.
    pub id: u64,
}

/// Deliver a push message and show its notification.
pub async fn push_impl(worker: &ServiceWorker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.handle_push(params.data.as_bytes()).await?;
    json_result(&notification)
}

/// Click a notification: close it and open or focus its window.
pub async fn click_impl(worker: &ServiceWorker, params: SwNotificationClickParams) -> Result<CallToolResult, McpError> {
    let window = worker.handle_notification_click(params.id).await?;
    json_result(&window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{BASE, CannedNetwork, output, worker};
    use medisw_client::{Notification, WindowClient};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_push_and_click() {
        let sw = worker(Arc::new(CannedNetwork::shell())).await;
        sw.start().await.unwrap();

        let params = SwPushParams { data: r#"{"title":"Report approved","body":"Ward 3","url":"/reports/41"}"#.into() };
        let shown: Notification = output(&push_impl(&sw, params).await.unwrap());
        assert_eq!(shown.vibrate, vec![100, 50, 100]);
        assert_eq!(shown.url, "/reports/41");

        let window: WindowClient = output(&click_impl(&sw, SwNotificationClickParams { id: shown.id }).await.unwrap());
        assert_eq!(window.url, format!("{BASE}/reports/41"));
        assert!(window.focused);

        let err = click_impl(&sw, SwNotificationClickParams { id: shown.id }).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_push_rejects_malformed_data() {
        let sw = worker(Arc::new(CannedNetwork::shell())).await;
        let err = push_impl(&sw, SwPushParams { data: "hello".into() }).await.unwrap_err();
        assert_eq!(err.code.0, -32021);
    }
}
