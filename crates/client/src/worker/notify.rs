//! Push messages and the notifications they raise.

use std::sync::atomic::{AtomicU64, Ordering};

use medisw_core::Error;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Vibration pattern for every notification, in milliseconds.
pub const VIBRATION_PATTERN: [u32; 3] = [100, 50, 100];

/// URL opened on click when the push did not carry one.
pub const DEFAULT_CLICK_URL: &str = "./";

/// JSON body of a push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl PushPayload {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(data).map_err(|e| Error::PushPayload(e.to_string()))
    }
}

/// A notification currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    /// Where a click should take the user.
    pub url: String,
    pub shown_at: String,
}

/// Notifications shown and not yet closed.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    next_id: AtomicU64,
    shown: RwLock<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a notification for `payload` with the given icon and badge.
    pub async fn show(&self, payload: PushPayload, icon: &str, badge: &str) -> Notification {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: payload.title,
            body: payload.body,
            icon: icon.to_string(),
            badge: badge.to_string(),
            vibrate: VIBRATION_PATTERN.to_vec(),
            url: payload.url.unwrap_or_else(|| DEFAULT_CLICK_URL.to_string()),
            shown_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        };
        tracing::info!(id = notification.id, title = %notification.title, "showing notification");
        self.shown.write().await.push(notification.clone());
        notification
    }

    /// Close and return the notification with `id`.
    pub async fn close(&self, id: u64) -> Option<Notification> {
        let mut shown = self.shown.write().await;
        let index = shown.iter().position(|n| n.id == id)?;
        Some(shown.remove(index))
    }

    pub async fn list(&self) -> Vec<Notification> {
        self.shown.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        let payload =
            PushPayload::parse(br#"{"title":"Report approved","body":"May report for Ward 3","url":"/reports/41"}"#)
                .unwrap();
        assert_eq!(payload.title, "Report approved");
        assert_eq!(payload.url.as_deref(), Some("/reports/41"));
    }

    #[test]
    fn test_parse_payload_without_url() {
        let payload = PushPayload::parse(br#"{"title":"Reminder","body":"Submit monthly data"}"#).unwrap();
        assert!(payload.url.is_none());
    }

    #[test]
    fn test_parse_payload_rejects_bad_json() {
        assert!(matches!(PushPayload::parse(b"not json"), Err(Error::PushPayload(_))));
        assert!(matches!(PushPayload::parse(br#"{"body":"no title"}"#), Err(Error::PushPayload(_))));
    }

    #[tokio::test]
    async fn test_show_uses_defaults() {
        let center = NotificationCenter::new();
        let payload = PushPayload { title: "Reminder".into(), body: "Submit data".into(), url: None };

        let shown = center.show(payload, "./logo192.png", "./favicon.ico").await;
        assert_eq!(shown.url, DEFAULT_CLICK_URL);
        assert_eq!(shown.vibrate, vec![100, 50, 100]);
        assert_eq!(shown.icon, "./logo192.png");
        assert_eq!(center.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_close() {
        let center = NotificationCenter::new();
        let payload = PushPayload { title: "t".into(), body: "b".into(), url: Some("/x".into()) };
        let shown = center.show(payload, "i", "b").await;

        assert_eq!(center.close(shown.id).await.map(|n| n.url), Some("/x".to_string()));
        assert!(center.close(shown.id).await.is_none());
        assert!(center.list().await.is_empty());
    }
}
