//! Window clients controlled by the worker.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

/// An open page the worker knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WindowClient {
    pub id: u64,
    pub url: String,
    pub focused: bool,
    /// Cache version tag of the worker controlling this page, if any.
    pub controller: Option<String>,
}

/// Registry of open window clients.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    next_id: AtomicU64,
    clients: RwLock<Vec<WindowClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page that loaded without a controlling worker.
    pub async fn register(&self, url: &Url) -> WindowClient {
        let client = WindowClient {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            url: url.to_string(),
            focused: false,
            controller: None,
        };
        self.clients.write().await.push(client.clone());
        client
    }

    /// Take control of every open client. Returns how many changed hands.
    pub async fn claim(&self, controller: &str) -> usize {
        let mut clients = self.clients.write().await;
        let mut claimed = 0;
        for client in clients.iter_mut() {
            if client.controller.as_deref() != Some(controller) {
                client.controller = Some(controller.to_string());
                claimed += 1;
            }
        }
        claimed
    }

    /// Focus the client already showing `url`, or open a new focused one.
    pub async fn open_window(&self, url: &Url, controller: Option<&str>) -> WindowClient {
        let mut clients = self.clients.write().await;
        for client in clients.iter_mut() {
            client.focused = false;
        }

        if let Some(existing) = clients.iter_mut().find(|c| c.url == url.as_str()) {
            existing.focused = true;
            tracing::debug!(id = existing.id, %url, "focused existing window");
            return existing.clone();
        }

        let client = WindowClient {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            url: url.to_string(),
            focused: true,
            controller: controller.map(String::from),
        };
        tracing::debug!(id = client.id, %url, "opened window");
        clients.push(client.clone());
        client
    }

    /// Drop control of every client. Returns how many were controlled.
    pub async fn release(&self) -> usize {
        let mut clients = self.clients.write().await;
        let mut released = 0;
        for client in clients.iter_mut() {
            if client.controller.take().is_some() {
                released += 1;
            }
        }
        released
    }

    /// Whether any open page is controlled by a worker.
    pub async fn any_controlled(&self) -> bool {
        self.clients.read().await.iter().any(|c| c.controller.is_some())
    }

    pub async fn list(&self) -> Vec<WindowClient> {
        self.clients.read().await.clone()
    }
}
