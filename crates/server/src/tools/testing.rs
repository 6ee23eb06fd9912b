//! Fixtures for tool tests: a worker over an in-memory cache and a canned network.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use medisw_client::{Network, ServiceWorker, WorkerConfig};
use medisw_core::{AppConfig, CacheDb, Error, Request, Response};
use rmcp::model::CallToolResult;

pub const BASE: &str = "http://localhost:3000";

#[derive(Default)]
pub struct CannedNetwork {
    routes: HashMap<String, Response>,
    offline: AtomicBool,
}

impl CannedNetwork {
    pub fn shell() -> Self {
        let mut routes = HashMap::new();
        for (path, body, ct) in [
            ("/index.html", "<div id=root></div>", "text/html"),
            ("/offline.html", "<h1>Offline</h1>", "text/html"),
            ("/logo192.png", "PNG", "image/png"),
            ("/api/reports", r#"{"reports":[]}"#, "application/json"),
            ("/service-worker.js", "self.skipWaiting()", "application/javascript"),
        ] {
            let response = Response::new(200, body.to_string())
                .with_status_text("OK")
                .with_header("content-type", ct);
            routes.insert(format!("{BASE}{path}"), response);
        }
        Self { routes, offline: AtomicBool::new(false) }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Network for CannedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }
        Ok(self
            .routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found")))
    }
}

/// Worker whose manifest is the index and offline pages.
pub async fn worker(network: Arc<CannedNetwork>) -> Arc<ServiceWorker> {
    let app = AppConfig {
        cache_prefix: "app-cache".into(),
        static_assets: vec!["./index.html".into(), "./offline.html".into()],
        ..Default::default()
    };
    let config = WorkerConfig::from_app_config(&app).unwrap();
    let db = CacheDb::open_in_memory().await.unwrap();
    Arc::new(ServiceWorker::new(config, db, network))
}

/// Parse the JSON text a tool returned.
pub fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
