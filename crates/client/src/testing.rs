//! Test doubles shared by router and worker tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use medisw_core::{AppConfig, Error, Request, Response};

use crate::config::WorkerConfig;
use crate::fetch::Network;

/// In-memory network keyed by URL that counts every call.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`.
    pub fn route(self, url: &str, response: Response) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), response);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// "METHOD url" for every call, in order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method, request.url));

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }

        let routed = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        Ok(routed.unwrap_or_else(|| Response::new(404, "not found").with_url(request.url.clone())))
    }
}

/// Worker config rooted at `http://localhost:3000/` with store prefix
/// `app-cache` and the given manifest.
pub fn worker_config(manifest: &[&str]) -> WorkerConfig {
    let app = AppConfig {
        cache_prefix: "app-cache".into(),
        static_assets: manifest.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };
    WorkerConfig::from_app_config(&app).unwrap()
}

pub fn html(body: &str) -> Response {
    Response::new(200, body.to_string())
        .with_status_text("OK")
        .with_header("content-type", "text/html")
}

pub fn png(bytes: &[u8]) -> Response {
    Response::new(200, bytes.to_vec())
        .with_status_text("OK")
        .with_header("content-type", "image/png")
}
