//! Network-first and cache-first strategies.

use medisw_core::{Destination, Request, Response, ResponseType};
use url::Url;

use super::{CacheRouter, RequestClass, ResponseSource, RoutedResponse};

const NETWORK_ERROR_BODY: &str = "Network error happened";

/// The response handed back when an intercepted request cannot reach the
/// network and no cached fallback applies.
pub fn network_error_response() -> Response {
    Response::new(408, NETWORK_ERROR_BODY)
        .with_status_text("Request Timeout")
        .with_header("Content-Type", "text/plain")
}

/// Only complete same-origin responses within the size limit are written
/// to the cache.
fn is_cacheable(response: &Response, max_bytes: usize) -> bool {
    response.status == 200 && response.response_type == ResponseType::Basic && response.body.len() <= max_bytes
}

fn routed(class: RequestClass, source: ResponseSource, response: Response) -> RoutedResponse {
    RoutedResponse { class, source, response }
}

impl CacheRouter {
    /// Single network attempt; the cached offline page if it fails.
    pub(super) async fn network_first(&self, request: &Request) -> RoutedResponse {
        let class = RequestClass::Navigation;
        match self.network.fetch(request).await {
            Ok(response) => routed(class, ResponseSource::Network, response),
            Err(e) => {
                tracing::info!(url = %request.url, "navigation failed, serving offline page: {}", e);
                match self.cached(&self.config.offline_page).await {
                    Some(page) => routed(class, ResponseSource::OfflineFallback, page),
                    None => {
                        tracing::warn!(offline_page = %self.config.offline_page, "offline page is not cached");
                        routed(class, ResponseSource::Synthesized, network_error_response())
                    }
                }
            }
        }
    }

    /// Cache lookup first; on a miss fetch, write valid responses back,
    /// and fall back to the placeholder image or a 408.
    pub(super) async fn cache_first(&self, request: &Request) -> RoutedResponse {
        let class = RequestClass::Asset;
        match self.cache.match_any(request).await {
            Ok(Some(hit)) => return routed(class, ResponseSource::Cache, hit),
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, "cache lookup failed, treating as miss: {}", e),
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if is_cacheable(&response, self.config.max_entry_bytes) {
                    self.cache_in_background(request.clone(), response.clone()).await;
                }
                routed(class, ResponseSource::Network, response)
            }
            Err(e) => {
                tracing::error!(url = %request.url, "fetch failed: {}", e);

                if request.destination == Destination::Image
                    && let Some(image) = self.cached(&self.config.placeholder_image).await
                {
                    return routed(class, ResponseSource::Placeholder, image);
                }

                routed(class, ResponseSource::Synthesized, network_error_response())
            }
        }
    }

    /// Cached GET response for `url` from any live store.
    async fn cached(&self, url: &Url) -> Option<Response> {
        match self.cache.match_any(&Request::get(url.clone())).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(%url, "cache lookup failed: {}", e);
                None
            }
        }
    }

    /// Write `response` into the current store without holding up the caller.
    async fn cache_in_background(&self, request: Request, response: Response) {
        let store = self.cache.store(&self.config.cache_name());
        let mut pending = self.pending.lock().await;
        while pending.try_join_next().is_some() {}

        pending.spawn(async move {
            match store.put(&request, &response).await {
                Ok(()) => tracing::debug!(url = %request.url, store = store.name(), "cached response"),
                Err(e) => tracing::warn!(url = %request.url, "failed to cache response: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use medisw_core::{CacheDb, Error};

    use super::*;
    use crate::config::WorkerConfig;
    use crate::testing::{StubNetwork, html, png, worker_config};

    const BASE: &str = "http://localhost:3000";

    struct Harness {
        router: CacheRouter,
        network: Arc<StubNetwork>,
        db: CacheDb,
        config: Arc<WorkerConfig>,
    }

    async fn harness(network: StubNetwork) -> Harness {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(network);
        let config = Arc::new(worker_config(&["./index.html", "./offline.html", "./logo192.png"]));
        let router = CacheRouter::new(config.clone(), db.clone(), network.clone());
        Harness { router, network, db, config }
    }

    fn url(path: &str) -> Url {
        Url::parse(&format!("{BASE}{path}")).unwrap()
    }

    async fn seed(h: &Harness, path: &str, response: Response) {
        h.db.store(&h.config.cache_name())
            .put(&Request::get(url(path)), &response)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_asset_miss_is_fetched_and_cached() {
        let h = harness(StubNetwork::new().route(&format!("{BASE}/static/js/main.js"), html("console.log(1)"))).await;
        let request = Request::get(url("/static/js/main.js")).with_destination(Destination::Script);

        let first = h.router.handle(request.clone()).await.unwrap();
        assert_eq!(first.class, RequestClass::Asset);
        assert_eq!(first.source, ResponseSource::Network);
        h.router.settle().await;

        let second = h.router.handle(request).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.body, first.response.body);
        assert_eq!(h.network.calls(), 1);

        let keys = h.db.store("app-cache-v2").keys().await.unwrap();
        assert_eq!(keys, vec![format!("{BASE}/static/js/main.js")]);
    }

    #[tokio::test]
    async fn test_asset_hit_never_touches_network() {
        let h = harness(StubNetwork::new()).await;
        seed(&h, "/offline.html", html("offline")).await;

        let routed = h.router.handle(Request::get(url("/offline.html"))).await.unwrap();
        assert_eq!(routed.source, ResponseSource::Cache);
        assert_eq!(routed.response.body, Bytes::from_static(b"offline"));
        assert_eq!(h.network.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_200_is_returned_but_not_cached() {
        let h = harness(StubNetwork::new()).await;
        let request = Request::get(url("/missing.css"));

        let routed = h.router.handle(request.clone()).await.unwrap();
        assert_eq!(routed.response.status, 404);
        assert_eq!(routed.source, ResponseSource::Network);
        h.router.settle().await;

        h.router.handle(request).await.unwrap();
        assert_eq!(h.network.calls(), 2);
        assert!(h.db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_opaque_response_is_not_cached() {
        let opaque = html("tracking pixel").with_type(ResponseType::Opaque);
        let h = harness(StubNetwork::new().route(&format!("{BASE}/pixel.gif"), opaque)).await;

        let routed = h.router.handle(Request::get(url("/pixel.gif"))).await.unwrap();
        assert_eq!(routed.response.response_type, ResponseType::Opaque);
        h.router.settle().await;

        assert!(h.db.match_any(&Request::get(url("/pixel.gif"))).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_navigation_prefers_network() {
        let h = harness(StubNetwork::new().route(&format!("{BASE}/reports"), html("live reports"))).await;
        seed(&h, "/reports", html("stale reports")).await;

        let routed = h.router.handle(Request::navigate(url("/reports"))).await.unwrap();
        assert_eq!(routed.class, RequestClass::Navigation);
        assert_eq!(routed.source, ResponseSource::Network);
        assert_eq!(routed.response.body, Bytes::from_static(b"live reports"));
    }

    #[tokio::test]
    async fn test_navigation_offline_serves_offline_page() {
        let h = harness(StubNetwork::new()).await;
        seed(&h, "/offline.html", html("<h1>You are offline</h1>")).await;
        h.network.set_offline(true);

        let routed = h.router.handle(Request::navigate(url("/dashboard"))).await.unwrap();
        let stored = h.db.match_any(&Request::get(url("/offline.html"))).await.unwrap().unwrap();
        assert_eq!(routed.source, ResponseSource::OfflineFallback);
        assert_eq!(routed.response, stored);
        assert_eq!(h.network.calls(), 1);
    }

    #[tokio::test]
    async fn test_navigation_offline_without_offline_page() {
        let h = harness(StubNetwork::new()).await;
        h.network.set_offline(true);

        let routed = h.router.handle(Request::navigate(url("/dashboard"))).await.unwrap();
        assert_eq!(routed.source, ResponseSource::Synthesized);
        assert_eq!(routed.response.status, 408);
    }

    #[tokio::test]
    async fn test_image_failure_serves_placeholder() {
        let h = harness(StubNetwork::new()).await;
        seed(&h, "/logo192.png", png(&[0x89, b'P', b'N', b'G'])).await;
        h.network.set_offline(true);

        let request = Request::get(url("/uploads/facility-7.jpg")).with_destination(Destination::Image);
        let routed = h.router.handle(request).await.unwrap();
        let stored = h.db.match_any(&Request::get(url("/logo192.png"))).await.unwrap().unwrap();
        assert_eq!(routed.source, ResponseSource::Placeholder);
        assert_eq!(routed.response, stored);
    }

    #[tokio::test]
    async fn test_other_failure_is_408() {
        let h = harness(StubNetwork::new()).await;
        seed(&h, "/logo192.png", png(b"png")).await;
        h.network.set_offline(true);

        let request = Request::get(url("/static/css/main.css")).with_destination(Destination::Style);
        let routed = h.router.handle(request).await.unwrap();
        assert_eq!(routed.source, ResponseSource::Synthesized);
        assert_eq!(routed.response.status, 408);
        assert_eq!(routed.response.content_type(), Some("text/plain"));
        assert_eq!(routed.response.body, Bytes::from_static(NETWORK_ERROR_BODY.as_bytes()));
    }

    #[tokio::test]
    async fn test_non_get_bypasses_cache() {
        let h = harness(StubNetwork::new().route(&format!("{BASE}/index.html"), html("from network"))).await;
        seed(&h, "/index.html", html("from cache")).await;

        let request = Request::get(url("/index.html")).with_method("POST").with_body("x=1");
        let routed = h.router.handle(request).await.unwrap();
        assert_eq!(routed.class, RequestClass::NonGetPassthrough);
        assert_eq!(routed.response.body, Bytes::from_static(b"from network"));
        assert_eq!(h.network.seen(), vec![format!("POST {BASE}/index.html")]);
    }

    #[tokio::test]
    async fn test_passthrough_surfaces_network_error() {
        let h = harness(StubNetwork::new()).await;
        seed(&h, "/index.html", html("from cache")).await;
        h.network.set_offline(true);

        let request = Request::get(url("/index.html")).with_method("PUT");
        let result = h.router.handle(request).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_api_is_never_cached() {
        let api = format!("{BASE}/api/facilities");
        let h = harness(StubNetwork::new().route(&api, html("[]").with_header("content-type", "application/json")))
            .await;

        for _ in 0..2 {
            let routed = h.router.handle(Request::get(url("/api/facilities"))).await.unwrap();
            assert_eq!(routed.class, RequestClass::ApiPassthrough);
            assert_eq!(routed.source, ResponseSource::Network);
        }
        h.router.settle().await;

        assert_eq!(h.network.calls(), 2);
        assert!(h.db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cross_origin_goes_straight_to_network() {
        let cdn = "https://cdn.example.com/roboto.woff2";
        let h = harness(StubNetwork::new().route(cdn, png(b"font"))).await;

        let routed = h.router.handle(Request::get(Url::parse(cdn).unwrap())).await.unwrap();
        assert_eq!(routed.class, RequestClass::CrossOriginIgnored);
        assert_eq!(routed.source, ResponseSource::Network);
        h.router.settle().await;
        assert!(h.db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_asset_is_served_but_not_cached() {
        let bundle = html(&"x".repeat(64));
        let h = harness(StubNetwork::new().route(&format!("{BASE}/static/js/vendor.js"), bundle)).await;
        let mut config = (*h.config).clone();
        config.max_entry_bytes = 32;
        let router = CacheRouter::new(Arc::new(config), h.db.clone(), h.network.clone());
        let request = Request::get(url("/static/js/vendor.js")).with_destination(Destination::Script);

        let routed = router.handle(request.clone()).await.unwrap();
        assert_eq!(routed.response.status, 200);
        assert_eq!(routed.source, ResponseSource::Network);
        assert_eq!(routed.response.body.len(), 64);
        router.settle().await;

        assert!(h.db.match_any(&request).await.unwrap().is_none());
        router.handle(request).await.unwrap();
        assert_eq!(h.network.calls(), 2);
    }

    #[tokio::test]
    async fn test_settle_does_not_hold_up_new_writes() {
        let h = harness(StubNetwork::new().route(&format!("{BASE}/static/js/chunk.js"), html("chunk"))).await;
        let (release, released) = tokio::sync::oneshot::channel::<()>();
        h.router.pending.lock().await.spawn(async move {
            let _ = released.await;
        });

        let settle = h.router.settle();
        tokio::pin!(settle);
        assert!(futures_util::poll!(settle.as_mut()).is_pending());

        let routed = tokio::time::timeout(Duration::from_secs(5), h.router.handle(Request::get(url("/static/js/chunk.js"))))
            .await
            .expect("asset miss must not wait for settle")
            .unwrap();
        assert_eq!(routed.source, ResponseSource::Network);

        let _ = release.send(());
        settle.await;
        h.router.settle().await;
        assert!(h.db.match_any(&Request::get(url("/static/js/chunk.js"))).await.unwrap().is_some());
    }

    #[test]
    fn test_is_cacheable() {
        assert!(is_cacheable(&Response::new(200, ""), 10));
        assert!(!is_cacheable(&Response::new(200, "too long"), 4));
        assert!(!is_cacheable(&Response::new(206, ""), 10));
        assert!(!is_cacheable(&Response::new(200, "").with_type(ResponseType::Cors), 10));
        assert!(!is_cacheable(&Response::new(200, "").with_type(ResponseType::Opaque), 10));
    }
}
