//! Shared fixtures for tool tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use sodalog_core::{AppConfig, CacheDb, CacheRequest, Error, Fetcher, Registration, Response};

/// Answers every path with a small page, or fails when offline.
///
/// `.woff2` paths return bytes that are not valid UTF-8.
#[derive(Default)]
pub struct PageFetcher {
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl PageFetcher {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for PageFetcher {
    async fn fetch(&self, request: &CacheRequest) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }
        let path = request.url.path();
        if path.ends_with(".woff2") {
            return Ok(Response::new(request.url.as_str(), 200, vec![0xff, 0x00, 0xfe])
                .with_header("content-type", "font/woff2"));
        }
        Ok(Response::new(request.url.as_str(), 200, format!("page {path}")).with_header("content-type", "text/html"))
    }
}

pub struct Fixture {
    pub app: AppConfig,
    pub cache: CacheDb,
    pub fetcher: Arc<PageFetcher>,
    pub registration: Arc<Registration>,
}

pub async fn fixture() -> Fixture {
    let cache = CacheDb::open_in_memory().await.unwrap();
    let fetcher = Arc::new(PageFetcher::default());
    let registration = Arc::new(Registration::new(fetcher.clone(), Arc::new(cache.clone())));
    Fixture { app: AppConfig::default(), cache, fetcher, registration }
}

/// Parse the JSON text content of a tool result.
pub fn output_json(result: &CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
