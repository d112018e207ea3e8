//! Test doubles for the network and store capabilities.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use url::Url;

use crate::cache::{CacheDb, CacheStorage};
use crate::request::{CacheRequest, Response};
use crate::{Error, Fetcher};

pub const ORIGIN: &str = "http://localhost:3000";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// Serves canned responses by URL and records every call.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Response>>,
    calls: Mutex<Vec<String>>,
    oversized: Mutex<HashSet<String>>,
    offline: AtomicBool,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `path` under the test origin.
    pub fn with_page(self, path: &str, body: &'static str) -> Self {
        self.route(path, Response::new(url(path).as_str(), 200, body));
        self
    }

    pub fn route(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(url(path).to_string(), response);
    }

    /// Answer `path` with `Error::FetchTooLarge`.
    pub fn set_oversized(&self, path: &str) {
        self.oversized.lock().unwrap().insert(url(path).to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, path: &str) -> usize {
        let target = url(path).to_string();
        self.calls.lock().unwrap().iter().filter(|u| **u == target).count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &CacheRequest) -> Result<Response, Error> {
        let key = request.url.to_string();
        self.calls.lock().unwrap().push(key.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {key}")));
        }
        if self.oversized.lock().unwrap().contains(&key) {
            return Err(Error::FetchTooLarge(key));
        }
        let routed = self.routes.lock().unwrap().get(&key).cloned();
        Ok(routed.unwrap_or_else(|| Response::new(key, 404, "not found")))
    }
}

/// Wraps a real store, recording accesses and injecting failures.
pub struct RecordingStore {
    inner: CacheDb,
    reads: Mutex<Vec<String>>,
    writes: Mutex<Vec<String>>,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl RecordingStore {
    pub async fn new() -> Self {
        Self {
            inner: CacheDb::open_in_memory().await.unwrap(),
            reads: Mutex::default(),
            writes: Mutex::default(),
            fail_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn db(&self) -> &CacheDb {
        &self.inner
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn reset_log(&self) {
        self.reads.lock().unwrap().clear();
        self.writes.lock().unwrap().clear();
    }
}

#[async_trait]
impl CacheStorage for RecordingStore {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        self.inner.open(generation).await
    }

    async fn put(&self, generation: &str, request: &CacheRequest, response: &Response) -> Result<(), Error> {
        self.writes.lock().unwrap().push(request.url.to_string());
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed));
        }
        self.inner.put(generation, request, response).await
    }

    async fn put_all(&self, generation: &str, entries: &[(CacheRequest, Response)]) -> Result<(), Error> {
        self.writes
            .lock()
            .unwrap()
            .extend(entries.iter().map(|(request, _)| request.url.to_string()));
        self.inner.put_all(generation, entries).await
    }

    async fn lookup(&self, generation: &str, request: &CacheRequest) -> Result<Option<Response>, Error> {
        self.reads.lock().unwrap().push(request.url.to_string());
        self.inner.lookup(generation, request).await
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        self.inner.names().await
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed));
        }
        self.inner.delete(generation).await
    }
}
