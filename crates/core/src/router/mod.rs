//! Offline cache router.
//!
//! A `CacheRouter` owns one named cache generation. The hosting runtime wires
//! three entry points to its own event system:
//!
//! - `handle_install`: fetch the shell manifest into a fresh generation,
//!   all-or-nothing
//! - `handle_activate`: delete every other generation
//! - `handle_fetch`: classify a request and resolve it from network, cache or
//!   the offline page
//!
//! Lifecycle: `Uninstalled -> Installing -> Waiting -> Activating -> Active`.
//! A failed install returns to `Uninstalled`.

pub mod classify;
pub mod config;
pub mod registration;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{join_all, try_join_all};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;

use crate::Error;
use crate::cache::CacheStorage;
use crate::fetcher::Fetcher;
use crate::request::{CacheRequest, Response};

pub use classify::{BypassReason, RequestClass, bypass_reason, classify};
pub use config::{AssetStrategy, RouterConfig};
pub use registration::{RegisterOutcome, Registration, RegistrationStatus, RouterStatus};

/// Lifecycle state of a router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    Waiting,
    Activating,
    Active,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Uninstalled => "uninstalled",
            LifecycleState::Installing => "installing",
            LifecycleState::Waiting => "waiting",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
    /// Not intercepted; fetched directly by the host.
    Passthrough,
}

/// A response resolved for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source }
    }

    pub fn passthrough(response: Response) -> Self {
        Self::new(response, ResponseSource::Passthrough)
    }
}

/// Outcome of the fetch hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// The router does not handle this request; the host fetches it as usual.
    Passthrough,
    Respond(Served),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub generation: String,
    pub entries: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ActivationReport {
    pub generation: String,
    /// Stale generations removed.
    pub deleted: Vec<String>,
    /// Stale generations whose deletion failed; a later activation retries them.
    pub failed: Vec<String>,
}

/// Request interceptor bound to one cache generation.
pub struct CacheRouter {
    config: RouterConfig,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn CacheStorage>,
    state: RwLock<LifecycleState>,
    skip_waiting: AtomicBool,
    /// Opportunistic writes still in flight. Dropping the router aborts them.
    pending: Mutex<JoinSet<()>>,
}

impl CacheRouter {
    pub fn new(config: RouterConfig, fetcher: Arc<dyn Fetcher>, store: Arc<dyn CacheStorage>) -> Self {
        let skip_waiting = AtomicBool::new(config.skip_waiting);
        Self {
            config,
            fetcher,
            store,
            state: RwLock::new(LifecycleState::Uninstalled),
            skip_waiting,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Ask to be promoted as soon as install completes.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn wants_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    async fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(Error::InvalidState(format!(
                "{}: cannot enter {to} from {}, expected {from}",
                self.config.cache_name, *state
            )));
        }
        *state = to;
        Ok(())
    }

    async fn set_state(&self, to: LifecycleState) {
        *self.state.write().await = to;
    }

    /// Fetch every shell URL and store them into this router's generation.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any manifest entry fails to fetch or
    /// answers with a non-2xx status; nothing is stored in that case.
    pub async fn handle_install(&self) -> Result<InstallReport, Error> {
        self.transition(LifecycleState::Uninstalled, LifecycleState::Installing)
            .await?;

        match self.populate_shell().await {
            Ok(entries) => {
                self.set_state(LifecycleState::Waiting).await;
                tracing::info!(generation = %self.config.cache_name, entries, "installed shell");
                Ok(InstallReport { generation: self.config.cache_name.clone(), entries })
            }
            Err(e) => {
                self.set_state(LifecycleState::Uninstalled).await;
                tracing::warn!(generation = %self.config.cache_name, error = %e, "install aborted");
                Err(e)
            }
        }
    }

    async fn populate_shell(&self) -> Result<usize, Error> {
        let requests = self
            .config
            .static_assets
            .iter()
            .map(|path| self.config.resolve(path).map(CacheRequest::get))
            .collect::<Result<Vec<_>, _>>()?;

        let fetches = requests.into_iter().map(|request| async move {
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed { url: request.url.to_string(), reason: e.to_string() })?;
            if !response.is_ok() {
                return Err(Error::InstallFailed {
                    url: request.url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            Ok((request, response))
        });
        let entries = try_join_all(fetches).await?;

        self.store.put_all(&self.config.cache_name, &entries).await?;
        Ok(entries.len())
    }

    /// Delete every generation other than this router's and become active.
    ///
    /// Cleanup is best-effort: failures are reported, never fatal.
    pub async fn handle_activate(&self) -> Result<ActivationReport, Error> {
        self.transition(LifecycleState::Waiting, LifecycleState::Activating)
            .await?;

        let mut report = ActivationReport { generation: self.config.cache_name.clone(), ..Default::default() };

        match self.store.names().await {
            Ok(names) => {
                let stale: Vec<String> = names
                    .into_iter()
                    .filter(|name| *name != self.config.cache_name)
                    .collect();
                let results = join_all(stale.iter().map(|name| self.store.delete(name))).await;
                for (name, result) in stale.into_iter().zip(results) {
                    match result {
                        Ok(_) => report.deleted.push(name),
                        Err(e) => {
                            tracing::warn!(generation = %name, error = %e, "failed to delete stale generation");
                            report.failed.push(name);
                        }
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to enumerate generations; skipping cleanup"),
        }

        self.set_state(LifecycleState::Active).await;
        tracing::info!(
            generation = %self.config.cache_name,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "activated"
        );
        Ok(report)
    }

    /// Resolve an intercepted request.
    ///
    /// A router that is not active intercepts nothing.
    pub async fn handle_fetch(&self, request: &CacheRequest) -> Result<Interception, Error> {
        if self.state().await != LifecycleState::Active {
            return Ok(Interception::Passthrough);
        }

        let served = match classify(&self.config, request) {
            RequestClass::NonCacheable => {
                tracing::debug!(url = %request.url, reason = ?bypass_reason(&self.config, request), "bypass");
                return Ok(Interception::Passthrough);
            }
            RequestClass::Navigation => self.serve_navigation(request).await?,
            RequestClass::StaticAsset => match self.config.asset_strategy {
                AssetStrategy::CacheFirst => self.serve_cache_first(request).await?,
                AssetStrategy::NetworkFirst => self.serve_network_first(request).await?,
            },
        };

        Ok(Interception::Respond(served))
    }

    /// Network-first with cache, then offline-page fallback on network
    /// failures; other fetch errors propagate. The store write
    /// completes before the response is returned.
    async fn serve_navigation(&self, request: &CacheRequest) -> Result<Served, Error> {
        let err = match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok()
                    && let Err(e) = self.store.put(&self.config.cache_name, request, &response).await
                {
                    tracing::warn!(url = %request.url, error = %e, "failed to store navigation response");
                }
                return Ok(Served::new(response, ResponseSource::Network));
            }
            Err(e) if e.is_network() => e,
            Err(e) => return Err(e),
        };
        tracing::debug!(url = %request.url, error = %err, "network unavailable, trying cache");

        if let Some(cached) = self.cached(request).await {
            tracing::debug!(url = %request.url, "navigation served from cache");
            return Ok(Served::new(cached, ResponseSource::Cache));
        }

        let offline = CacheRequest::get(self.config.offline_url()?);
        if let Some(page) = self.cached(&offline).await {
            tracing::debug!(url = %request.url, "navigation served offline page");
            return Ok(Served::new(page, ResponseSource::OfflineFallback));
        }

        Err(err)
    }

    async fn serve_cache_first(&self, request: &CacheRequest) -> Result<Served, Error> {
        if let Some(cached) = self.cached(request).await {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(Served::new(cached, ResponseSource::Cache));
        }

        let response = self.fetcher.fetch(request).await?;
        if response.is_ok() && self.config.is_cacheable_extension(&request.url) {
            self.store_in_background(request.clone(), response.clone()).await;
        }
        Ok(Served::new(response, ResponseSource::Network))
    }

    async fn serve_network_first(&self, request: &CacheRequest) -> Result<Served, Error> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store_in_background(request.clone(), response.clone()).await;
                }
                Ok(Served::new(response, ResponseSource::Network))
            }
            Err(err) if !err.is_network() => Err(err),
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "network unavailable, trying cache");
                match self.cached(request).await {
                    Some(cached) => Ok(Served::new(cached, ResponseSource::Cache)),
                    None => Err(err),
                }
            }
        }
    }

    /// Look up a request in this router's generation. Store errors count as
    /// a miss.
    async fn cached(&self, request: &CacheRequest) -> Option<Response> {
        match self.store.lookup(&self.config.cache_name, request).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Write a copy without holding up the caller.
    async fn store_in_background(&self, request: CacheRequest, response: Response) {
        let store = Arc::clone(&self.store);
        let generation = self.config.cache_name.clone();
        let mut pending = self.pending.lock().await;
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            if let Err(e) = store.put(&generation, &request, &response).await {
                tracing::warn!(url = %request.url, error = %e, "failed to store response");
            }
        });
    }

    /// Wait for every opportunistic write issued so far.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.pending.lock().await);
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "cache write task did not complete");
            }
        }
    }
}
