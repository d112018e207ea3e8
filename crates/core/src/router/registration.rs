//! Deployment rollover across router versions.
//!
//! A `Registration` holds the router that currently controls clients and, at
//! most, one installed router waiting to take over. Install and activate steps
//! are serialized; request handling never waits on them and keeps using the
//! active router until the swap.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use super::{ActivationReport, CacheRouter, InstallReport, Interception, LifecycleState, RouterConfig, Served};
use crate::Error;
use crate::cache::CacheStorage;
use crate::fetcher::Fetcher;
use crate::request::CacheRequest;

/// Result of registering a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RegisterOutcome {
    /// The version is already active or waiting.
    Unchanged { generation: String },
    /// Installed; waiting for `activate_waiting`.
    Waiting { install: InstallReport },
    /// Installed, activated, and in control of clients.
    Activated { install: InstallReport, activation: ActivationReport },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct RouterStatus {
    pub generation: String,
    pub state: LifecycleState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct RegistrationStatus {
    pub active: Option<RouterStatus>,
    pub waiting: Option<RouterStatus>,
}

/// The hosting runtime's registration slot.
pub struct Registration {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn CacheStorage>,
    active: RwLock<Option<Arc<CacheRouter>>>,
    waiting: Mutex<Option<Arc<CacheRouter>>>,
    lifecycle: Mutex<()>,
}

impl Registration {
    pub fn new(fetcher: Arc<dyn Fetcher>, store: Arc<dyn CacheStorage>) -> Self {
        Self {
            fetcher,
            store,
            active: RwLock::new(None),
            waiting: Mutex::new(None),
            lifecycle: Mutex::new(()),
        }
    }

    /// Install a router for `config` next to the active one.
    ///
    /// On install failure the active router keeps serving and any waiting
    /// router stays parked.
    pub async fn register(&self, config: RouterConfig) -> Result<RegisterOutcome, Error> {
        let _lifecycle = self.lifecycle.lock().await;

        let version = config.cache_name.clone();
        let known = self.active_router().await.is_some_and(|r| r.cache_name() == version)
            || self.waiting.lock().await.as_ref().is_some_and(|r| r.cache_name() == version);
        if known {
            tracing::debug!(generation = %version, "version already registered");
            return Ok(RegisterOutcome::Unchanged { generation: version });
        }

        let router = Arc::new(CacheRouter::new(config, Arc::clone(&self.fetcher), Arc::clone(&self.store)));
        let install = router.handle_install().await?;

        // a newer install supersedes whatever was parked
        let superseded = self.waiting.lock().await.take();
        if let Some(old) = superseded {
            tracing::info!(generation = %old.cache_name(), "waiting router superseded");
        }

        if router.wants_skip_waiting() {
            let activation = self.promote(router).await?;
            Ok(RegisterOutcome::Activated { install, activation })
        } else {
            *self.waiting.lock().await = Some(router);
            Ok(RegisterOutcome::Waiting { install })
        }
    }

    /// Promote the waiting router, e.g. once every context it would disturb
    /// has closed.
    pub async fn activate_waiting(&self) -> Result<ActivationReport, Error> {
        let _lifecycle = self.lifecycle.lock().await;

        let router = self
            .waiting
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::InvalidState("no router is waiting".into()))?;
        self.promote(router).await
    }

    async fn promote(&self, router: Arc<CacheRouter>) -> Result<ActivationReport, Error> {
        let activation = router.handle_activate().await?;

        // claim: every later request routes through the new generation
        let previous = self.active.write().await.replace(router);
        if let Some(previous) = previous {
            tracing::info!(
                from = %previous.cache_name(),
                to = %activation.generation,
                "clients claimed by new generation"
            );
        }
        Ok(activation)
    }

    pub async fn active_router(&self) -> Option<Arc<CacheRouter>> {
        self.active.read().await.clone()
    }

    pub async fn waiting_router(&self) -> Option<Arc<CacheRouter>> {
        self.waiting.lock().await.clone()
    }

    pub async fn status(&self) -> RegistrationStatus {
        async fn describe(router: Option<Arc<CacheRouter>>) -> Option<RouterStatus> {
            let router = router?;
            Some(RouterStatus { generation: router.cache_name().to_string(), state: router.state().await })
        }

        RegistrationStatus {
            active: describe(self.active_router().await).await,
            waiting: describe(self.waiting_router().await).await,
        }
    }

    /// Dispatch a request the way the hosting runtime would: through the
    /// active router when one intercepts it, straight to the network otherwise.
    pub async fn fetch(&self, request: &CacheRequest) -> Result<Served, Error> {
        if let Some(router) = self.active_router().await
            && let Interception::Respond(served) = router.handle_fetch(request).await?
        {
            return Ok(served);
        }
        self.fetcher.fetch(request).await.map(Served::passthrough)
    }

    /// Wait for the active router's opportunistic writes.
    pub async fn settle(&self) {
        if let Some(router) = self.active_router().await {
            router.settle().await;
        }
    }
}
