//! Typed router configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::config::{AppConfig, ConfigError};

/// Strategy for static-asset requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AssetStrategy {
    /// Serve from cache when present; store allow-listed types on a miss.
    /// For assets whose filenames do not change with their content.
    CacheFirst,
    /// Always try the network, falling back to the cache when offline.
    /// For bundler-emitted, content-hashed filenames.
    NetworkFirst,
}

/// Everything one router instance needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Name of the generation this router installs and serves.
    pub cache_name: String,
    pub origin: Url,
    /// Shell paths, resolved against `origin` on install.
    pub static_assets: Vec<String>,
    pub offline_path: String,
    /// Lower-case domains without a leading dot.
    pub deny_domains: Vec<String>,
    /// Lower-case extensions without a leading dot.
    pub cacheable_extensions: Vec<String>,
    pub asset_strategy: AssetStrategy,
    pub skip_waiting: bool,
}

impl RouterConfig {
    /// A router for `cache_name` at `origin` with the default shell, deny-list
    /// and extension allow-list.
    pub fn new(cache_name: impl Into<String>, origin: Url) -> Self {
        let defaults = AppConfig::default();
        Self {
            cache_name: cache_name.into(),
            origin,
            static_assets: defaults.static_assets,
            offline_path: defaults.offline_path,
            deny_domains: normalize_domains(&defaults.deny_domains),
            cacheable_extensions: normalize_extensions(&defaults.cacheable_extensions),
            asset_strategy: AssetStrategy::CacheFirst,
            skip_waiting: defaults.skip_waiting,
        }
    }

    /// Build from loaded application configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` without a cache name, and
    /// `ConfigError::Invalid` if validation fails.
    pub fn from_app(app: &AppConfig) -> Result<Self, ConfigError> {
        app.validate()?;
        let cache_name = app.require_cache_name()?.to_string();
        let origin = Url::parse(&app.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;

        Ok(Self {
            cache_name,
            origin,
            static_assets: app.static_assets.clone(),
            offline_path: app.offline_path.clone(),
            deny_domains: normalize_domains(&app.deny_domains),
            cacheable_extensions: normalize_extensions(&app.cacheable_extensions),
            asset_strategy: if app.hashed_assets { AssetStrategy::NetworkFirst } else { AssetStrategy::CacheFirst },
            skip_waiting: app.skip_waiting,
        })
    }

    /// The same configuration for another deployment version.
    pub fn with_cache_name(&self, cache_name: impl Into<String>) -> Self {
        Self { cache_name: cache_name.into(), ..self.clone() }
    }

    pub fn with_static_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.static_assets = assets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_asset_strategy(mut self, strategy: AssetStrategy) -> Self {
        self.asset_strategy = strategy;
        self
    }

    pub fn with_skip_waiting(mut self, skip_waiting: bool) -> Self {
        self.skip_waiting = skip_waiting;
        self
    }

    /// Resolve a shell path against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        self.origin
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    pub fn offline_url(&self) -> Result<Url, Error> {
        self.resolve(&self.offline_path)
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    /// Whether the URL's host is a deny-listed domain or a subdomain of one.
    pub fn is_denied(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.deny_domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Whether the URL path ends in an allow-listed extension. The query
    /// string is not part of the decision.
    pub fn is_cacheable_extension(&self, url: &Url) -> bool {
        let file = url.path().rsplit('/').next().unwrap_or_default();
        match file.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.cacheable_extensions.iter().any(|allowed| *allowed == ext)
            }
            _ => false,
        }
    }
}

fn normalize_domains(domains: &[String]) -> Vec<String> {
    domains
        .iter()
        .map(|d| d.trim().trim_matches('.').to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
