//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SODALOG_SW_*)
//! 2. TOML config file (if SODALOG_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SODALOG_SW_*)
/// 2. TOML config file (if SODALOG_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the cache generation for the current deployment.
    ///
    /// Set via SODALOG_SW_CACHE_NAME by the deploy pipeline. It must change on
    /// every deployment that changes cached content.
    #[serde(default)]
    pub cache_name: Option<String>,

    /// Origin the application is served from.
    ///
    /// Set via SODALOG_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Shell URLs pre-populated on install, in order.
    ///
    /// Set via SODALOG_SW_STATIC_ASSETS environment variable (comma-separated).
    #[serde(default = "default_static_assets", deserialize_with = "string_list")]
    pub static_assets: Vec<String>,

    /// Path of the offline fallback page. Must be one of `static_assets`.
    ///
    /// Set via SODALOG_SW_OFFLINE_PATH environment variable.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// External service domains that are never intercepted.
    ///
    /// Set via SODALOG_SW_DENY_DOMAINS environment variable (comma-separated).
    #[serde(default = "default_deny_domains", deserialize_with = "string_list")]
    pub deny_domains: Vec<String>,

    /// File extensions eligible for opportunistic cache-first storage.
    ///
    /// Set via SODALOG_SW_CACHEABLE_EXTENSIONS environment variable (comma-separated).
    #[serde(default = "default_cacheable_extensions", deserialize_with = "string_list")]
    pub cacheable_extensions: Vec<String>,

    /// Whether built assets carry content hashes in their filenames.
    ///
    /// Selects network-first for static assets when true, cache-first otherwise.
    /// Set via SODALOG_SW_HASHED_ASSETS environment variable.
    #[serde(default)]
    pub hashed_assets: bool,

    /// Promote a freshly installed generation without waiting for open
    /// contexts to close.
    ///
    /// Set via SODALOG_SW_SKIP_WAITING environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Path to SQLite cache database.
    ///
    /// Set via SODALOG_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SODALOG_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SODALOG_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SODALOG_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_static_assets() -> Vec<String> {
    [
        "/dashboard/",
        "/new/",
        "/timeline/",
        "/analysis/",
        "/settings/",
        "/compare/",
        "/plots/",
        "/weather/",
        "/export/",
        "/manifest.json",
        "/icon-192.svg",
        "/icon-512.svg",
        "/offline/",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_path() -> String {
    "/offline/".into()
}

fn default_deny_domains() -> Vec<String> {
    [
        "firebaseapp.com",
        "googleapis.com",
        "firestore.googleapis.com",
        "firebasestorage.googleapis.com",
        "identitytoolkit.googleapis.com",
        "open-meteo.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_cacheable_extensions() -> Vec<String> {
    ["js", "css", "svg", "woff2"].into_iter().map(String::from).collect()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sodalog-sw-cache.sqlite")
}

fn default_user_agent() -> String {
    "sodalog-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

/// Accept either a list or a comma-separated string.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(items) => items,
        ListOrCsv::Csv(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    })
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_name: None,
            origin: default_origin(),
            static_assets: default_static_assets(),
            offline_path: default_offline_path(),
            deny_domains: default_deny_domains(),
            cacheable_extensions: default_cacheable_extensions(),
            hashed_assets: false,
            skip_waiting: true,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SODALOG_SW_`
    /// 2. TOML file from `SODALOG_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SODALOG_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SODALOG_SW_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Return the generation name, which has no built-in default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the cache name is not set.
    pub fn require_cache_name(&self) -> Result<&str, ConfigError> {
        self.cache_name.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "cache_name".into(),
            hint: "Set SODALOG_SW_CACHE_NAME from the deploy pipeline".into(),
        })
    }
}
