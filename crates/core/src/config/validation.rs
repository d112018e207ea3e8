//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `origin` is not an http(s) URL
    /// - a static asset or `offline_path` is not an absolute path
    /// - `offline_path` is not part of `static_assets`
    /// - `cache_name` is set but empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") && origin.host_str().is_some() => {}
            Ok(origin) => return Err(invalid("origin", format!("unsupported origin: {origin}"))),
            Err(e) => return Err(invalid("origin", e.to_string())),
        }

        if let Some(name) = &self.cache_name
            && name.trim().is_empty()
        {
            return Err(invalid("cache_name", "must not be empty"));
        }

        if let Some(asset) = self.static_assets.iter().find(|a| !a.starts_with('/')) {
            return Err(invalid("static_assets", format!("{asset} must start with '/'")));
        }

        if !self.offline_path.starts_with('/') {
            return Err(invalid("offline_path", "must start with '/'"));
        }
        if !self.static_assets.contains(&self.offline_path) {
            return Err(invalid("offline_path", "must be listed in static_assets"));
        }

        if self.deny_domains.iter().any(|d| d.trim().is_empty()) {
            return Err(invalid("deny_domains", "entries must not be empty"));
        }

        if self.cacheable_extensions.iter().any(|e| e.trim_start_matches('.').is_empty()) {
            return Err(invalid("cacheable_extensions", "entries must not be empty"));
        }

        if self.hashed_assets && !self.cacheable_extensions.is_empty() {
            tracing::debug!(
                extensions = self.cacheable_extensions.len(),
                "cacheable_extensions only gate cache-first storage; hashed assets are stored regardless"
            );
        }

        Ok(())
    }
}
