//! cache_purge tool implementation.
//!
//! Deletes every generation the registration no longer uses. This retries
//! the cleanup an activation could not finish.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;
use sodalog_core::{CacheDb, Registration};

use super::super::json_result;
use super::protected_generations;

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Generations removed.
    pub deleted: Vec<String>,
    /// Generations whose deletion failed.
    pub failed: Vec<String>,
    /// Active and waiting generations, left untouched.
    pub kept: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &CacheDb, registration: &Registration) -> Result<CallToolResult, McpError> {
    let kept = protected_generations(registration).await;
    let mut output = CachePurgeOutput::default();

    for name in cache.generation_names().await? {
        if kept.contains(&name) {
            continue;
        }
        match cache.delete_generation(&name).await {
            Ok(true) => output.deleted.push(name),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(generation = %name, error = %e, "purge failed");
                output.failed.push(name);
            }
        }
    }

    tracing::info!(deleted = output.deleted.len(), failed = output.failed.len(), "purged stale generations");
    output.kept = kept;
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::super::super::testing::{fixture, output_json};
    use super::*;
    use sodalog_core::{AppConfig, RouterConfig};

    #[tokio::test]
    async fn test_purge_keeps_active_and_waiting() {
        let fx = fixture().await;
        let v1 = AppConfig { cache_name: Some("v1".into()), ..fx.app.clone() };
        fx.registration.register(RouterConfig::from_app(&v1).unwrap()).await.unwrap();
        let v2 = AppConfig { cache_name: Some("v2".into()), skip_waiting: false, ..fx.app.clone() };
        fx.registration.register(RouterConfig::from_app(&v2).unwrap()).await.unwrap();
        fx.cache.create_generation("stale").await.unwrap();

        let output = output_json(&purge_impl(&fx.cache, &fx.registration).await.unwrap());
        assert_eq!(output["deleted"], serde_json::json!(["stale"]));
        assert_eq!(output["failed"], serde_json::json!([]));
        assert_eq!(output["kept"], serde_json::json!(["v1", "v2"]));
        assert_eq!(fx.cache.generation_names().await.unwrap(), vec!["v1", "v2"]);
    }

    #[tokio::test]
    async fn test_purge_without_registration_deletes_everything() {
        let fx = fixture().await;
        fx.cache.create_generation("old-a").await.unwrap();
        fx.cache.create_generation("old-b").await.unwrap();

        let output = output_json(&purge_impl(&fx.cache, &fx.registration).await.unwrap());
        assert_eq!(output["deleted"], serde_json::json!(["old-a", "old-b"]));
        assert!(fx.cache.generation_names().await.unwrap().is_empty());
    }
}
