//! cache_get tool implementation.
//!
//! Retrieves stored entry metadata for a URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sodalog_core::{CacheDb, EntryMeta, Error, Registration};
use url::Url;

use super::super::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL of the stored request.
    pub url: String,

    /// Generation to read from (default: the active one).
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheGetOutput {
    pub generation: String,
    pub entries: Vec<EntryMeta>,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(
    cache: &CacheDb, registration: &Registration, params: CacheGetParams,
) -> Result<CallToolResult, McpError> {
    let url = Url::parse(&params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;

    let generation = match params.generation {
        Some(name) => name,
        None => registration
            .active_router()
            .await
            .map(|router| router.cache_name().to_string())
            .ok_or_else(|| Error::InvalidState("no active generation; pass one explicitly".into()))?,
    };

    let entries = cache.find_entries_by_url(&generation, &url).await?;
    if entries.is_empty() {
        return Err(Error::CacheMiss(format!("{url} in {generation}")).into());
    }

    json_result(&CacheGetOutput { generation, entries })
}

#[cfg(test)]
mod tests {
    use super::super::super::testing::{fixture, output_json};
    use super::*;
    use sodalog_core::{AppConfig, RouterConfig};

    fn params(url: &str, generation: Option<&str>) -> CacheGetParams {
        CacheGetParams { url: url.to_string(), generation: generation.map(str::to_string) }
    }

    #[tokio::test]
    async fn test_get_impl_missing() {
        let fx = fixture().await;
        fx.cache.create_generation("v1").await.unwrap();

        let result = get_impl(&fx.cache, &fx.registration, params("http://localhost:3000/dashboard/", Some("v1"))).await;
        assert_eq!(result.unwrap_err().code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_without_active_generation() {
        let fx = fixture().await;
        let result = get_impl(&fx.cache, &fx.registration, params("http://localhost:3000/dashboard/", None)).await;
        assert_eq!(result.unwrap_err().code.0, -32014);
    }

    #[tokio::test]
    async fn test_get_impl_found_in_active_generation() {
        let fx = fixture().await;
        let app = AppConfig { cache_name: Some("v1".into()), ..fx.app.clone() };
        fx.registration.register(RouterConfig::from_app(&app).unwrap()).await.unwrap();

        // the fragment is not part of the stored key
        let result = get_impl(&fx.cache, &fx.registration, params("http://localhost:3000/offline/#retry", None))
            .await
            .unwrap();

        let output = output_json(&result);
        assert_eq!(output["generation"], "v1");
        let entries = output["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["method"], "GET");
        assert_eq!(entries[0]["url"], "http://localhost:3000/offline/");
        assert_eq!(entries[0]["status"], 200);
        assert_eq!(entries[0]["body_len"], "page /offline/".len());
    }
}
