//! cache_generations tool implementation.
//!
//! Lists stored generations in creation order with their entry counts.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;
use sodalog_core::{CacheDb, Registration};

use super::super::json_result;

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GenerationInfo {
    pub name: String,
    pub entries: u64,
    /// Whether the active router serves from this generation.
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheGenerationsOutput {
    pub generations: Vec<GenerationInfo>,
}

/// Implementation of the cache_generations tool.
pub async fn generations_impl(cache: &CacheDb, registration: &Registration) -> Result<CallToolResult, McpError> {
    let active = registration
        .active_router()
        .await
        .map(|router| router.cache_name().to_string());

    let mut generations = Vec::new();
    for name in cache.generation_names().await? {
        let entries = cache.entry_count(&name).await?;
        let active = active.as_deref() == Some(name.as_str());
        generations.push(GenerationInfo { name, entries, active });
    }

    json_result(&CacheGenerationsOutput { generations })
}
