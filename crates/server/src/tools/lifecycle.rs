//! Deployment lifecycle tools: sw_deploy, sw_activate and sw_status.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sodalog_core::{AppConfig, Error, Registration, RouterConfig};

use super::json_result;
use crate::error::ToolError;

/// Parameters for the sw_deploy tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwDeployParams {
    /// Version identifier of the deployment; becomes the cache generation name.
    pub version: String,
}

/// Install the shell for `version`, activating it unless configured to wait.
pub async fn deploy_impl(
    registration: &Registration, app: &AppConfig, params: SwDeployParams,
) -> Result<CallToolResult, McpError> {
    let version = params.version.trim();
    if version.is_empty() {
        return Err(Error::InvalidInput("version cannot be empty".into()).into());
    }

    let app = AppConfig { cache_name: Some(version.to_string()), ..app.clone() };
    let config = RouterConfig::from_app(&app).map_err(ToolError::from)?;
    let outcome = registration.register(config).await?;

    json_result(&outcome)
}

/// Promote the waiting router.
pub async fn activate_impl(registration: &Registration) -> Result<CallToolResult, McpError> {
    let report = registration.activate_waiting().await?;
    json_result(&report)
}

pub async fn status_impl(registration: &Registration) -> Result<CallToolResult, McpError> {
    json_result(&registration.status().await)
}
