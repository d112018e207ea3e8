//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheGetParams, generations_impl, get_impl, purge_impl},
    lifecycle::{SwDeployParams, activate_impl, deploy_impl, status_impl},
    sw_fetch::{SwFetchParams, fetch_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use sodalog_core::{AppConfig, CacheDb, Registration};

/// The main MCP server handler for sodalog-sw.
#[derive(Clone)]
pub struct SodalogServer {
    tool_router: ToolRouter<Self>,
    app: Arc<AppConfig>,
    cache: CacheDb,
    registration: Arc<Registration>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SodalogServer {
    /// Create a new server handler.
    ///
    /// `registration` must be backed by the same store as `cache`.
    pub fn new(app: AppConfig, cache: CacheDb, registration: Arc<Registration>) -> Self {
        Self { tool_router: Self::tool_router(), app: Arc::new(app), cache, registration }
    }

    #[tool(
        description = "Request a URL through the active cache router. Navigations are network-first with cache and offline-page fallback; static assets follow the configured strategy. Returns status, headers, response source, and body."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.registration, params.0).await
    }

    #[tool(
        description = "Deploy a version: pre-cache the app shell into a new generation, then activate it (or leave it waiting when skip_waiting is off)."
    )]
    async fn sw_deploy(&self, params: Parameters<SwDeployParams>) -> Result<CallToolResult, McpError> {
        deploy_impl(&self.registration, &self.app, params.0).await
    }

    #[tool(description = "Activate the waiting version and delete every other cache generation.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.registration).await
    }

    #[tool(description = "Show the active and waiting versions and their lifecycle states.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.registration).await
    }

    #[tool(description = "List cache generations with entry counts, marking the active one.")]
    async fn cache_generations(&self) -> Result<CallToolResult, McpError> {
        generations_impl(&self.cache, &self.registration).await
    }

    #[tool(description = "Show stored entries for a URL in a generation (default: the active one).")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.cache, &self.registration, params.0).await
    }

    #[tool(description = "Delete every cache generation that is neither active nor waiting.")]
    async fn cache_purge(&self) -> Result<CallToolResult, McpError> {
        purge_impl(&self.cache, &self.registration).await
    }
}

impl ServerHandler for SodalogServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "sodalog-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
