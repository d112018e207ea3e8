//! sw_fetch tool implementation.
//!
//! Dispatches a request through the registration the way a browser page
//! would: the active router answers it or it goes straight to the network.

use base64::{Engine, engine::general_purpose::STANDARD};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sodalog_core::{CacheRequest, Error, Registration, RequestMode, ResponseSource};
use url::Url;

use super::json_result;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL to request.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Treat the request as a top-level page navigation.
    #[serde(default)]
    pub navigate: bool,
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    /// Where the response came from: network, cache, offline-fallback or passthrough.
    pub source: ResponseSource,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body as text, when it is valid UTF-8.
    pub body: Option<String>,
    /// Body as standard base64, otherwise.
    pub body_base64: Option<String>,
    pub body_len: usize,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(registration: &Registration, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    let url = Url::parse(&params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let mode = if params.navigate { RequestMode::Navigate } else { RequestMode::Cors };
    let request = CacheRequest::new(params.method.as_deref().unwrap_or("GET"), url, mode)?;

    let served = registration.fetch(&request).await?;
    tracing::debug!(url = %request.url, source = ?served.source, status = served.response.status, "served");

    let response = served.response;
    let (body, body_base64) = match std::str::from_utf8(&response.body) {
        Ok(text) => (Some(text.to_string()), None),
        Err(_) => (None, Some(STANDARD.encode(&response.body))),
    };

    json_result(&SwFetchOutput {
        content_type: response.content_type().map(str::to_string),
        body_len: response.body.len(),
        url: response.url,
        status: response.status,
        source: served.source,
        headers: response.headers,
        body,
        body_base64,
    })
}
