//! Errors raised by the server adapter itself.
//!
//! Router and store failures arrive as `sodalog_core::Error` and convert
//! directly; these cover what only the adapter can get wrong.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use sodalog_core::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A deployment could not be configured from the loaded settings.
    #[error("INVALID_INPUT: {0}")]
    Config(#[from] ConfigError),

    /// Tool output could not be encoded.
    #[error("INTERNAL_ERROR: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::Config(_) => -32602,
            ToolError::Encode(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_is_invalid_params() {
        let err = ToolError::Config(ConfigError::Invalid { field: "cache_name".into(), reason: "empty".into() });
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
        assert!(mcp_err.message.contains("cache_name"));
    }
}
