//! Tool and protocol error types

use analytics::AnalyticsError;
use provider::ProviderError;
use serde_json::{json, Value};
use thiserror::Error;

use crate::protocol::{RpcError, INVALID_PARAMS};

/// Result type for tool handlers
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Failure of a single tool call
///
/// Domain failures become tool results with `isError: true`; argument and
/// lookup failures become JSON-RPC errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("Market data unavailable: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Taxonomy name reported in `isError` results
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Analytics(e) => e.kind(),
            Self::Provider(_) => "DataUnavailable",
            Self::InvalidArguments(_) => "InvalidArguments",
            Self::UnknownTool(_) => "UnknownTool",
        }
    }

    /// Whether this surfaces as a JSON-RPC error instead of a tool result
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::InvalidArguments(_) | Self::UnknownTool(_))
    }

    /// Structured body of an `isError` tool result
    pub fn to_payload(&self) -> Value {
        json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}

impl From<ToolError> for RpcError {
    fn from(err: ToolError) -> Self {
        RpcError::new(INVALID_PARAMS, err.to_string())
    }
}

/// Provider failure while resolving data a computation cannot proceed without
pub fn unavailable(what: &str, err: ProviderError) -> ToolError {
    ToolError::Analytics(AnalyticsError::data_unavailable(format!("{}: {}", what, err)))
}
