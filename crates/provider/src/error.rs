//! Provider error types

use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors raised while talking to a market data source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// No API key configured for a provider that needs one
    #[error("Provider API key is not configured")]
    MissingApiKey,

    /// Transport failure (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-success HTTP status
    #[error("Provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    /// Symbol or resource unknown to the provider
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ProviderError {
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
