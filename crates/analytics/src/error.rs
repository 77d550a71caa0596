//! Analytics error types

use thiserror::Error;

/// Errors that can occur during analytics operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Input outside the model's domain (non-positive spot, negative time, ...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Strategy legs disagree on underlying or expiration
    #[error("Inconsistent legs: {0}")]
    InconsistentLegs(String),

    /// Strategy was built without any legs
    #[error("Strategy has no legs")]
    EmptyStrategy,

    /// Market data needed for the computation could not be resolved
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// A single option-chain entry could not be parsed
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

impl AnalyticsError {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn inconsistent_legs(msg: impl Into<String>) -> Self {
        Self::InconsistentLegs(msg.into())
    }

    pub fn data_unavailable(msg: impl Into<String>) -> Self {
        Self::DataUnavailable(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    /// Taxonomy name reported to tool callers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "InvalidParameter",
            Self::InconsistentLegs(_) => "InconsistentLegs",
            Self::EmptyStrategy => "EmptyStrategy",
            Self::DataUnavailable(_) => "DataUnavailable",
            Self::MalformedRecord(_) => "MalformedRecord",
        }
    }
}
