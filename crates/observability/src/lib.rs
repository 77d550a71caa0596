//! Observability for the optix tool server
//!
//! This crate provides:
//! - Structured logging via tracing, always written to stderr
//! - Prometheus metrics
//! - Tool-call metric helpers
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! // Initialize logging
//! init_logging("optix", LogFormat::Pretty, "info")?;
//!
//! // Initialize metrics (optional)
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, ToolCallGuard, ToolMetrics};
