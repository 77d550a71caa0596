//! Transports carrying JSON-RPC messages to [`McpService`](crate::service::McpService)

pub mod http;
pub mod stdio;

pub use http::{mcp_router, serve_http, ProviderHealthCheck};
pub use stdio::{serve_lines, serve_stdio};
