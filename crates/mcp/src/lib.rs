//! Optix tool server
//!
//! Exposes the analytics engine and market data provider as JSON-RPC 2.0
//! tools (Model Context Protocol) over stdio or HTTP.
//!
//! # Layout
//!
//! - [`protocol`] - JSON-RPC envelopes and MCP result shapes
//! - [`service`] - method dispatch shared by all transports
//! - [`tools`] - tool definitions and handlers
//! - [`resources`] - read-only `market://`, `stock://` and `options://` resources
//! - [`transport`] - stdio and HTTP front ends

pub mod context;
pub mod error;
pub mod protocol;
pub mod resources;
pub mod service;
pub mod tools;
pub mod transport;

pub use context::ToolContext;
pub use error::{ToolError, ToolResult};
pub use protocol::{JsonRpcRequest, JsonRpcResponse, RpcError};
pub use service::McpService;
pub use transport::{mcp_router, serve_http, serve_stdio};
