//! Listener configuration

use crate::error::{Result, ServerError};
use std::net::SocketAddr;

/// Default port assignments
pub mod ports {
    /// JSON-RPC over HTTP (`POST /mcp`)
    pub const MCP_HTTP: u16 = 8000;
    /// Prometheus exporter
    pub const METRICS: u16 = 9090;
}

/// Address an [`HttpServer`](crate::http::HttpServer) binds to
///
/// # Example
///
/// ```
/// use server::config::ServerConfig;
///
/// let config = ServerConfig::new("127.0.0.1", 8000);
/// assert_eq!(config.addr().unwrap().port(), 8000);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port; 0 asks the OS for an ephemeral port
    pub http_port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, http_port: u16) -> Self {
        Self {
            host: host.into(),
            http_port,
        }
    }

    /// Loopback on an ephemeral port, for tests
    pub fn ephemeral() -> Self {
        Self::new("127.0.0.1", 0)
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.http_port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.http_port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", ports::MCP_HTTP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.http_port, 8000);
    }

    #[test]
    fn test_addr_parsing() {
        assert_eq!(
            ServerConfig::new("127.0.0.1", 8123).addr().unwrap().to_string(),
            "127.0.0.1:8123"
        );
        assert!(matches!(
            ServerConfig::new("not a host", 80).addr(),
            Err(ServerError::InvalidAddress(_))
        ));
    }
}
