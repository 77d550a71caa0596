//! Port checks before binding
//!
//! A successful check does not reserve the port; the real bind can still
//! fail and remains the source of truth.

use tokio::net::TcpListener;
use tracing::{debug, error, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Fail early when the configured HTTP port is taken or invalid
pub async fn validate_ports_available(config: &ServerConfig) -> Result<()> {
    validate_port_range(config.http_port)?;

    let addr = format!("{}:{}", config.host, config.http_port);
    debug!("Checking HTTP port {}", config.http_port);

    match TcpListener::bind(&addr).await {
        Ok(listener) => {
            drop(listener);
            debug!("HTTP port {} is available", config.http_port);
            Ok(())
        }
        Err(e) => {
            error!("HTTP port {} is NOT available: {}", config.http_port, e);
            Err(ServerError::port_in_use(config.http_port, e.to_string()))
        }
    }
}

pub async fn is_port_in_use(host: &str, port: u16) -> bool {
    let addr = format!("{}:{}", host, port);
    TcpListener::bind(&addr).await.is_err()
}

/// Reject port 0 and warn about privileged ports
pub fn validate_port_range(port: u16) -> Result<()> {
    if port == 0 {
        Err(ServerError::ConfigError(
            "Port cannot be 0 (ephemeral port assignment not supported for explicit binding)"
                .to_string(),
        ))
    } else {
        if port < 1024 {
            warn!(
                "Port {} is a privileged port (requires root/admin privileges)",
                port
            );
        }
        Ok(())
    }
}
