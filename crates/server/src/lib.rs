//! HTTP serving infrastructure for optix
//!
//! Lifecycle is expressed through the [`Server`] trait and driven by a
//! `CancellationToken`; [`ServerExt`] adds `spawn()` and
//! `run_with_ctrl_c()`. Tool routes are supplied by the caller as an Axum
//! `Router`; this crate contributes health endpoints and shutdown.
//!
//! # Modules
//!
//! - [`config`] - listener configuration and port constants
//! - [`traits`] - `Server` and `ServerExt`
//! - [`http`] - Axum-based [`HttpServer`]
//! - [`health`] - health routes and dependency probes
//! - [`shutdown`] - graceful shutdown
//! - [`port_validator`] - early port checks

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod port_validator;
pub mod shutdown;
pub mod traits;

pub use config::{ports, ServerConfig};
pub use error::{Result, ServerError};
pub use health::{health_routes, ConnectionStatus, HealthCheck, HealthState};
pub use http::HttpServer;
pub use port_validator::validate_ports_available;
pub use shutdown::{run_until_shutdown, ShutdownController};
pub use traits::{Server, ServerExt};
