//! JSON-RPC over HTTP with health endpoints

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use provider::MarketDataProvider;
use serde_json::{json, Value};
use server::{
    health_routes, ConnectionStatus, HealthCheck, HealthState, HttpServer, Server, ServerConfig,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::service::McpService;

/// Probes the market data provider through its status endpoint
pub struct ProviderHealthCheck {
    provider: Arc<dyn MarketDataProvider>,
}

impl ProviderHealthCheck {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl HealthCheck for ProviderHealthCheck {
    async fn check(&self) -> ConnectionStatus {
        let started = Instant::now();
        let name = self.provider.name();
        match self.provider.market_status().await {
            Ok(_) => ConnectionStatus::up(name, started),
            Err(e) => ConnectionStatus::down(name, started, e.to_string()),
        }
    }
}

/// `POST /mcp`, `GET /` and the health routes
pub fn mcp_router(service: McpService) -> Router {
    let ctx = service.context();
    let health = HealthState::new(ctx.server_name.clone(), ctx.server_version.clone())
        .with_check(Arc::new(ProviderHealthCheck::new(ctx.provider.clone())));

    Router::new()
        .route("/", get(banner))
        .route("/mcp", post(handle_mcp))
        .with_state(service)
        .merge(health_routes(Arc::new(health)))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until `shutdown` is cancelled
pub async fn serve_http(
    service: McpService,
    config: ServerConfig,
    shutdown: CancellationToken,
) -> server::Result<()> {
    HttpServer::new(config, mcp_router(service))
        .run(shutdown)
        .await
}

async fn banner(State(service): State<McpService>) -> Json<Value> {
    let ctx = service.context();
    Json(json!({
        "name": ctx.server_name,
        "version": ctx.server_version,
        "endpoints": {
            "mcp": "POST /mcp",
            "health": "GET /health",
            "health_detailed": "GET /health/detailed"
        }
    }))
}

async fn handle_mcp(State(service): State<McpService>, body: String) -> Response {
    let request = match JsonRpcRequest::parse(&body) {
        Ok(request) => request,
        Err(err) => {
            warn!(code = err.code, "Rejected HTTP message: {}", err.message);
            return Json(JsonRpcResponse::failure(None, err)).into_response();
        }
    };

    match service.handle(request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
