//! Health endpoints
//!
//! `GET /health` is a liveness probe. `GET /health/detailed` runs every
//! registered [`HealthCheck`] and answers 503 if any upstream is down.

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Result of probing one upstream dependency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub service: String,
    pub connected: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl ConnectionStatus {
    pub fn up(service: &str, started: Instant) -> Self {
        Self {
            service: service.to_string(),
            connected: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        }
    }

    pub fn down(service: &str, started: Instant, error: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            connected: false,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: Some(error.into()),
        }
    }
}

/// An upstream dependency that can be probed
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> ConnectionStatus;
}

/// Shared state for health handlers
#[derive(Clone)]
pub struct HealthState {
    pub service_name: String,
    pub version: String,
    pub start_time: Instant,
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthState {
    pub fn new(service_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            version: version.into(),
            start_time: Instant::now(),
            checks: Vec::new(),
        }
    }

    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Probe every registered dependency in registration order
    pub async fn probe(&self) -> Vec<ConnectionStatus> {
        let mut statuses = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            statuses.push(check.check().await);
        }
        statuses
    }
}

/// Liveness handler
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.service_name,
    }))
}

/// Readiness handler with dependency probes
pub async fn detailed_health_handler(
    State(state): State<Arc<HealthState>>,
) -> (StatusCode, Json<Value>) {
    let connections = state.probe().await;

    let all_healthy = connections.iter().all(|c| c.connected);
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let health = json!({
        "status": if all_healthy { "healthy" } else { "degraded" },
        "service": state.service_name,
        "version": state.version,
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
        "connections": connections,
    });

    (status_code, Json(health))
}

/// Router with `/health` and `/health/detailed`
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/detailed", get(detailed_health_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct FixedCheck(bool);

    #[async_trait]
    impl HealthCheck for FixedCheck {
        async fn check(&self) -> ConnectionStatus {
            let started = Instant::now();
            if self.0 {
                ConnectionStatus::up("upstream", started)
            } else {
                ConnectionStatus::down("upstream", started, "connection refused")
            }
        }
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_liveness() {
        let state = Arc::new(HealthState::new("optix", "0.1.0"));
        let (status, body) = get_json(health_routes(state), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "optix");
    }

    #[tokio::test]
    async fn test_detailed_reports_degraded_dependency() {
        let healthy =
            Arc::new(HealthState::new("optix", "0.1.0").with_check(Arc::new(FixedCheck(true))));
        let (status, body) = get_json(health_routes(healthy), "/health/detailed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connections"][0]["connected"], true);

        let degraded = Arc::new(
            HealthState::new("optix", "0.1.0")
                .with_check(Arc::new(FixedCheck(true)))
                .with_check(Arc::new(FixedCheck(false))),
        );
        let (status, body) = get_json(health_routes(degraded), "/health/detailed").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["connections"][1]["error"], "connection refused");
    }
}
