//! Prometheus metrics infrastructure
//!
//! # Metrics
//!
//! * `rpc_requests_total{transport, method}` - JSON-RPC requests received
//! * `tool_calls_total{tool}` - tool invocations
//! * `tool_call_errors_total{tool, kind}` - failed tool invocations by error kind
//! * `tool_call_duration_seconds{tool}` - tool latency histogram

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Initialize the Prometheus metrics exporter
///
/// Starts an HTTP listener exposing `/metrics` on the given port.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Metric handles for one transport
///
/// Without an installed recorder every call is a no-op.
#[derive(Debug, Clone)]
pub struct ToolMetrics {
    transport: String,
}

impl ToolMetrics {
    pub fn new(transport: &str) -> Self {
        Self {
            transport: transport.to_string(),
        }
    }

    pub fn record_request(&self, method: &str) {
        counter!(
            "rpc_requests_total",
            "transport" => self.transport.clone(),
            "method" => method.to_string()
        )
        .increment(1);
    }

    /// Record a finished tool call; `error_kind` is set for failures
    pub fn record_tool_call(&self, tool: &str, duration: Duration, error_kind: Option<&str>) {
        counter!("tool_calls_total", "tool" => tool.to_string()).increment(1);
        histogram!("tool_call_duration_seconds", "tool" => tool.to_string())
            .record(duration.as_secs_f64());

        if let Some(kind) = error_kind {
            counter!(
                "tool_call_errors_total",
                "tool" => tool.to_string(),
                "kind" => kind.to_string()
            )
            .increment(1);
        }
    }

    pub fn transport(&self) -> &str {
        &self.transport
    }
}

/// Records a tool call when dropped
///
/// # Example
///
/// ```ignore
/// let mut guard = ToolCallGuard::new(&metrics, "calculate_option_greeks");
/// if let Err(e) = &result {
///     guard.set_error(e.kind());
/// }
/// ```
pub struct ToolCallGuard<'a> {
    metrics: &'a ToolMetrics,
    tool: String,
    start: Instant,
    error_kind: Option<&'static str>,
}

impl<'a> ToolCallGuard<'a> {
    pub fn new(metrics: &'a ToolMetrics, tool: &str) -> Self {
        Self {
            metrics,
            tool: tool.to_string(),
            start: Instant::now(),
            error_kind: None,
        }
    }

    /// Mark the call as failed (call before drop)
    pub fn set_error(&mut self, kind: &'static str) {
        self.error_kind = Some(kind);
    }
}

impl Drop for ToolCallGuard<'_> {
    fn drop(&mut self) {
        self.metrics
            .record_tool_call(&self.tool, self.start.elapsed(), self.error_kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_metrics_without_recorder() {
        let metrics = ToolMetrics::new("stdio");
        assert_eq!(metrics.transport(), "stdio");

        metrics.record_request("tools/call");
        let mut guard = ToolCallGuard::new(&metrics, "calculate_option_greeks");
        guard.set_error("InvalidParameter");
        drop(guard);
    }
}
