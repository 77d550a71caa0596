//! JSON-RPC method dispatch shared by every transport

use observability::ToolCallGuard;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::context::ToolContext;
use crate::protocol::{
    initialize_result, CallToolResult, JsonRpcRequest, JsonRpcResponse, RpcError,
};
use crate::{resources, tools};

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

/// Stateless request handler; cheap to clone
#[derive(Clone, Debug)]
pub struct McpService {
    ctx: Arc<ToolContext>,
}

impl McpService {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Handle one decoded message; notifications yield `None`
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        self.ctx.metrics.record_request(&request.method);

        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        let response = match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                debug!(method = %request.method, code = err.code, "Request failed: {}", err.message);
                JsonRpcResponse::failure(Some(id), err)
            }
        };
        Some(response)
    }

    /// Handle one raw line of text, returning the serialized response
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match JsonRpcRequest::parse(line) {
            Ok(request) => self.handle(request).await?,
            Err(err) => {
                warn!(code = err.code, "Rejected message: {}", err.message);
                JsonRpcResponse::failure(None, err)
            }
        };

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                error!(error = %e, "Failed to serialize response");
                None
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        match method {
            "initialize" => {
                info!("Client initialized session");
                Ok(initialize_result(
                    &self.ctx.server_name,
                    &self.ctx.server_version,
                ))
            }
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::definitions() })),
            "tools/call" => {
                let params: CallToolParams = parse_params(params)?;
                let result = self.call_tool(&params.name, params.arguments).await?;
                serde_json::to_value(result).map_err(|e| RpcError::internal(e.to_string()))
            }
            "resources/list" => Ok(resources::list()),
            "resources/templates/list" => Ok(resources::templates()),
            "resources/read" => {
                let params: ReadResourceParams = parse_params(params)?;
                resources::read(&self.ctx, &params.uri).await
            }
            other => Err(RpcError::method_not_found(other)),
        }
    }

    /// Run a tool and shape its outcome
    ///
    /// Argument and lookup failures are protocol errors. Every other failure
    /// is a successful response carrying `isError: true`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, RpcError> {
        let mut guard = ToolCallGuard::new(&self.ctx.metrics, name);

        match tools::call(&self.ctx, name, arguments).await {
            Ok(payload) => Ok(CallToolResult::success(payload)),
            Err(err) => {
                guard.set_error(err.kind());
                if err.is_protocol_error() {
                    return Err(err.into());
                }
                warn!(tool = name, kind = err.kind(), "Tool call failed: {}", err);
                Ok(CallToolResult::error(err.to_payload()))
            }
        }
    }
}

fn parse_params<T: for<'de> Deserialize<'de>>(params: Option<Value>) -> Result<T, RpcError> {
    let params = params.unwrap_or_else(|| json!({}));
    serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e.to_string()))
}
