//! Read-only resources backed by the market data tools

use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::protocol::RpcError;
use crate::tools;

pub const MARKET_STATUS_URI: &str = "market://status";
const STOCK_PRICE_PREFIX: &str = "stock://price/";
const OPTIONS_CHAIN_PREFIX: &str = "options://chain/";
const MIME_JSON: &str = "application/json";

/// Parsed resource URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    MarketStatus,
    StockPrice(String),
    OptionsChain(String),
}

impl ResourceUri {
    pub fn parse(uri: &str) -> Option<Self> {
        if uri == MARKET_STATUS_URI {
            return Some(Self::MarketStatus);
        }

        let symbol = |prefix: &str| {
            uri.strip_prefix(prefix)
                .map(str::trim)
                .filter(|s| !s.is_empty() && !s.contains('/'))
                .map(str::to_uppercase)
        };

        symbol(STOCK_PRICE_PREFIX)
            .map(Self::StockPrice)
            .or_else(|| symbol(OPTIONS_CHAIN_PREFIX).map(Self::OptionsChain))
    }
}

pub fn list() -> Value {
    json!({
        "resources": [{
            "uri": MARKET_STATUS_URI,
            "name": "Market status",
            "description": "Current market session state",
            "mimeType": MIME_JSON
        }]
    })
}

pub fn templates() -> Value {
    json!({
        "resourceTemplates": [
            {
                "uriTemplate": "stock://price/{symbol}",
                "name": "Stock price",
                "description": "Latest quote for a ticker",
                "mimeType": MIME_JSON
            },
            {
                "uriTemplate": "options://chain/{symbol}",
                "name": "Option chain",
                "description": "Normalized option chain for an underlying",
                "mimeType": MIME_JSON
            }
        ]
    })
}

/// Resolve `uri` and wrap the JSON payload as resource contents
pub async fn read(ctx: &ToolContext, uri: &str) -> Result<Value, RpcError> {
    let resource = ResourceUri::parse(uri)
        .ok_or_else(|| RpcError::invalid_params(format!("Unknown resource: {}", uri)))?;

    let (tool, arguments) = match resource {
        ResourceUri::MarketStatus => (tools::GET_MARKET_STATUS, json!({})),
        ResourceUri::StockPrice(symbol) => (tools::GET_STOCK_PRICE, json!({ "symbol": symbol })),
        ResourceUri::OptionsChain(symbol) => {
            (tools::GET_OPTIONS_CHAIN, json!({ "symbol": symbol }))
        }
    };

    let payload = tools::call(ctx, tool, arguments)
        .await
        .map_err(|e| RpcError::internal(format!("Failed to read {}: {}", uri, e)))?;

    let text = serde_json::to_string_pretty(&payload)
        .map_err(|e| RpcError::internal(e.to_string()))?;

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": MIME_JSON,
            "text": text
        }]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{INTERNAL_ERROR, INVALID_PARAMS};
    use observability::ToolMetrics;
    use provider::StaticProvider;
    use std::sync::Arc;

    #[test]
    fn test_parse_uris() {
        assert_eq!(ResourceUri::parse("market://status"), Some(ResourceUri::MarketStatus));
        assert_eq!(
            ResourceUri::parse("stock://price/aapl"),
            Some(ResourceUri::StockPrice("AAPL".into()))
        );
        assert_eq!(
            ResourceUri::parse("options://chain/SPY"),
            Some(ResourceUri::OptionsChain("SPY".into()))
        );
        assert_eq!(ResourceUri::parse("stock://price/"), None);
        assert_eq!(ResourceUri::parse("stock://price/a/b"), None);
        assert_eq!(ResourceUri::parse("file:///etc/passwd"), None);
    }

    #[tokio::test]
    async fn test_read_stock_price() {
        let ctx = ToolContext::new(
            Arc::new(StaticProvider::new().with_price("AAPL", 190.0)),
            ToolMetrics::new("test"),
        );

        let result = read(&ctx, "stock://price/AAPL").await.unwrap();
        let content = &result["contents"][0];
        assert_eq!(content["mimeType"], "application/json");

        let body: Value = serde_json::from_str(content["text"].as_str().unwrap()).unwrap();
        assert_eq!(body["current_price"], 190.0);
    }

    #[tokio::test]
    async fn test_read_errors() {
        let ctx = ToolContext::new(Arc::new(StaticProvider::new()), ToolMetrics::new("test"));

        let unknown = read(&ctx, "weather://today").await.unwrap_err();
        assert_eq!(unknown.code, INVALID_PARAMS);

        let missing = read(&ctx, "market://status").await.unwrap_err();
        assert_eq!(missing.code, INTERNAL_ERROR);
    }
}
