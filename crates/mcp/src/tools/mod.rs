//! Tool registry and dispatch
//!
//! Each tool deserializes its arguments into a typed struct, calls into the
//! analytics engine or the provider and returns a JSON payload.

mod activity;
mod greeks;
mod market;
mod schema;
mod strategy;

use analytics::AnalyticsError;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::context::ToolContext;
use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolDefinition;

pub const GET_STOCK_PRICE: &str = "get_stock_price";
pub const GET_OPTIONS_CHAIN: &str = "get_options_chain";
pub const CALCULATE_OPTION_GREEKS: &str = "calculate_option_greeks";
pub const ANALYZE_OPTIONS_STRATEGY: &str = "analyze_options_strategy";
pub const GET_UNUSUAL_OPTIONS_ACTIVITY: &str = "get_unusual_options_activity";
pub const NORMALIZE_OPTION_CHAIN: &str = "normalize_option_chain";
pub const GET_MARKET_STATUS: &str = "get_market_status";

/// Everything advertised by `tools/list`
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: GET_STOCK_PRICE,
            description: "Latest stock price with previous close and daily change",
            input_schema: schema::symbol_only(),
        },
        ToolDefinition {
            name: GET_OPTIONS_CHAIN,
            description: "Normalized option chain for an underlying, optionally for one expiration",
            input_schema: schema::options_chain(),
        },
        ToolDefinition {
            name: CALCULATE_OPTION_GREEKS,
            description: "Black-Scholes price and Greeks for a single option contract",
            input_schema: schema::option_greeks(),
        },
        ToolDefinition {
            name: ANALYZE_OPTIONS_STRATEGY,
            description: "Classify a multi-leg options strategy and compute its payoff profile",
            input_schema: schema::options_strategy(),
        },
        ToolDefinition {
            name: GET_UNUSUAL_OPTIONS_ACTIVITY,
            description: "Flag unusual volume and open interest and summarize flow sentiment",
            input_schema: schema::unusual_activity(),
        },
        ToolDefinition {
            name: NORMALIZE_OPTION_CHAIN,
            description: "Normalize a raw provider option chain payload into canonical contracts",
            input_schema: schema::normalize_chain(),
        },
        ToolDefinition {
            name: GET_MARKET_STATUS,
            description: "Current market session state",
            input_schema: schema::no_arguments(),
        },
    ]
}

/// Run a tool by name
pub async fn call(ctx: &ToolContext, name: &str, arguments: Value) -> ToolResult<Value> {
    debug!(tool = name, "Dispatching tool call");
    match name {
        GET_STOCK_PRICE => market::stock_price(ctx, parse_args(arguments)?).await,
        GET_OPTIONS_CHAIN => market::options_chain(ctx, parse_args(arguments)?).await,
        GET_MARKET_STATUS => market::market_status(ctx).await,
        NORMALIZE_OPTION_CHAIN => market::normalize_chain(ctx, parse_args(arguments)?),
        CALCULATE_OPTION_GREEKS => greeks::option_greeks(ctx, parse_args(arguments)?).await,
        ANALYZE_OPTIONS_STRATEGY => strategy::analyze(ctx, parse_args(arguments)?).await,
        GET_UNUSUAL_OPTIONS_ACTIVITY => {
            activity::unusual_activity(ctx, parse_args(arguments)?).await
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

/// Deserialize tool arguments; a missing object counts as `{}`
fn parse_args<T: DeserializeOwned>(arguments: Value) -> ToolResult<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid_arguments(e.to_string()))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AnalyticsError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AnalyticsError::invalid_parameter(format!(
            "{} must be YYYY-MM-DD, got '{}'",
            field, value
        ))
    })
}

fn normalize_symbol(symbol: &str) -> Result<String, AnalyticsError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AnalyticsError::invalid_parameter("symbol must not be empty"));
    }
    Ok(symbol)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
