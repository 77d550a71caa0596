//! JSON Schemas advertised for tool arguments

use serde_json::{json, Value};

fn symbol_property() -> Value {
    json!({
        "type": "string",
        "description": "Underlying ticker symbol, e.g. AAPL"
    })
}

fn date_property(description: &str) -> Value {
    json!({
        "type": "string",
        "format": "date",
        "description": description
    })
}

pub fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {} })
}

pub fn symbol_only() -> Value {
    json!({
        "type": "object",
        "properties": { "symbol": symbol_property() },
        "required": ["symbol"]
    })
}

pub fn options_chain() -> Value {
    json!({
        "type": "object",
        "properties": {
            "symbol": symbol_property(),
            "expiration_date": date_property("Only contracts expiring on this date (YYYY-MM-DD)")
        },
        "required": ["symbol"]
    })
}

pub fn option_greeks() -> Value {
    json!({
        "type": "object",
        "properties": {
            "symbol": symbol_property(),
            "strike_price": { "type": "number", "exclusiveMinimum": 0 },
            "expiration_date": date_property("Contract expiration (YYYY-MM-DD)"),
            "option_type": { "type": "string", "enum": ["call", "put"], "default": "call" },
            "volatility": {
                "type": "number",
                "description": "Annualized volatility as a decimal; defaults to the configured value"
            },
            "risk_free_rate": {
                "type": "number",
                "description": "Annualized risk-free rate as a decimal; defaults to the configured value"
            }
        },
        "required": ["symbol", "strike_price", "expiration_date"]
    })
}

fn leg() -> Value {
    json!({
        "type": "object",
        "properties": {
            "strike_price": { "type": "number" },
            "expiration_date": date_property("Leg expiration (YYYY-MM-DD)"),
            "option_type": { "type": "string", "enum": ["call", "put"] },
            "action": { "type": "string", "enum": ["buy", "sell"] },
            "quantity": { "type": "integer", "minimum": 1, "default": 1 },
            "bid": { "type": "number" },
            "ask": { "type": "number" },
            "last_price": { "type": "number" },
            "volatility": { "type": "number" },
            "contract_symbol": { "type": "string" }
        },
        "required": ["strike_price", "expiration_date", "option_type", "action"]
    })
}

pub fn options_strategy() -> Value {
    json!({
        "type": "object",
        "properties": {
            "symbol": symbol_property(),
            "legs": { "type": "array", "items": leg(), "minItems": 1 },
            "spot_price": {
                "type": "number",
                "description": "Underlying price; fetched from the market data provider when omitted"
            },
            "stock": {
                "type": "object",
                "properties": {
                    "shares": { "type": "integer", "minimum": 1 },
                    "cost_basis": { "type": "number" }
                },
                "required": ["shares", "cost_basis"]
            },
            "strategy_type": {
                "type": "string",
                "description": "Caller's label for the strategy; echoed back, never used for classification"
            }
        },
        "required": ["symbol", "legs"]
    })
}

pub fn unusual_activity() -> Value {
    json!({
        "type": "object",
        "properties": {
            "symbol": symbol_property(),
            "expiration_date": date_property("Only scan contracts expiring on this date (YYYY-MM-DD)"),
            "baseline_ratios": {
                "type": "array",
                "items": { "type": "number" },
                "description": "Historical volume/open-interest ratios added to the spike population"
            }
        },
        "required": ["symbol"]
    })
}

pub fn normalize_chain() -> Value {
    json!({
        "type": "object",
        "properties": {
            "payload": {
                "description": "Raw chain payload: an object with a results array, or an array of entries"
            },
            "symbol": {
                "type": "string",
                "description": "Underlying used when entries do not name one"
            }
        },
        "required": ["payload"]
    })
}
