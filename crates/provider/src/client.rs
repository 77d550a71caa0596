//! Provider trait and in-memory implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::{ProviderError, ProviderResult};
use crate::types::{MarketStatus, StockQuote};

/// Source of quotes, option chain snapshots and market status
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short name used in logs and health output
    fn name(&self) -> &str;

    /// Latest stock quote
    async fn stock_quote(&self, symbol: &str) -> ProviderResult<StockQuote>;

    /// Raw option chain snapshot as `{"results": [...]}`
    ///
    /// Entries keep the provider's own shape; callers normalise them.
    async fn option_chain_snapshot(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> ProviderResult<Value>;

    /// Current exchange session state
    async fn market_status(&self) -> ProviderResult<MarketStatus>;

    /// Spot price used for pricing
    async fn spot_price(&self, symbol: &str) -> ProviderResult<f64> {
        Ok(self.stock_quote(symbol).await?.current_price)
    }
}

// ==================== Static Implementation ====================

/// Provider that serves fixed data from memory
///
/// Used for tests and for running the tool server offline.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    quotes: HashMap<String, StockQuote>,
    chains: HashMap<String, Vec<Value>>,
    status: Option<MarketStatus>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flat price (last trade equals previous close)
    pub fn with_price(self, symbol: &str, price: f64) -> Self {
        self.with_quote(StockQuote::new(symbol, price, Some(price)))
    }

    pub fn with_quote(mut self, quote: StockQuote) -> Self {
        self.quotes.insert(quote.symbol.to_uppercase(), quote);
        self
    }

    /// Register chain entries for `symbol`, in provider snapshot shape
    pub fn with_chain(mut self, symbol: &str, entries: Vec<Value>) -> Self {
        self.chains.insert(symbol.to_uppercase(), entries);
        self
    }

    pub fn with_market_status(mut self, status: MarketStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[async_trait]
impl MarketDataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn stock_quote(&self, symbol: &str) -> ProviderResult<StockQuote> {
        self.quotes
            .get(&symbol.to_uppercase())
            .cloned()
            .ok_or_else(|| ProviderError::not_found(format!("no quote for {}", symbol)))
    }

    async fn option_chain_snapshot(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> ProviderResult<Value> {
        let entries = self
            .chains
            .get(&symbol.to_uppercase())
            .ok_or_else(|| ProviderError::not_found(format!("no option chain for {}", symbol)))?;

        let results: Vec<Value> = match expiration {
            None => entries.clone(),
            Some(date) => {
                let wanted = date.format("%Y-%m-%d").to_string();
                entries
                    .iter()
                    .filter(|entry| entry_expiration(entry) == Some(wanted.as_str()))
                    .cloned()
                    .collect()
            }
        };

        Ok(json!({ "results": results }))
    }

    async fn market_status(&self) -> ProviderResult<MarketStatus> {
        self.status
            .clone()
            .ok_or_else(|| ProviderError::not_found("market status"))
    }
}

fn entry_expiration(entry: &Value) -> Option<&str> {
    entry
        .pointer("/details/expiration_date")
        .or_else(|| entry.get("expiration_date"))
        .and_then(Value::as_str)
}
