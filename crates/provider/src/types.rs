//! Provider-neutral market data records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest price snapshot for an equity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    /// Last trade if available, otherwise previous close
    pub current_price: f64,
    pub previous_close: f64,
    #[serde(default)]
    pub last_trade_price: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    pub change: f64,
    pub change_percent: f64,
    /// Provider timestamp in milliseconds since the epoch
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl StockQuote {
    /// Build a quote from the previous close and an optional last trade
    pub fn new(symbol: &str, previous_close: f64, last_trade_price: Option<f64>) -> Self {
        let current_price = last_trade_price.unwrap_or(previous_close);
        let change = current_price - previous_close;
        let change_percent = if previous_close != 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };

        Self {
            symbol: symbol.to_uppercase(),
            current_price,
            previous_close,
            last_trade_price,
            volume: None,
            change: round2(change),
            change_percent: round2(change_percent),
            timestamp: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Exchange session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStatus {
    /// Overall state, e.g. `open`, `closed`, `extended-hours`
    pub market: String,
    #[serde(default, alias = "serverTime")]
    pub server_time: Option<String>,
    #[serde(default)]
    pub exchanges: BTreeMap<String, String>,
    #[serde(default, alias = "earlyHours")]
    pub early_hours: bool,
    #[serde(default, alias = "afterHours")]
    pub after_hours: bool,
}

impl MarketStatus {
    pub fn new(market: impl Into<String>) -> Self {
        Self {
            market: market.into(),
            server_time: None,
            exchanges: BTreeMap::new(),
            early_hours: false,
            after_hours: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.market == "open"
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
