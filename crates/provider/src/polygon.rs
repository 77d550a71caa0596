//! Polygon.io REST client

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::client::MarketDataProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::types::{MarketStatus, StockQuote};

/// Connection settings for [`PolygonClient`]
#[derive(Debug, Clone)]
pub struct PolygonSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// `limit` sent with each chain snapshot page
    pub chain_page_limit: u32,
    /// Upper bound on `next_url` pages followed per chain request
    pub max_chain_pages: usize,
}

impl Default for PolygonSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.polygon.io".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            chain_page_limit: 250,
            max_chain_pages: 4,
        }
    }
}

/// HTTP client for the Polygon.io market data API
pub struct PolygonClient {
    client: Client,
    base_url: Url,
    api_key: String,
    chain_page_limit: u32,
    max_chain_pages: usize,
}

impl std::fmt::Debug for PolygonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonClient")
            .field("base_url", &self.base_url)
            .field("chain_page_limit", &self.chain_page_limit)
            .field("max_chain_pages", &self.max_chain_pages)
            .finish_non_exhaustive()
    }
}

impl PolygonClient {
    /// Create a client; fails without an API key or with a bad base URL
    pub fn new(settings: PolygonSettings) -> ProviderResult<Self> {
        let api_key = settings
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey)?;

        let base_url = Url::parse(settings.base_url.trim_end_matches('/'))
            .map_err(|e| ProviderError::http(format!("invalid base url: {}", e)))?;

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ProviderError::http(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            chain_page_limit: settings.chain_page_limit.max(1),
            max_chain_pages: settings.max_chain_pages.max(1),
        })
    }

    fn endpoint(&self, path: &str) -> ProviderResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::http(format!("invalid endpoint {}: {}", path, e)))
    }

    fn authorize(&self, mut url: Url) -> Url {
        let has_key = url.query_pairs().any(|(k, _)| k == "apiKey");
        if !has_key {
            url.query_pairs_mut().append_pair("apiKey", &self.api_key);
        }
        url
    }

    async fn get_json(&self, url: Url) -> ProviderResult<Value> {
        let url = self.authorize(url);
        debug!(path = url.path(), "polygon request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::http(e.without_url().to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::not_found(status.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::status(status.as_u16(), error_message(&body)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::decode(e.without_url().to_string()))
    }
}

#[async_trait]
impl MarketDataProvider for PolygonClient {
    fn name(&self) -> &str {
        "polygon"
    }

    #[instrument(skip(self))]
    async fn stock_quote(&self, symbol: &str) -> ProviderResult<StockQuote> {
        let ticker = symbol.trim().to_uppercase();

        let prev = self
            .get_json(self.endpoint(&format!("/v2/aggs/ticker/{}/prev", ticker))?)
            .await?;
        let (previous_close, volume, timestamp) = parse_previous_close(&prev, &ticker)?;

        // Last trade needs a paid plan; the previous close is enough
        let last_trade = match self
            .get_json(self.endpoint(&format!("/v2/last/trade/{}", ticker))?)
            .await
        {
            Ok(body) => parse_last_trade(&body),
            Err(e) => {
                debug!(error = %e, "last trade unavailable, using previous close");
                None
            }
        };

        let mut quote = StockQuote::new(&ticker, previous_close, last_trade);
        quote.volume = volume;
        quote.timestamp = timestamp;
        Ok(quote)
    }

    #[instrument(skip(self))]
    async fn option_chain_snapshot(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> ProviderResult<Value> {
        let ticker = symbol.trim().to_uppercase();
        let mut url = self.endpoint(&format!("/v3/snapshot/options/{}", ticker))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &self.chain_page_limit.to_string());
            if let Some(date) = expiration {
                query.append_pair("expiration_date", &date.format("%Y-%m-%d").to_string());
            }
        }

        let mut results = Vec::new();
        let mut next = Some(url);
        let mut pages = 0;

        while let Some(page_url) = next.take() {
            if pages == self.max_chain_pages {
                warn!(
                    symbol = %ticker,
                    pages,
                    "option chain truncated at page limit"
                );
                break;
            }

            let page = self.get_json(page_url).await?;
            pages += 1;

            if let Some(entries) = page.get("results").and_then(Value::as_array) {
                results.extend(entries.iter().cloned());
            }
            next = page
                .get("next_url")
                .and_then(Value::as_str)
                .and_then(|u| Url::parse(u).ok());
        }

        debug!(symbol = %ticker, pages, contracts = results.len(), "fetched option chain");
        Ok(json!({ "results": results }))
    }

    #[instrument(skip(self))]
    async fn market_status(&self) -> ProviderResult<MarketStatus> {
        let body = self.get_json(self.endpoint("/v1/marketstatus/now")?).await?;
        serde_json::from_value(body).map_err(|e| ProviderError::decode(e.to_string()))
    }
}

/// `(close, volume, timestamp)` from an aggregates `prev` response
fn parse_previous_close(
    body: &Value,
    ticker: &str,
) -> ProviderResult<(f64, Option<f64>, Option<i64>)> {
    let bar = body
        .get("results")
        .and_then(Value::as_array)
        .and_then(|bars| bars.first())
        .ok_or_else(|| ProviderError::not_found(format!("no previous close for {}", ticker)))?;

    let close = bar
        .get("c")
        .and_then(Value::as_f64)
        .ok_or_else(|| ProviderError::decode("previous close bar has no close price"))?;

    Ok((
        close,
        bar.get("v").and_then(Value::as_f64),
        bar.get("t").and_then(Value::as_i64),
    ))
}

fn parse_last_trade(body: &Value) -> Option<f64> {
    body.pointer("/results/p")
        .and_then(Value::as_f64)
        .filter(|p| p.is_finite() && *p > 0.0)
}

/// Prefer the provider's `error`/`message` field over the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn client() -> PolygonClient {
        PolygonClient::new(PolygonSettings {
            api_key: Some("test-key".to_string()),
            ..PolygonSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        assert_matches!(
            PolygonClient::new(PolygonSettings::default()),
            Err(ProviderError::MissingApiKey)
        );
        assert_matches!(
            PolygonClient::new(PolygonSettings {
                api_key: Some("  ".to_string()),
                ..PolygonSettings::default()
            }),
            Err(ProviderError::MissingApiKey)
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let result = PolygonClient::new(PolygonSettings {
            base_url: "not a url".to_string(),
            api_key: Some("k".to_string()),
            ..PolygonSettings::default()
        });
        assert_matches!(result, Err(ProviderError::Http(_)));
    }

    #[test]
    fn test_authorize_appends_key_once() {
        let client = client();
        let url = client.endpoint("/v3/snapshot/options/AAPL").unwrap();
        let url = client.authorize(url);
        assert_eq!(
            url.as_str(),
            "https://api.polygon.io/v3/snapshot/options/AAPL?apiKey=test-key"
        );

        // next_url pages already carrying a key are left alone
        let again = client.authorize(url.clone());
        assert_eq!(again, url);
    }

    #[test]
    fn test_parse_previous_close() {
        let body = json!({
            "ticker": "AAPL",
            "results": [{ "c": 189.84, "v": 52000000.0, "t": 1735851600000i64 }],
            "status": "OK"
        });
        let (close, volume, ts) = parse_previous_close(&body, "AAPL").unwrap();
        assert_eq!(close, 189.84);
        assert_eq!(volume, Some(52000000.0));
        assert_eq!(ts, Some(1735851600000));

        let empty = json!({ "results": [], "status": "OK" });
        assert_matches!(
            parse_previous_close(&empty, "ZZZZ"),
            Err(ProviderError::NotFound(_))
        );
    }

    #[test]
    fn test_parse_last_trade() {
        assert_eq!(
            parse_last_trade(&json!({ "results": { "p": 190.12, "s": 100 } })),
            Some(190.12)
        );
        assert_eq!(parse_last_trade(&json!({ "status": "NOT_AUTHORIZED" })), None);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"status":"ERROR","error":"Unknown API Key"}"#),
            "Unknown API Key"
        );
        assert_eq!(error_message("plain failure"), "plain failure");
    }
}
