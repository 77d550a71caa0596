//! Market data tools: quotes, chains and session state

use analytics::ChainNormalizer;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{normalize_symbol, parse_date};
use crate::context::ToolContext;
use crate::error::{unavailable, ToolResult};

#[derive(Debug, Deserialize)]
pub struct StockPriceArgs {
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
pub struct OptionsChainArgs {
    pub symbol: String,
    #[serde(default)]
    pub expiration_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeChainArgs {
    pub payload: Value,
    #[serde(default)]
    pub symbol: Option<String>,
}

pub async fn stock_price(ctx: &ToolContext, args: StockPriceArgs) -> ToolResult<Value> {
    let symbol = normalize_symbol(&args.symbol)?;
    let quote = ctx.provider.stock_quote(&symbol).await?;
    Ok(json!(quote))
}

pub async fn options_chain(ctx: &ToolContext, args: OptionsChainArgs) -> ToolResult<Value> {
    let symbol = normalize_symbol(&args.symbol)?;
    let expiration = args
        .expiration_date
        .as_deref()
        .map(|d| parse_date("expiration_date", d))
        .transpose()?;

    let raw = ctx
        .provider
        .option_chain_snapshot(&symbol, expiration)
        .await?;

    let spot = match ctx.provider.spot_price(&symbol).await {
        Ok(price) => Some(price),
        Err(e) => {
            warn!(%symbol, error = %e, "Spot price unavailable for option chain");
            None
        }
    };

    let chain = ChainNormalizer::new(ctx.today()).normalize(&raw, Some(&symbol));
    info!(
        %symbol,
        contracts = chain.len(),
        skipped = chain.skipped,
        "Option chain loaded"
    );

    Ok(json!({
        "symbol": symbol,
        "spot_price": spot,
        "expiration_date": expiration,
        "count": chain.len(),
        "skipped": chain.skipped,
        "contracts": chain.contracts,
    }))
}

pub async fn market_status(ctx: &ToolContext) -> ToolResult<Value> {
    let status = ctx
        .provider
        .market_status()
        .await
        .map_err(|e| unavailable("market status", e))?;
    Ok(json!(status))
}

pub fn normalize_chain(ctx: &ToolContext, args: NormalizeChainArgs) -> ToolResult<Value> {
    let hint = args
        .symbol
        .as_deref()
        .map(normalize_symbol)
        .transpose()?;

    let chain = ChainNormalizer::new(ctx.today()).normalize(&args.payload, hint.as_deref());
    Ok(json!({
        "count": chain.len(),
        "skipped": chain.skipped,
        "contracts": chain.contracts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use observability::ToolMetrics;
    use provider::{MarketStatus, ProviderError, StaticProvider};
    use std::sync::Arc;

    fn ctx(provider: StaticProvider) -> ToolContext {
        ToolContext::new(Arc::new(provider), ToolMetrics::new("test"))
            .with_valuation_date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap())
    }

    fn snapshot_entry(expiration: &str, strike: f64) -> Value {
        json!({
            "details": {
                "contract_type": "call",
                "expiration_date": expiration,
                "strike_price": strike,
                "ticker": "O:AAPL250117C00190000"
            },
            "day": { "volume": 120, "close": 4.1 },
            "open_interest": 900,
            "last_quote": { "bid": 4.0, "ask": 4.2 },
            "implied_volatility": 0.27,
            "underlying_asset": { "ticker": "AAPL" }
        })
    }

    #[tokio::test]
    async fn test_stock_price() {
        let ctx = ctx(StaticProvider::new().with_price("AAPL", 190.5));
        let result = stock_price(&ctx, StockPriceArgs { symbol: "aapl".into() })
            .await
            .unwrap();
        assert_eq!(result["symbol"], "AAPL");
        assert_eq!(result["current_price"], 190.5);
    }

    #[tokio::test]
    async fn test_stock_price_unknown_symbol() {
        let ctx = ctx(StaticProvider::new());
        let err = stock_price(&ctx, StockPriceArgs { symbol: "ZZZZ".into() })
            .await
            .unwrap_err();
        assert_matches!(err, ToolError::Provider(ProviderError::NotFound(_)));
        assert_eq!(err.kind(), "DataUnavailable");
    }

    #[tokio::test]
    async fn test_options_chain_with_expiration_filter() {
        let ctx = ctx(StaticProvider::new().with_price("AAPL", 190.0).with_chain(
            "AAPL",
            vec![
                snapshot_entry("2025-01-17", 190.0),
                snapshot_entry("2025-02-21", 195.0),
                json!({"garbage": true}),
            ],
        ));

        let all = options_chain(
            &ctx,
            OptionsChainArgs {
                symbol: "AAPL".into(),
                expiration_date: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(all["count"], 2);
        assert_eq!(all["skipped"], 1);
        assert_eq!(all["spot_price"], 190.0);

        let filtered = options_chain(
            &ctx,
            OptionsChainArgs {
                symbol: "AAPL".into(),
                expiration_date: Some("2025-02-21".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(filtered["count"], 1);
        assert_eq!(filtered["expiration_date"], "2025-02-21");
        assert_eq!(filtered["contracts"][0]["strike_price"], 195.0);
    }

    #[tokio::test]
    async fn test_options_chain_without_spot() {
        let ctx = ctx(StaticProvider::new().with_chain("AAPL", vec![snapshot_entry("2025-01-17", 190.0)]));
        let result = options_chain(
            &ctx,
            OptionsChainArgs {
                symbol: "AAPL".into(),
                expiration_date: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(result["spot_price"], Value::Null);
        assert_eq!(result["count"], 1);
    }

    #[tokio::test]
    async fn test_options_chain_bad_date() {
        let ctx = ctx(StaticProvider::new());
        let err = options_chain(
            &ctx,
            OptionsChainArgs {
                symbol: "AAPL".into(),
                expiration_date: Some("next friday".into()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");
    }

    #[tokio::test]
    async fn test_market_status() {
        let ctx = ctx(StaticProvider::new().with_market_status(MarketStatus::new("open")));
        let status = market_status(&ctx).await.unwrap();
        assert_eq!(status["market"], "open");

        let missing = market_status(&ctx_without_status()).await.unwrap_err();
        assert_eq!(missing.kind(), "DataUnavailable");
    }

    fn ctx_without_status() -> ToolContext {
        ctx(StaticProvider::new())
    }

    #[test]
    fn test_normalize_chain_uses_symbol_hint() {
        let ctx = ctx(StaticProvider::new());
        let payload = json!([
            {
                "contract_type": "put",
                "strike_price": "100",
                "expiration_date": "2025-03-21",
                "volume": "15"
            },
            "not an entry"
        ]);

        let result = normalize_chain(
            &ctx,
            NormalizeChainArgs {
                payload,
                symbol: Some("msft".into()),
            },
        )
        .unwrap();

        assert_eq!(result["count"], 1);
        assert_eq!(result["skipped"], 1);
        assert_eq!(result["contracts"][0]["underlying_symbol"], "MSFT");
        assert_eq!(result["contracts"][0]["volume"], 15);
    }
}
