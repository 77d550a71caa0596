//! `analyze_options_strategy`

use analytics::{
    AnalyticsError, ChainNormalizer, LegAction, OptionContract, OptionType, StockPosition,
    Strategy, StrategyAnalyzer, StrategyLeg,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{normalize_symbol, parse_date};
use crate::context::ToolContext;
use crate::error::{unavailable, ToolResult};

const STRIKE_MATCH_EPSILON: f64 = 1e-6;

#[derive(Debug, Deserialize)]
pub struct StrategyArgs {
    pub symbol: String,
    pub legs: Vec<LegArgs>,
    #[serde(default)]
    pub spot_price: Option<f64>,
    #[serde(default)]
    pub stock: Option<StockPosition>,
    /// Caller's label; classification never reads it
    #[serde(default)]
    pub strategy_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LegArgs {
    pub strike_price: f64,
    pub expiration_date: String,
    pub option_type: String,
    pub action: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default)]
    pub contract_symbol: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl LegArgs {
    fn into_leg(self, underlying: &str, index: usize) -> Result<StrategyLeg, AnalyticsError> {
        let field = |name: &str| format!("legs[{}].{}", index, name);

        let expiration = parse_date(&field("expiration_date"), &self.expiration_date)?;
        let option_type: OptionType = self.option_type.parse()?;
        let action: LegAction = self.action.parse()?;

        let mut contract = OptionContract::new(underlying, option_type, self.strike_price, expiration);
        if let Some(symbol) = self.contract_symbol.filter(|s| !s.trim().is_empty()) {
            contract = contract.with_contract_symbol(symbol);
        }
        for (name, value) in [("bid", self.bid), ("ask", self.ask), ("last_price", self.last_price)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(AnalyticsError::invalid_parameter(format!(
                        "{} must not be negative, got {}",
                        field(name),
                        v
                    )));
                }
            }
        }
        contract.bid = self.bid;
        contract.ask = self.ask;
        contract.last_price = self.last_price;
        if let Some(v) = self.volatility {
            if !v.is_finite() || v <= 0.0 || v >= 5.0 {
                return Err(AnalyticsError::invalid_parameter(format!(
                    "{} must be between 0 and 5, got {}",
                    field("volatility"),
                    v
                )));
            }
        }
        contract.implied_volatility = self.volatility;

        Ok(StrategyLeg::new(contract, action, self.quantity))
    }
}

pub async fn analyze(ctx: &ToolContext, args: StrategyArgs) -> ToolResult<Value> {
    let symbol = normalize_symbol(&args.symbol)?;

    let legs = args
        .legs
        .into_iter()
        .enumerate()
        .map(|(index, leg)| leg.into_leg(&symbol, index))
        .collect::<Result<Vec<_>, _>>()?;

    // Validate shape before touching the provider
    let strategy = Strategy::new(legs, args.stock)?;

    let mut legs = strategy.legs().to_vec();
    let filled = fill_missing_quotes(ctx, &symbol, strategy.expiration_date(), &mut legs).await;
    let strategy = Strategy::new(legs, args.stock)?;

    let spot = match args.spot_price {
        Some(spot) => spot,
        None => ctx
            .provider
            .spot_price(&symbol)
            .await
            .map_err(|e| unavailable(&format!("spot price for {}", symbol), e))?,
    };

    let profile = StrategyAnalyzer::new(ctx.assumptions).analyze(&strategy, spot, ctx.today())?;

    let mut payload = json!(profile);
    if let Value::Object(map) = &mut payload {
        map.insert("strategy_label".to_string(), json!(args.strategy_type));
        map.insert("quotes_filled".to_string(), json!(filled));
        map.insert(
            "leg_details".to_string(),
            json!(strategy.legs()),
        );
    }
    Ok(payload)
}

/// Copy quotes from the provider chain onto legs that carry none
///
/// Chain failures are logged and leave the legs untouched; analysis then
/// prices those legs at their theoretical value. Returns the number of legs
/// that received a quote.
async fn fill_missing_quotes(
    ctx: &ToolContext,
    symbol: &str,
    expiration: NaiveDate,
    legs: &mut [StrategyLeg],
) -> usize {
    let needs_quote = |leg: &StrategyLeg| {
        leg.contract.bid.is_none() && leg.contract.ask.is_none() && leg.contract.last_price.is_none()
    };
    if !legs.iter().any(needs_quote) {
        return 0;
    }

    let raw = match ctx
        .provider
        .option_chain_snapshot(symbol, Some(expiration))
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!(%symbol, error = %e, "Option chain unavailable; legs without quotes use model prices");
            return 0;
        }
    };
    let chain = ChainNormalizer::new(ctx.today()).normalize(&raw, Some(symbol));

    let mut filled = 0;
    for leg in legs.iter_mut().filter(|leg| needs_quote(leg)) {
        let Some(quoted) = chain.contracts.iter().find(|c| same_contract(c, &leg.contract)) else {
            debug!(contract = %leg.contract.contract_symbol, "No chain quote for leg");
            continue;
        };

        leg.contract.bid = quoted.bid;
        leg.contract.ask = quoted.ask;
        leg.contract.last_price = quoted.last_price;
        if leg.contract.implied_volatility.is_none() {
            leg.contract.implied_volatility = quoted.implied_volatility;
        }
        leg.contract.volume = quoted.volume;
        leg.contract.open_interest = quoted.open_interest;
        filled += 1;
    }
    filled
}

fn same_contract(a: &OptionContract, b: &OptionContract) -> bool {
    a.option_type == b.option_type
        && a.expiration_date == b.expiration_date
        && (a.strike_price - b.strike_price).abs() < STRIKE_MATCH_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use observability::ToolMetrics;
    use provider::StaticProvider;
    use std::sync::Arc;

    fn ctx(provider: StaticProvider) -> ToolContext {
        ToolContext::new(Arc::new(provider), ToolMetrics::new("test"))
            .with_valuation_date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap())
    }

    fn leg(strike: f64, option_type: &str, action: &str) -> LegArgs {
        LegArgs {
            strike_price: strike,
            expiration_date: "2025-03-21".into(),
            option_type: option_type.into(),
            action: action.into(),
            quantity: 1,
            bid: None,
            ask: None,
            last_price: None,
            volatility: None,
            contract_symbol: None,
        }
    }

    fn quoted(mut leg: LegArgs, bid: f64, ask: f64) -> LegArgs {
        leg.bid = Some(bid);
        leg.ask = Some(ask);
        leg
    }

    fn args(legs: Vec<LegArgs>) -> StrategyArgs {
        StrategyArgs {
            symbol: "AAPL".into(),
            legs,
            spot_price: Some(100.0),
            stock: None,
            strategy_type: None,
        }
    }

    #[tokio::test]
    async fn test_long_straddle() {
        let mut a = args(vec![
            quoted(leg(100.0, "call", "buy"), 4.8, 5.0),
            quoted(leg(100.0, "put", "buy"), 4.3, 4.5),
        ]);
        a.strategy_type = Some("my straddle".into());

        let result = analyze(&ctx(StaticProvider::new()), a).await.unwrap();
        assert_eq!(result["kind"], "straddle");
        assert_eq!(result["max_profit"], "unbounded");
        assert_eq!(result["strategy_label"], "my straddle");
        assert_eq!(result["quotes_filled"], 0);
        assert_eq!(result["leg_details"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_spot_from_provider() {
        let provider = StaticProvider::new().with_price("AAPL", 101.5);
        let mut a = args(vec![quoted(leg(100.0, "call", "buy"), 2.0, 2.1)]);
        a.spot_price = None;

        let result = analyze(&ctx(provider), a).await.unwrap();
        assert_eq!(result["spot_price"], 101.5);
    }

    #[tokio::test]
    async fn test_missing_spot_is_data_unavailable() {
        let mut a = args(vec![quoted(leg(100.0, "call", "buy"), 2.0, 2.1)]);
        a.spot_price = None;

        let err = analyze(&ctx(StaticProvider::new()), a).await.unwrap_err();
        assert_eq!(err.kind(), "DataUnavailable");
    }

    #[tokio::test]
    async fn test_quotes_filled_from_chain() {
        let provider = StaticProvider::new().with_chain(
            "AAPL",
            vec![json!({
                "details": {
                    "contract_type": "call",
                    "expiration_date": "2025-03-21",
                    "strike_price": 100,
                    "ticker": "O:AAPL250321C00100000"
                },
                "last_quote": { "bid": 3.1, "ask": 3.3 },
                "implied_volatility": 0.31
            })],
        );

        let result = analyze(&ctx(provider), args(vec![leg(100.0, "call", "buy")]))
            .await
            .unwrap();
        assert_eq!(result["quotes_filled"], 1);
        assert_eq!(result["leg_details"][0]["contract"]["ask"], 3.3);
        assert_eq!(result["leg_details"][0]["contract"]["implied_volatility"], 0.31);
    }

    #[tokio::test]
    async fn test_chain_failure_is_not_fatal() {
        let result = analyze(&ctx(StaticProvider::new()), args(vec![leg(100.0, "call", "buy")]))
            .await
            .unwrap();
        assert_eq!(result["quotes_filled"], 0);
        assert_eq!(result["kind"], "custom");
    }

    #[tokio::test]
    async fn test_empty_and_inconsistent_legs() {
        let err = analyze(&ctx(StaticProvider::new()), args(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "EmptyStrategy");

        let mut later = quoted(leg(105.0, "call", "sell"), 1.0, 1.1);
        later.expiration_date = "2025-04-17".into();
        let err = analyze(
            &ctx(StaticProvider::new()),
            args(vec![quoted(leg(100.0, "call", "buy"), 2.0, 2.1), later]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "InconsistentLegs");
    }

    #[tokio::test]
    async fn test_bad_leg_fields() {
        let err = analyze(&ctx(StaticProvider::new()), args(vec![leg(100.0, "call", "hold")]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");

        let err = analyze(
            &ctx(StaticProvider::new()),
            args(vec![quoted(leg(100.0, "call", "buy"), -1.0, 2.0)]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");
    }

    #[tokio::test]
    async fn test_leg_volatility_range() {
        for vol in [0.0, -0.2, 5.0, 12.0, f64::NAN] {
            let mut bad = quoted(leg(100.0, "call", "buy"), 4.8, 5.0);
            bad.volatility = Some(vol);
            let err = analyze(&ctx(StaticProvider::new()), args(vec![bad]))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "InvalidParameter", "volatility {}", vol);
        }

        let mut good = quoted(leg(100.0, "call", "buy"), 4.8, 5.0);
        good.volatility = Some(0.3);
        assert!(analyze(&ctx(StaticProvider::new()), args(vec![good]))
            .await
            .is_ok());
    }
}
