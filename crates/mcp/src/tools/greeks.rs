//! `calculate_option_greeks`

use analytics::{price_and_greeks, time_to_expiry_years, BSInputs, OptionType};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{normalize_symbol, parse_date, round4};
use crate::context::ToolContext;
use crate::error::{unavailable, ToolResult};

#[derive(Debug, Deserialize)]
pub struct GreeksArgs {
    pub symbol: String,
    pub strike_price: f64,
    pub expiration_date: String,
    #[serde(default = "default_option_type")]
    pub option_type: String,
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default)]
    pub risk_free_rate: Option<f64>,
}

fn default_option_type() -> String {
    "call".to_string()
}

pub async fn option_greeks(ctx: &ToolContext, args: GreeksArgs) -> ToolResult<Value> {
    let symbol = normalize_symbol(&args.symbol)?;
    let expiration = parse_date("expiration_date", &args.expiration_date)?;
    let option_type: OptionType = args.option_type.parse()?;

    let valuation = ctx.today();
    let time = time_to_expiry_years(expiration, valuation)?;

    let spot = ctx
        .provider
        .spot_price(&symbol)
        .await
        .map_err(|e| unavailable(&format!("spot price for {}", symbol), e))?;

    let vol = args.volatility.unwrap_or(ctx.assumptions.default_volatility);
    let rate = args
        .risk_free_rate
        .unwrap_or(ctx.assumptions.default_risk_free_rate);

    let greeks = price_and_greeks(&BSInputs {
        spot,
        strike: args.strike_price,
        time,
        vol,
        rate,
        option_type,
    })?;

    Ok(json!({
        "symbol": symbol,
        "option_type": option_type,
        "strike_price": args.strike_price,
        "expiration_date": expiration,
        "spot_price": spot,
        "days_to_expiration": (expiration - valuation).num_days(),
        "time_to_expiration": round4(time),
        "volatility": vol,
        "risk_free_rate": rate,
        "theoretical_price": round4(greeks.theoretical_price),
        "greeks": {
            "delta": round4(greeks.delta),
            "gamma": round4(greeks.gamma),
            "theta": round4(greeks.theta),
            "vega": round4(greeks.vega),
            "rho": round4(greeks.rho),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use observability::ToolMetrics;
    use provider::StaticProvider;
    use std::sync::Arc;

    fn ctx() -> ToolContext {
        ToolContext::new(
            Arc::new(StaticProvider::new().with_price("AAPL", 100.0)),
            ToolMetrics::new("test"),
        )
        .with_valuation_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    fn args(option_type: &str, expiration: &str) -> GreeksArgs {
        GreeksArgs {
            symbol: "AAPL".into(),
            strike_price: 100.0,
            expiration_date: expiration.into(),
            option_type: option_type.into(),
            volatility: Some(0.2),
            risk_free_rate: Some(0.05),
        }
    }

    #[tokio::test]
    async fn test_one_year_at_the_money_call() {
        let result = option_greeks(&ctx(), args("call", "2026-01-01")).await.unwrap();

        assert_eq!(result["days_to_expiration"], 365);
        assert_eq!(result["time_to_expiration"], 1.0);
        assert_eq!(result["spot_price"], 100.0);

        let price = result["theoretical_price"].as_f64().unwrap();
        assert!((price - 10.4506).abs() < 1e-3, "price {}", price);
        let delta = result["greeks"]["delta"].as_f64().unwrap();
        assert!((delta - 0.6368).abs() < 1e-3, "delta {}", delta);
    }

    #[tokio::test]
    async fn test_put_has_negative_delta() {
        let result = option_greeks(&ctx(), args("PUT", "2026-01-01")).await.unwrap();
        assert_eq!(result["option_type"], "put");
        assert!(result["greeks"]["delta"].as_f64().unwrap() < 0.0);
    }

    #[tokio::test]
    async fn test_defaults_come_from_assumptions() {
        let mut a = args("call", "2026-01-01");
        a.volatility = None;
        a.risk_free_rate = None;

        let result = option_greeks(&ctx(), a).await.unwrap();
        assert_eq!(result["volatility"], 0.25);
        assert_eq!(result["risk_free_rate"], 0.05);
    }

    #[tokio::test]
    async fn test_invalid_inputs() {
        let err = option_greeks(&ctx(), args("straddle", "2026-01-01"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");

        let err = option_greeks(&ctx(), args("call", "2024-06-01"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");

        let mut negative_vol = args("call", "2026-01-01");
        negative_vol.volatility = Some(-0.1);
        let err = option_greeks(&ctx(), negative_vol).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");
    }

    #[tokio::test]
    async fn test_unknown_underlying_is_data_unavailable() {
        let mut a = args("call", "2026-01-01");
        a.symbol = "ZZZZ".into();
        let err = option_greeks(&ctx(), a).await.unwrap_err();
        assert_matches!(err, ToolError::Analytics(_));
        assert_eq!(err.kind(), "DataUnavailable");
    }
}
