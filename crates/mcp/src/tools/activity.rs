//! `get_unusual_options_activity`

use analytics::{ActivityBaseline, ActivityDetector, ChainNormalizer, SkewContext};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{normalize_symbol, parse_date};
use crate::context::ToolContext;
use crate::error::ToolResult;

#[derive(Debug, Deserialize)]
pub struct ActivityArgs {
    pub symbol: String,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub baseline_ratios: Option<Vec<f64>>,
}

pub async fn unusual_activity(ctx: &ToolContext, args: ActivityArgs) -> ToolResult<Value> {
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

    // Skew needs spot to tell OTM strikes apart; without it skew is
    // reported as insufficient data and the other flags still run
    let spot = match ctx.provider.spot_price(&symbol).await {
        Ok(price) => Some(price),
        Err(e) => {
            warn!(%symbol, error = %e, "Spot price unavailable; IV skew will be skipped");
            None
        }
    };

    let valuation = ctx.today();
    let chain = ChainNormalizer::new(valuation).normalize(&raw, Some(&symbol));

    let baseline = args.baseline_ratios.map(|ratios| {
        ActivityBaseline::new().with_ratios(
            &symbol,
            ratios.into_iter().filter(|r| r.is_finite() && *r >= 0.0),
        )
    });

    let detector = ActivityDetector::new(ctx.thresholds.clone(), ctx.assumptions);
    let report = detector.detect(
        &chain.contracts,
        baseline.as_ref(),
        &SkewContext::new(spot, valuation),
    );

    info!(
        %symbol,
        scanned = report.contracts_scanned,
        flags = report.flags.len(),
        "Unusual activity scan complete"
    );

    Ok(json!({
        "symbol": symbol,
        "spot_price": spot,
        "expiration_date": expiration,
        "skipped": chain.skipped,
        "contracts_scanned": report.contracts_scanned,
        "flags": report.flags,
        "sentiment": report.sentiment,
    }))
}
