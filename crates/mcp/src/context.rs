//! Shared, immutable state handed to every tool call

use analytics::{ActivityThresholds, PricingAssumptions};
use chrono::{Local, NaiveDate};
use config::{ActivityConfig, PricingConfig, ServiceConfig};
use observability::ToolMetrics;
use provider::MarketDataProvider;
use std::sync::Arc;

/// Provider client plus the explicit model parameters
#[derive(Clone)]
pub struct ToolContext {
    pub provider: Arc<dyn MarketDataProvider>,
    pub assumptions: PricingAssumptions,
    pub thresholds: ActivityThresholds,
    pub metrics: ToolMetrics,
    pub server_name: String,
    pub server_version: String,
    valuation_date: Option<NaiveDate>,
}

impl ToolContext {
    pub fn new(provider: Arc<dyn MarketDataProvider>, metrics: ToolMetrics) -> Self {
        Self {
            provider,
            assumptions: PricingAssumptions::default(),
            thresholds: ActivityThresholds::default(),
            metrics,
            server_name: "optix".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            valuation_date: None,
        }
    }

    /// Context with assumptions and thresholds taken from the config file
    pub fn from_config(
        config: &ServiceConfig,
        provider: Arc<dyn MarketDataProvider>,
        metrics: ToolMetrics,
    ) -> Self {
        let mut ctx = Self::new(provider, metrics)
            .with_assumptions(pricing_assumptions(&config.pricing))
            .with_thresholds(activity_thresholds(&config.activity));
        ctx.server_name = config.service.name.clone();
        ctx.server_version = config.service.version.clone();
        ctx
    }

    pub fn with_assumptions(mut self, assumptions: PricingAssumptions) -> Self {
        self.assumptions = assumptions;
        self
    }

    pub fn with_thresholds(mut self, thresholds: ActivityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Pin the valuation date instead of using the local calendar date
    pub fn with_valuation_date(mut self, date: NaiveDate) -> Self {
        self.valuation_date = Some(date);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.valuation_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("provider", &self.provider.name())
            .field("assumptions", &self.assumptions)
            .field("thresholds", &self.thresholds)
            .field("valuation_date", &self.valuation_date)
            .finish()
    }
}

pub fn pricing_assumptions(config: &PricingConfig) -> PricingAssumptions {
    PricingAssumptions {
        default_risk_free_rate: config.default_risk_free_rate,
        default_volatility: config.default_volatility,
        contract_multiplier: config.contract_multiplier,
    }
}

pub fn activity_thresholds(config: &ActivityConfig) -> ActivityThresholds {
    ActivityThresholds {
        high_volume_oi_ratio: config.high_volume_oi_ratio,
        high_volume_min_contracts: config.high_volume_min_contracts,
        block_notional_threshold: config.block_notional_threshold,
        ratio_spike_percentile: config.ratio_spike_percentile,
        skew_delta_buckets: config.skew_delta_buckets.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider::StaticProvider;

    #[test]
    fn test_from_config() {
        let mut config = config::generate_default_config();
        config.pricing.default_volatility = 0.4;
        config.activity.block_notional_threshold = 250_000.0;

        let ctx = ToolContext::from_config(
            &config,
            Arc::new(StaticProvider::new()),
            ToolMetrics::new("test"),
        );

        assert_eq!(ctx.assumptions.default_volatility, 0.4);
        assert_eq!(ctx.thresholds.block_notional_threshold, 250_000.0);
        assert_eq!(ctx.server_name, "optix");
    }

    #[test]
    fn test_pinned_valuation_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let ctx = ToolContext::new(Arc::new(StaticProvider::new()), ToolMetrics::new("test"))
            .with_valuation_date(date);
        assert_eq!(ctx.today(), date);
    }
}
