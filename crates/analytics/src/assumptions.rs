//! Explicit model and detection parameters
//!
//! Every default lives here and is passed into the engine by value; there
//! are no module-level rates or volatilities anywhere else in the crate.

use serde::{Deserialize, Serialize};

/// Shares controlled by one listed equity option contract
pub const DEFAULT_CONTRACT_MULTIPLIER: f64 = 100.0;

/// Pricing assumptions used when the caller does not supply a value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingAssumptions {
    /// Annualised risk-free rate (decimal)
    pub default_risk_free_rate: f64,
    /// Volatility applied to legs without an implied volatility
    pub default_volatility: f64,
    /// Currency value of one point of option premium
    pub contract_multiplier: f64,
}

impl Default for PricingAssumptions {
    fn default() -> Self {
        Self {
            default_risk_free_rate: 0.05,
            default_volatility: 0.25,
            contract_multiplier: DEFAULT_CONTRACT_MULTIPLIER,
        }
    }
}

impl PricingAssumptions {
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.default_risk_free_rate = rate;
        self
    }

    pub fn with_volatility(mut self, vol: f64) -> Self {
        self.default_volatility = vol;
        self
    }
}

/// Thresholds for unusual-activity detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityThresholds {
    /// `k` in `volume > k * open_interest`
    pub high_volume_oi_ratio: f64,
    /// Volume floor a HIGH_VOLUME contract must exceed
    pub high_volume_min_contracts: u64,
    /// Premium notional (currency) a LARGE_BLOCK must exceed
    pub block_notional_threshold: f64,
    /// Percentile (0-100] of the volume/OI population that marks a spike
    pub ratio_spike_percentile: f64,
    /// Ascending |delta| bucket edges used to pair puts and calls for skew
    pub skew_delta_buckets: Vec<f64>,
}

impl Default for ActivityThresholds {
    fn default() -> Self {
        Self {
            high_volume_oi_ratio: 0.5,
            high_volume_min_contracts: 500,
            block_notional_threshold: 100_000.0,
            ratio_spike_percentile: 95.0,
            skew_delta_buckets: vec![0.1, 0.2, 0.3, 0.4, 0.5],
        }
    }
}
