//! Unusual options activity detection
//!
//! Flags contracts whose volume, traded notional or volume/open-interest
//! ratio stands out, and summarises flow sentiment through the put/call
//! volume ratio and out-of-the-money IV skew.
//!
//! Output order is fully determined by the input order: contracts are
//! scanned in sequence and each contract's flags follow [`FlagReason`]
//! order. Per-underlying statistics live in ordered maps.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::debug;

use crate::assumptions::{ActivityThresholds, PricingAssumptions};
use crate::pricing::{price_and_greeks, time_to_expiry_years};
use crate::types::{BSInputs, OptionContract, OptionType};

/// Minimum OTM contracts with IV required on each side for a skew reading
const MIN_SKEW_CONTRACTS: usize = 2;

/// Minimum observations before a ratio percentile is meaningful
const MIN_RATIO_POPULATION: usize = 2;

/// Why a contract was flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagReason {
    HighVolume,
    LargeBlock,
    VolOiRatioSpike,
}

/// A single unusual-activity observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityFlag {
    pub contract_symbol: String,
    pub reason: FlagReason,
    /// Observed value relative to the threshold or baseline it crossed
    pub magnitude: f64,
}

/// A sentiment metric that may not be computable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SentimentValue {
    Value(f64),
    Undefined,
    InsufficientData,
}

impl SentimentValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl Serialize for SentimentValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::Undefined => serializer.serialize_str("undefined"),
            Self::InsufficientData => serializer.serialize_str("insufficient_data"),
        }
    }
}

/// Aggregate flow sentiment over a set of contracts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSentiment {
    pub put_call_ratio: SentimentValue,
    pub iv_skew: SentimentValue,
    pub call_volume: u64,
    pub put_volume: u64,
}

impl FlowSentiment {
    fn insufficient() -> Self {
        Self {
            put_call_ratio: SentimentValue::InsufficientData,
            iv_skew: SentimentValue::InsufficientData,
            call_volume: 0,
            put_volume: 0,
        }
    }
}

/// Flags plus sentiment for one scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityReport {
    pub flags: Vec<ActivityFlag>,
    pub sentiment: FlowSentiment,
    pub contracts_scanned: usize,
}

/// Historical volume/OI ratios per underlying, supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityBaseline {
    #[serde(default)]
    ratios: BTreeMap<String, Vec<f64>>,
}

impl ActivityBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ratios(mut self, underlying: &str, ratios: impl IntoIterator<Item = f64>) -> Self {
        self.ratios
            .entry(underlying.to_uppercase())
            .or_default()
            .extend(ratios.into_iter().filter(|r| r.is_finite() && *r >= 0.0));
        self
    }

    pub fn ratios_for(&self, underlying: &str) -> &[f64] {
        self.ratios
            .get(&underlying.to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Market context needed to place contracts in delta buckets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewContext {
    pub spot: Option<f64>,
    pub valuation_date: NaiveDate,
}

impl SkewContext {
    pub fn new(spot: Option<f64>, valuation_date: NaiveDate) -> Self {
        Self {
            spot,
            valuation_date,
        }
    }
}

/// Threshold band for the volume/OI spike rule of one underlying
#[derive(Debug, Clone, Copy)]
struct RatioBand {
    threshold: f64,
    median: f64,
}

/// Stateless unusual-activity detector
#[derive(Debug, Clone)]
pub struct ActivityDetector {
    thresholds: ActivityThresholds,
    assumptions: PricingAssumptions,
}

impl ActivityDetector {
    pub fn new(thresholds: ActivityThresholds, assumptions: PricingAssumptions) -> Self {
        Self {
            thresholds,
            assumptions,
        }
    }

    pub fn thresholds(&self) -> &ActivityThresholds {
        &self.thresholds
    }

    /// Flag unusual contracts
    pub fn scan(
        &self,
        contracts: &[OptionContract],
        baseline: Option<&ActivityBaseline>,
    ) -> Vec<ActivityFlag> {
        let bands = self.ratio_bands(contracts, baseline);
        let mut flags = Vec::new();

        for contract in contracts {
            if let Some(magnitude) = self.high_volume(contract) {
                flags.push(flag(contract, FlagReason::HighVolume, magnitude));
            }
            if let Some(magnitude) = self.large_block(contract) {
                flags.push(flag(contract, FlagReason::LargeBlock, magnitude));
            }
            if let Some(magnitude) = ratio_spike(contract, &bands) {
                flags.push(flag(contract, FlagReason::VolOiRatioSpike, magnitude));
            }
        }

        debug!(
            scanned = contracts.len(),
            flagged = flags.len(),
            "activity scan complete"
        );
        flags
    }

    /// Put/call volume ratio and OTM IV skew
    pub fn sentiment(&self, contracts: &[OptionContract], context: &SkewContext) -> FlowSentiment {
        if contracts.is_empty() {
            return FlowSentiment::insufficient();
        }

        let (call_volume, put_volume) =
            contracts
                .iter()
                .fold((0u64, 0u64), |(calls, puts), c| match c.option_type {
                    OptionType::Call => (calls.saturating_add(c.volume), puts),
                    OptionType::Put => (calls, puts.saturating_add(c.volume)),
                });

        let put_call_ratio = if call_volume == 0 {
            SentimentValue::Undefined
        } else {
            SentimentValue::Value(put_volume as f64 / call_volume as f64)
        };

        FlowSentiment {
            put_call_ratio,
            iv_skew: self.iv_skew(contracts, context),
            call_volume,
            put_volume,
        }
    }

    /// Scan and sentiment in one pass over the same contracts
    pub fn detect(
        &self,
        contracts: &[OptionContract],
        baseline: Option<&ActivityBaseline>,
        context: &SkewContext,
    ) -> ActivityReport {
        ActivityReport {
            flags: self.scan(contracts, baseline),
            sentiment: self.sentiment(contracts, context),
            contracts_scanned: contracts.len(),
        }
    }

    fn high_volume(&self, contract: &OptionContract) -> Option<f64> {
        let t = &self.thresholds;
        let volume = contract.volume as f64;
        let oi_bar = t.high_volume_oi_ratio * contract.open_interest as f64;

        if volume > oi_bar && contract.volume > t.high_volume_min_contracts {
            Some(if oi_bar > 0.0 {
                volume / oi_bar
            } else {
                volume / t.high_volume_min_contracts.max(1) as f64
            })
        } else {
            None
        }
    }

    fn large_block(&self, contract: &OptionContract) -> Option<f64> {
        let price = contract.last_price.or_else(|| contract.mid_price())?;
        let notional = contract.volume as f64 * price * self.assumptions.contract_multiplier;
        let threshold = self.thresholds.block_notional_threshold;

        if threshold > 0.0 && notional > threshold {
            Some(notional / threshold)
        } else {
            None
        }
    }

    fn ratio_bands<'a>(
        &self,
        contracts: &'a [OptionContract],
        baseline: Option<&ActivityBaseline>,
    ) -> BTreeMap<&'a str, RatioBand> {
        let mut populations: BTreeMap<&'a str, Vec<f64>> = BTreeMap::new();
        for contract in contracts {
            if let Some(ratio) = contract.vol_oi_ratio() {
                populations
                    .entry(contract.underlying_symbol.as_str())
                    .or_default()
                    .push(ratio);
            }
        }

        populations
            .into_iter()
            .filter_map(|(underlying, mut ratios)| {
                if let Some(baseline) = baseline {
                    ratios.extend_from_slice(baseline.ratios_for(underlying));
                }
                if ratios.len() < MIN_RATIO_POPULATION {
                    return None;
                }
                ratios.sort_by(|a, b| a.total_cmp(b));

                let median = median(&ratios);
                let threshold = nearest_rank(&ratios, self.thresholds.ratio_spike_percentile);
                Some((underlying, RatioBand { threshold, median }))
            })
            .collect()
    }

    fn iv_skew(&self, contracts: &[OptionContract], context: &SkewContext) -> SentimentValue {
        let Some(spot) = context.spot.filter(|s| s.is_finite() && *s > 0.0) else {
            return SentimentValue::InsufficientData;
        };
        let edges = &self.thresholds.skew_delta_buckets;

        let mut puts: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        let mut calls: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        let (mut otm_puts, mut otm_calls) = (0usize, 0usize);

        for contract in contracts {
            let Some(iv) = contract.implied_volatility else {
                continue;
            };
            let otm = match contract.option_type {
                OptionType::Put => contract.strike_price < spot,
                OptionType::Call => contract.strike_price > spot,
            };
            if !otm {
                continue;
            }

            match contract.option_type {
                OptionType::Put => otm_puts += 1,
                OptionType::Call => otm_calls += 1,
            }

            let Some(bucket) = self.delta_bucket(contract, spot, iv, context.valuation_date, edges)
            else {
                continue;
            };
            let side = match contract.option_type {
                OptionType::Put => &mut puts,
                OptionType::Call => &mut calls,
            };
            side.entry(bucket).or_default().push(iv);
        }

        if otm_puts < MIN_SKEW_CONTRACTS || otm_calls < MIN_SKEW_CONTRACTS {
            return SentimentValue::InsufficientData;
        }

        let spreads: Vec<f64> = puts
            .iter()
            .filter_map(|(bucket, put_ivs)| {
                calls
                    .get(bucket)
                    .map(|call_ivs| mean(put_ivs) - mean(call_ivs))
            })
            .collect();

        if spreads.is_empty() {
            SentimentValue::InsufficientData
        } else {
            SentimentValue::Value(mean(&spreads))
        }
    }

    fn delta_bucket(
        &self,
        contract: &OptionContract,
        spot: f64,
        iv: f64,
        valuation_date: NaiveDate,
        edges: &[f64],
    ) -> Option<usize> {
        let time = time_to_expiry_years(contract.expiration_date, valuation_date).ok()?;
        let greeks = price_and_greeks(&BSInputs {
            spot,
            strike: contract.strike_price,
            time,
            vol: iv,
            rate: self.assumptions.default_risk_free_rate,
            option_type: contract.option_type,
        })
        .ok()?;

        bucket_index(greeks.delta.abs(), edges)
    }
}

fn flag(contract: &OptionContract, reason: FlagReason, magnitude: f64) -> ActivityFlag {
    ActivityFlag {
        contract_symbol: contract.contract_symbol.clone(),
        reason,
        magnitude,
    }
}

fn ratio_spike(contract: &OptionContract, bands: &BTreeMap<&str, RatioBand>) -> Option<f64> {
    let band = bands.get(contract.underlying_symbol.as_str())?;
    let ratio = contract.vol_oi_ratio()?;

    if ratio >= band.threshold && ratio > band.median {
        // A zero median leaves the ratio itself as the magnitude
        Some(if band.median > 0.0 {
            ratio / band.median
        } else {
            ratio
        })
    } else {
        None
    }
}

/// Nearest-rank percentile of an ascending, non-empty slice
fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let p = percentile.clamp(0.0, 100.0);
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Median of an ascending, non-empty slice
fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Index `i` with `edges[i] <= value < edges[i + 1]`; the top edge is inclusive
fn bucket_index(value: f64, edges: &[f64]) -> Option<usize> {
    let last = edges.len().checked_sub(1)?;
    (0..last).find(|&i| {
        let upper_ok = if i + 1 == last {
            value <= edges[i + 1]
        } else {
            value < edges[i + 1]
        };
        value >= edges[i] && upper_ok
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
