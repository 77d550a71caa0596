//! Shared types for the analytics engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::Result;

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Parse from string (case-insensitive, accepts `c`/`p`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "call" | "c" => Some(Self::Call),
            "put" | "p" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }

    /// Single-letter code used in OCC contract symbols
    pub fn occ_code(&self) -> char {
        match self {
            Self::Call => 'C',
            Self::Put => 'P',
        }
    }
}

impl std::str::FromStr for OptionType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            AnalyticsError::invalid_parameter(format!("option type must be call or put, got '{}'", s))
        })
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for Black-Scholes pricing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BSInputs {
    /// Spot price of the underlying
    pub spot: f64,
    /// Strike price
    pub strike: f64,
    /// Time to expiry (in years)
    pub time: f64,
    /// Volatility (as decimal, e.g., 0.25 = 25%)
    pub vol: f64,
    /// Continuously compounded risk-free rate
    pub rate: f64,
    /// Option type
    pub option_type: OptionType,
}

impl BSInputs {
    /// Check inputs against the model's domain
    ///
    /// Out-of-domain values are rejected rather than clamped so callers
    /// never receive a price computed from numbers they did not supply.
    pub fn validate(&self) -> Result<()> {
        if !self.spot.is_finite() || self.spot <= 0.0 {
            return Err(AnalyticsError::invalid_parameter(format!(
                "spot must be positive, got {}",
                self.spot
            )));
        }
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(AnalyticsError::invalid_parameter(format!(
                "strike must be positive, got {}",
                self.strike
            )));
        }
        if !self.vol.is_finite() || self.vol <= 0.0 {
            return Err(AnalyticsError::invalid_parameter(format!(
                "volatility must be positive, got {}",
                self.vol
            )));
        }
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(AnalyticsError::invalid_parameter(format!(
                "time to expiry must not be negative, got {}",
                self.time
            )));
        }
        if !self.rate.is_finite() {
            return Err(AnalyticsError::invalid_parameter("risk-free rate must be finite"));
        }
        Ok(())
    }
}

/// Option Greeks together with the model price
///
/// Theta is per calendar day. Vega and rho are per one percentage point
/// move in volatility and rate respectively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GreeksResult {
    /// Delta: ∂V/∂S
    pub delta: f64,
    /// Gamma: ∂²V/∂S²
    pub gamma: f64,
    /// Theta: ∂V/∂t per day
    pub theta: f64,
    /// Vega: ∂V/∂σ per vol point
    pub vega: f64,
    /// Rho: ∂V/∂r per rate point
    pub rho: f64,
    /// Model value of the option
    pub theoretical_price: f64,
}

impl GreeksResult {
    /// Add `other` scaled by `weight` into this result
    pub fn accumulate(&mut self, other: &GreeksResult, weight: f64) {
        self.delta += other.delta * weight;
        self.gamma += other.gamma * weight;
        self.theta += other.theta * weight;
        self.vega += other.vega * weight;
        self.rho += other.rho * weight;
        self.theoretical_price += other.theoretical_price * weight;
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = Self::default();
        out.accumulate(self, factor);
        out
    }
}

/// Canonical option contract record
///
/// Produced by [`ChainNormalizer`](crate::chain::ChainNormalizer) or built
/// directly by callers. Prices are never negative and implied volatility,
/// when present, lies in (0, 5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub underlying_symbol: String,
    pub contract_symbol: String,
    pub option_type: OptionType,
    pub strike_price: f64,
    pub expiration_date: NaiveDate,
    #[serde(default)]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub volume: u64,
    #[serde(default)]
    pub open_interest: u64,
    #[serde(default)]
    pub implied_volatility: Option<f64>,
}

impl OptionContract {
    /// Create a contract with no market data attached
    pub fn new(
        underlying: &str,
        option_type: OptionType,
        strike_price: f64,
        expiration_date: NaiveDate,
    ) -> Self {
        let underlying_symbol = underlying.trim().to_uppercase();
        let contract_symbol =
            occ_symbol(&underlying_symbol, expiration_date, option_type, strike_price);

        Self {
            underlying_symbol,
            contract_symbol,
            option_type,
            strike_price,
            expiration_date,
            last_price: None,
            bid: None,
            ask: None,
            volume: 0,
            open_interest: 0,
            implied_volatility: None,
        }
    }

    pub fn with_contract_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.contract_symbol = symbol.into();
        self
    }

    pub fn with_quote(mut self, bid: f64, ask: f64) -> Self {
        self.bid = Some(bid);
        self.ask = Some(ask);
        self
    }

    pub fn with_last_price(mut self, price: f64) -> Self {
        self.last_price = Some(price);
        self
    }

    pub fn with_activity(mut self, volume: u64, open_interest: u64) -> Self {
        self.volume = volume;
        self.open_interest = open_interest;
        self
    }

    pub fn with_implied_volatility(mut self, iv: f64) -> Self {
        self.implied_volatility = Some(iv);
        self
    }

    /// Midpoint of bid and ask when both sides are quoted
    pub fn mid_price(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            _ => None,
        }
    }

    /// Volume divided by open interest; `None` without open interest
    pub fn vol_oi_ratio(&self) -> Option<f64> {
        if self.open_interest == 0 {
            None
        } else {
            Some(self.volume as f64 / self.open_interest as f64)
        }
    }
}

/// Build an OCC-style contract ticker, e.g. `O:AAPL250117C00150000`
pub fn occ_symbol(
    underlying: &str,
    expiration: NaiveDate,
    option_type: OptionType,
    strike: f64,
) -> String {
    let strike_thousandths = (strike * 1000.0).round().max(0.0) as u64;
    format!(
        "O:{}{}{}{:08}",
        underlying.to_uppercase(),
        expiration.format("%y%m%d"),
        option_type.occ_code(),
        strike_thousandths
    )
}
