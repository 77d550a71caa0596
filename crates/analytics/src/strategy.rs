//! Multi-leg strategy analysis
//!
//! A [`Strategy`] is a validated set of option legs (plus an optional stock
//! position for covered calls). [`StrategyAnalyzer`] classifies it into a
//! closed set of shapes and derives its payoff profile.
//!
//! # Conventions
//!
//! - `net_premium` is a net credit: positive when premium is received
//! - Loss amounts are reported as positive numbers
//! - Aggregate Greeks weight each leg by `+quantity` (buy) or `-quantity` (sell)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::assumptions::PricingAssumptions;
use crate::error::AnalyticsError;
use crate::pricing::{intrinsic_value, price_and_greeks, time_to_expiry_years};
use crate::types::{BSInputs, GreeksResult, OptionContract, OptionType};
use crate::Result;

const STRIKE_EPSILON: f64 = 1e-9;
const PAYOFF_EPSILON: f64 = 1e-9;

/// Direction of a leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegAction {
    Buy,
    Sell,
}

impl LegAction {
    /// Parse from string (accepts buy/long, sell/short)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "long" | "b" => Some(Self::Buy),
            "sell" | "short" | "s" => Some(Self::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    /// Exposure sign: long legs carry the option's Greeks
    pub fn position_sign(&self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => -1.0,
        }
    }

    /// Cash-flow sign: selling collects premium
    pub fn premium_sign(&self) -> f64 {
        -self.position_sign()
    }
}

impl std::str::FromStr for LegAction {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            AnalyticsError::invalid_parameter(format!("action must be buy or sell, got '{}'", s))
        })
    }
}

/// One option position within a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyLeg {
    pub contract: OptionContract,
    pub action: LegAction,
    pub quantity: u32,
}

impl StrategyLeg {
    pub fn new(contract: OptionContract, action: LegAction, quantity: u32) -> Self {
        Self {
            contract,
            action,
            quantity,
        }
    }

    pub fn buy(contract: OptionContract, quantity: u32) -> Self {
        Self::new(contract, LegAction::Buy, quantity)
    }

    pub fn sell(contract: OptionContract, quantity: u32) -> Self {
        Self::new(contract, LegAction::Sell, quantity)
    }

    /// Quoted price a trade would execute at: ask to buy, bid to sell,
    /// falling back to the last trade
    pub fn execution_price(&self) -> Option<f64> {
        let side = match self.action {
            LegAction::Buy => self.contract.ask,
            LegAction::Sell => self.contract.bid,
        };
        side.or(self.contract.last_price)
    }

    fn signed_quantity(&self) -> f64 {
        self.action.position_sign() * self.quantity as f64
    }

    fn strike(&self) -> f64 {
        self.contract.strike_price
    }

    fn option_type(&self) -> OptionType {
        self.contract.option_type
    }
}

/// Long stock held against a covered call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockPosition {
    pub shares: u32,
    /// Per-share purchase price
    pub cost_basis: f64,
}

/// Validated set of legs sharing one underlying and one expiration
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    legs: Vec<StrategyLeg>,
    stock: Option<StockPosition>,
}

impl Strategy {
    pub fn new(legs: Vec<StrategyLeg>, stock: Option<StockPosition>) -> Result<Self> {
        let first = legs.first().ok_or(AnalyticsError::EmptyStrategy)?;
        let underlying = first.contract.underlying_symbol.clone();
        let expiration = first.contract.expiration_date;

        for (index, leg) in legs.iter().enumerate() {
            if leg.quantity == 0 {
                return Err(AnalyticsError::invalid_parameter(format!(
                    "leg {} has zero quantity",
                    index
                )));
            }
            if !leg.contract.underlying_symbol.eq_ignore_ascii_case(&underlying) {
                return Err(AnalyticsError::inconsistent_legs(format!(
                    "leg {} is on {} but the strategy is on {}",
                    index, leg.contract.underlying_symbol, underlying
                )));
            }
            if leg.contract.expiration_date != expiration {
                return Err(AnalyticsError::inconsistent_legs(format!(
                    "leg {} expires {} but the strategy expires {}",
                    index, leg.contract.expiration_date, expiration
                )));
            }
        }

        if let Some(stock) = &stock {
            if stock.shares == 0 {
                return Err(AnalyticsError::invalid_parameter(
                    "stock position must hold at least one share",
                ));
            }
            if !stock.cost_basis.is_finite() || stock.cost_basis <= 0.0 {
                return Err(AnalyticsError::invalid_parameter(format!(
                    "stock cost basis must be positive, got {}",
                    stock.cost_basis
                )));
            }
        }

        Ok(Self { legs, stock })
    }

    pub fn legs(&self) -> &[StrategyLeg] {
        &self.legs
    }

    pub fn stock(&self) -> Option<&StockPosition> {
        self.stock.as_ref()
    }

    pub fn underlying_symbol(&self) -> &str {
        &self.legs[0].contract.underlying_symbol
    }

    pub fn expiration_date(&self) -> NaiveDate {
        self.legs[0].contract.expiration_date
    }
}

/// Recognised strategy shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CoveredCall,
    VerticalSpread,
    Straddle,
    Strangle,
    IronCondor,
    Custom,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoveredCall => "covered_call",
            Self::VerticalSpread => "vertical_spread",
            Self::Straddle => "straddle",
            Self::Strangle => "strangle",
            Self::IronCondor => "iron_condor",
            Self::Custom => "custom",
        }
    }
}

/// A profit or loss extreme
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PnlBound {
    Bounded(f64),
    Unbounded,
    Undetermined,
}

impl PnlBound {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Bounded(v) => Some(*v),
            _ => None,
        }
    }
}

impl Serialize for PnlBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Bounded(v) => serializer.serialize_f64(*v),
            Self::Unbounded => serializer.serialize_str("unbounded"),
            Self::Undetermined => serializer.serialize_str("undetermined"),
        }
    }
}

/// Underlying prices at which the position breaks even at expiry
#[derive(Debug, Clone, PartialEq)]
pub enum Breakevens {
    Points(Vec<f64>),
    Undetermined,
}

impl Breakevens {
    pub fn points(&self) -> Option<&[f64]> {
        match self {
            Self::Points(p) => Some(p),
            Self::Undetermined => None,
        }
    }
}

impl Serialize for Breakevens {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Points(points) => points.serialize(serializer),
            Self::Undetermined => serializer.serialize_str("undetermined"),
        }
    }
}

/// Payoff and risk profile of a strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyProfile {
    pub kind: StrategyKind,
    pub underlying_symbol: String,
    pub expiration_date: NaiveDate,
    pub spot_price: f64,
    pub legs: usize,
    pub net_premium: f64,
    pub max_profit: PnlBound,
    pub max_loss: PnlBound,
    pub breakevens: Breakevens,
    pub greeks: GreeksResult,
}

/// Classifies strategies and computes their payoff profiles
#[derive(Debug, Clone)]
pub struct StrategyAnalyzer {
    assumptions: PricingAssumptions,
}

impl StrategyAnalyzer {
    pub fn new(assumptions: PricingAssumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &PricingAssumptions {
        &self.assumptions
    }

    /// Structural classification of the legs
    pub fn classify(&self, strategy: &Strategy) -> StrategyKind {
        let legs = strategy.legs();

        if let Some(stock) = strategy.stock() {
            return match legs {
                [leg] if leg.option_type() == OptionType::Call
                    && leg.action == LegAction::Sell
                    && stock.shares as f64
                        == leg.quantity as f64 * self.assumptions.contract_multiplier =>
                {
                    StrategyKind::CoveredCall
                }
                _ => StrategyKind::Custom,
            };
        }

        match legs {
            [a, b] => classify_pair(a, b),
            [_, _, _, _] => classify_four(legs),
            _ => StrategyKind::Custom,
        }
    }

    /// Full profile at the given spot price and valuation date
    pub fn analyze(
        &self,
        strategy: &Strategy,
        spot: f64,
        valuation_date: NaiveDate,
    ) -> Result<StrategyProfile> {
        if !spot.is_finite() || spot <= 0.0 {
            return Err(AnalyticsError::invalid_parameter(format!(
                "spot must be positive, got {}",
                spot
            )));
        }

        let time = time_to_expiry_years(strategy.expiration_date(), valuation_date)?;
        let multiplier = self.assumptions.contract_multiplier;

        let mut greeks = GreeksResult::default();
        let mut net_premium = 0.0;

        for leg in strategy.legs() {
            let leg_greeks = price_and_greeks(&BSInputs {
                spot,
                strike: leg.strike(),
                time,
                vol: leg
                    .contract
                    .implied_volatility
                    .unwrap_or(self.assumptions.default_volatility),
                rate: self.assumptions.default_risk_free_rate,
                option_type: leg.option_type(),
            })?;

            greeks.accumulate(&leg_greeks, leg.signed_quantity());

            let price = leg
                .execution_price()
                .unwrap_or(leg_greeks.theoretical_price);
            net_premium += price * leg.quantity as f64 * multiplier * leg.action.premium_sign();
        }

        if let Some(stock) = strategy.stock() {
            greeks.delta += stock.shares as f64 / multiplier;
        }

        let kind = self.classify(strategy);
        debug!(
            kind = kind.as_str(),
            legs = strategy.legs().len(),
            net_premium,
            "strategy classified"
        );

        let (max_profit, max_loss, breakevens) = match kind {
            StrategyKind::Custom => (
                PnlBound::Undetermined,
                PnlBound::Undetermined,
                Breakevens::Undetermined,
            ),
            _ => ExpiryPayoff::new(strategy, net_premium, multiplier).extremes(),
        };

        Ok(StrategyProfile {
            kind,
            underlying_symbol: strategy.underlying_symbol().to_string(),
            expiration_date: strategy.expiration_date(),
            spot_price: spot,
            legs: strategy.legs().len(),
            net_premium,
            max_profit,
            max_loss,
            breakevens,
            greeks,
        })
    }
}

fn same_strike(a: f64, b: f64) -> bool {
    (a - b).abs() < STRIKE_EPSILON
}

fn classify_pair(a: &StrategyLeg, b: &StrategyLeg) -> StrategyKind {
    if a.quantity != b.quantity {
        return StrategyKind::Custom;
    }

    if a.option_type() == b.option_type() {
        if a.action != b.action && !same_strike(a.strike(), b.strike()) {
            return StrategyKind::VerticalSpread;
        }
        return StrategyKind::Custom;
    }

    if a.action != b.action {
        return StrategyKind::Custom;
    }

    let (call, put) = match a.option_type() {
        OptionType::Call => (a, b),
        OptionType::Put => (b, a),
    };

    if same_strike(put.strike(), call.strike()) {
        StrategyKind::Straddle
    } else if put.strike() < call.strike() {
        StrategyKind::Strangle
    } else {
        StrategyKind::Custom
    }
}

fn classify_four(legs: &[StrategyLeg]) -> StrategyKind {
    let quantity = legs[0].quantity;
    if legs.iter().any(|leg| leg.quantity != quantity) {
        return StrategyKind::Custom;
    }

    let mut puts: Vec<&StrategyLeg> = legs
        .iter()
        .filter(|leg| leg.option_type() == OptionType::Put)
        .collect();
    let mut calls: Vec<&StrategyLeg> = legs
        .iter()
        .filter(|leg| leg.option_type() == OptionType::Call)
        .collect();

    if puts.len() != 2 || calls.len() != 2 {
        return StrategyKind::Custom;
    }

    puts.sort_by(|a, b| a.strike().total_cmp(&b.strike()));
    calls.sort_by(|a, b| a.strike().total_cmp(&b.strike()));

    let (long_put, short_put) = (puts[0], puts[1]);
    let (short_call, long_call) = (calls[0], calls[1]);

    let actions_match = long_put.action == LegAction::Buy
        && short_put.action == LegAction::Sell
        && short_call.action == LegAction::Sell
        && long_call.action == LegAction::Buy;

    let strikes_ordered = long_put.strike() < short_put.strike() - STRIKE_EPSILON
        && short_put.strike() <= short_call.strike() + STRIKE_EPSILON
        && short_call.strike() < long_call.strike() - STRIKE_EPSILON;

    if actions_match && strikes_ordered {
        StrategyKind::IronCondor
    } else {
        StrategyKind::Custom
    }
}

/// Piecewise-linear value of the position at expiration, in currency
struct ExpiryPayoff<'a> {
    strategy: &'a Strategy,
    net_premium: f64,
    multiplier: f64,
}

impl<'a> ExpiryPayoff<'a> {
    fn new(strategy: &'a Strategy, net_premium: f64, multiplier: f64) -> Self {
        Self {
            strategy,
            net_premium,
            multiplier,
        }
    }

    fn value_at(&self, price: f64) -> f64 {
        let options: f64 = self
            .strategy
            .legs()
            .iter()
            .map(|leg| {
                leg.signed_quantity()
                    * self.multiplier
                    * intrinsic_value(price, leg.strike(), leg.option_type())
            })
            .sum();

        let stock = self
            .strategy
            .stock()
            .map(|s| s.shares as f64 * (price - s.cost_basis))
            .unwrap_or(0.0);

        options + stock + self.net_premium
    }

    /// Slope of the payoff above the highest strike
    fn terminal_slope(&self) -> f64 {
        let calls: f64 = self
            .strategy
            .legs()
            .iter()
            .filter(|leg| leg.option_type() == OptionType::Call)
            .map(|leg| leg.signed_quantity() * self.multiplier)
            .sum();

        let shares = self
            .strategy
            .stock()
            .map(|s| s.shares as f64)
            .unwrap_or(0.0);

        calls + shares
    }

    /// Zero and every distinct strike, ascending
    fn critical_prices(&self) -> Vec<f64> {
        let mut prices: Vec<f64> = std::iter::once(0.0)
            .chain(self.strategy.legs().iter().map(|leg| leg.strike()))
            .collect();
        prices.sort_by(|a, b| a.total_cmp(b));
        prices.dedup_by(|a, b| same_strike(*a, *b));
        prices
    }

    fn extremes(&self) -> (PnlBound, PnlBound, Breakevens) {
        let prices = self.critical_prices();
        let values: Vec<f64> = prices.iter().map(|p| self.value_at(*p)).collect();
        let slope = self.terminal_slope();

        let highest = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest = values.iter().copied().fold(f64::INFINITY, f64::min);

        let max_profit = if slope > PAYOFF_EPSILON {
            PnlBound::Unbounded
        } else {
            PnlBound::Bounded(highest)
        };
        let max_loss = if slope < -PAYOFF_EPSILON {
            PnlBound::Unbounded
        } else {
            PnlBound::Bounded(-lowest)
        };

        (max_profit, max_loss, Breakevens::Points(breakevens(&prices, &values, slope)))
    }
}

fn breakevens(prices: &[f64], values: &[f64], terminal_slope: f64) -> Vec<f64> {
    let mut points: Vec<f64> = Vec::new();
    let mut push = |p: f64| {
        if points.last().map_or(true, |last| (p - last).abs() > PAYOFF_EPSILON) {
            points.push(p);
        }
    };

    for i in 0..prices.len() {
        let (p0, v0) = (prices[i], values[i]);

        if v0.abs() <= PAYOFF_EPSILON {
            push(p0);
            continue;
        }

        if let (Some(&p1), Some(&v1)) = (prices.get(i + 1), values.get(i + 1)) {
            if v1.abs() > PAYOFF_EPSILON && v0.signum() != v1.signum() {
                push(p0 + (0.0 - v0) * (p1 - p0) / (v1 - v0));
            }
        } else if terminal_slope.abs() > PAYOFF_EPSILON && v0.signum() != terminal_slope.signum() {
            push(p0 - v0 / terminal_slope);
        }
    }

    points
}
