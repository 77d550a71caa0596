//! Options analytics engine for Optix
//!
//! This crate is a pure function library: every operation takes the data it
//! needs as arguments and returns a fresh result. Nothing here performs I/O
//! or holds state between calls.
//!
//! # Core Components
//!
//! - [`pricing`] - Black-Scholes-Merton pricing and Greeks
//! - [`strategy`] - Multi-leg strategy classification and payoff analysis
//! - [`activity`] - Unusual volume / open interest detection and flow sentiment
//! - [`chain`] - Provider option-chain payload normalisation
//! - [`assumptions`] - Explicit pricing and detection parameters
//!
//! # Key Invariants
//!
//! - Pricing inputs are rejected, never clamped
//! - Put-call parity holds for every valid input
//! - Strategy legs share one underlying and one expiration
//! - Activity output depends only on its inputs (stable ordering)
//! - Chain normalisation drops bad entries and never fails the batch

pub mod activity;
pub mod assumptions;
pub mod chain;
pub mod error;
pub mod pricing;
pub mod strategy;
pub mod types;

pub use activity::{
    ActivityBaseline, ActivityDetector, ActivityFlag, ActivityReport, FlagReason, FlowSentiment,
    SentimentValue, SkewContext,
};
pub use assumptions::{ActivityThresholds, PricingAssumptions};
pub use chain::{ChainNormalizer, NormalizedChain};
pub use error::AnalyticsError;
pub use pricing::{price_and_greeks, time_to_expiry_years};
pub use strategy::{
    Breakevens, LegAction, PnlBound, StockPosition, Strategy, StrategyAnalyzer, StrategyKind,
    StrategyLeg, StrategyProfile,
};
pub use types::{BSInputs, GreeksResult, OptionContract, OptionType};

pub type Result<T> = std::result::Result<T, AnalyticsError>;
