//! Market data providers
//!
//! [`MarketDataProvider`] is the seam between the tool server and whatever
//! serves quotes and option chains. [`StaticProvider`] answers from memory;
//! the `http` feature adds [`PolygonClient`] for the Polygon.io REST API.

pub mod client;
pub mod error;
pub mod types;

#[cfg(feature = "http")]
pub mod polygon;

pub use client::{MarketDataProvider, StaticProvider};
pub use error::{ProviderError, ProviderResult};
pub use types::{MarketStatus, StockQuote};

#[cfg(feature = "http")]
pub use polygon::{PolygonClient, PolygonSettings};
