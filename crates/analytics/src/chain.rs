//! Option chain normalisation
//!
//! Maps raw provider snapshot payloads onto [`OptionContract`]. This is the
//! only place in the engine that knows provider field names. Bad entries are
//! skipped and counted; a batch never fails as a whole.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AnalyticsError;
use crate::types::{OptionContract, OptionType};
use crate::Result;

/// Implied volatility at or above this is treated as a bad print
const MAX_IMPLIED_VOLATILITY: f64 = 5.0;

/// Length of the OCC suffix `YYMMDD` + `C|P` + 8-digit strike
const OCC_SUFFIX_LEN: usize = 15;

// Candidate paths per field, most specific first. Canonical names are
// included so normalised output can be fed back in.
const STRIKE: &[&str] = &["details.strike_price", "strike_price", "strike"];
const EXPIRATION: &[&str] = &["details.expiration_date", "expiration_date", "expiration"];
const OPTION_TYPE: &[&str] = &[
    "details.contract_type",
    "contract_type",
    "option_type",
    "type",
];
const TICKER: &[&str] = &[
    "details.ticker",
    "contract_symbol",
    "ticker",
    "contract_ticker",
];
const UNDERLYING: &[&str] = &[
    "underlying_asset.ticker",
    "underlying_symbol",
    "underlying_ticker",
    "underlying",
];
const LAST_PRICE: &[&str] = &["last_trade.price", "day.close", "last_price"];
const BID: &[&str] = &["last_quote.bid", "bid"];
const ASK: &[&str] = &["last_quote.ask", "ask"];
const VOLUME: &[&str] = &["day.volume", "volume"];
const OPEN_INTEREST: &[&str] = &["open_interest"];
const IMPLIED_VOLATILITY: &[&str] = &["implied_volatility", "iv"];

/// Result of normalising one payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedChain {
    pub contracts: Vec<OptionContract>,
    /// Entries dropped as malformed
    pub skipped: usize,
}

impl NormalizedChain {
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

/// Converts provider payloads into canonical contracts
#[derive(Debug, Clone, Copy)]
pub struct ChainNormalizer {
    valuation_date: NaiveDate,
}

impl ChainNormalizer {
    pub fn new(valuation_date: NaiveDate) -> Self {
        Self { valuation_date }
    }

    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }

    /// Normalise a `{"results": [...]}` envelope or a bare array
    ///
    /// `underlying_hint` is used for entries that carry no underlying of
    /// their own before falling back to parsing the contract ticker.
    pub fn normalize(&self, raw: &Value, underlying_hint: Option<&str>) -> NormalizedChain {
        let entries: &[Value] = match raw {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => match map.get("results") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => &[],
            },
            _ => &[],
        };

        let hint = underlying_hint
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase);

        let mut chain = NormalizedChain::default();
        for (index, entry) in entries.iter().enumerate() {
            match self.normalize_entry(entry, hint.as_deref()) {
                Ok(contract) => chain.contracts.push(contract),
                Err(e) => {
                    debug!(index, error = %e, "skipping chain entry");
                    chain.skipped += 1;
                }
            }
        }

        if chain.skipped > 0 {
            warn!(
                skipped = chain.skipped,
                kept = chain.contracts.len(),
                "dropped malformed option chain entries"
            );
        }

        chain
    }

    /// Normalise a single entry
    pub fn normalize_entry(
        &self,
        entry: &Value,
        underlying_hint: Option<&str>,
    ) -> Result<OptionContract> {
        if !entry.is_object() {
            return Err(AnalyticsError::malformed("entry is not an object"));
        }

        let strike_price = lookup(entry, STRIKE)
            .and_then(as_f64)
            .filter(|s| s.is_finite() && *s > 0.0)
            .ok_or_else(|| AnalyticsError::malformed("missing or invalid strike"))?;

        let expiration_date = lookup(entry, EXPIRATION)
            .and_then(as_date)
            .ok_or_else(|| AnalyticsError::malformed("missing or invalid expiration date"))?;
        if expiration_date < self.valuation_date {
            return Err(AnalyticsError::malformed(format!(
                "expiration {} is before valuation date {}",
                expiration_date, self.valuation_date
            )));
        }

        let option_type = lookup(entry, OPTION_TYPE)
            .and_then(Value::as_str)
            .and_then(OptionType::parse)
            .ok_or_else(|| AnalyticsError::malformed("missing or invalid option type"))?;

        let ticker = lookup(entry, TICKER)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let underlying = lookup(entry, UNDERLYING)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| underlying_hint.map(str::to_string))
            .or_else(|| ticker.and_then(underlying_from_occ))
            .ok_or_else(|| AnalyticsError::malformed("missing underlying symbol"))?;

        // Without a provider ticker the OCC symbol from `new` stands
        let mut contract =
            OptionContract::new(&underlying, option_type, strike_price, expiration_date);
        if let Some(ticker) = ticker {
            contract.contract_symbol = ticker.to_string();
        }

        contract.last_price = price(entry, LAST_PRICE);
        contract.bid = price(entry, BID);
        contract.ask = price(entry, ASK);
        contract.volume = count(entry, VOLUME);
        contract.open_interest = count(entry, OPEN_INTEREST);
        contract.implied_volatility = lookup(entry, IMPLIED_VOLATILITY)
            .and_then(as_f64)
            .filter(|iv| iv.is_finite() && *iv > 0.0 && *iv < MAX_IMPLIED_VOLATILITY);

        Ok(contract)
    }
}

/// First non-null value among dotted paths
fn lookup<'a>(entry: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| {
        path.split('.')
            .try_fold(entry, |node, key| node.get(key))
            .filter(|v| !v.is_null())
    })
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn price(entry: &Value, paths: &[&str]) -> Option<f64> {
    lookup(entry, paths)
        .and_then(as_f64)
        .filter(|p| p.is_finite() && *p >= 0.0)
}

fn count(entry: &Value, paths: &[&str]) -> u64 {
    lookup(entry, paths)
        .and_then(as_f64)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u64)
        .unwrap_or(0)
}

/// `O:AAPL250117C00150000` -> `AAPL`
fn underlying_from_occ(ticker: &str) -> Option<String> {
    let body = ticker.strip_prefix("O:").unwrap_or(ticker);
    let root_len = body.len().checked_sub(OCC_SUFFIX_LEN)?;
    let root = body.get(..root_len)?;
    if root.is_empty() || !root.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
        return None;
    }
    Some(root.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn normalizer() -> ChainNormalizer {
        ChainNormalizer::new(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap())
    }

    fn snapshot_entry() -> Value {
        json!({
            "break_even_price": 151.2,
            "day": { "close": 2.05, "volume": 1520 },
            "details": {
                "contract_type": "call",
                "exercise_style": "american",
                "expiration_date": "2025-01-17",
                "shares_per_contract": 100,
                "strike_price": 150,
                "ticker": "O:AAPL250117C00150000"
            },
            "implied_volatility": 0.2431,
            "last_quote": { "ask": 2.1, "bid": 1.98 },
            "last_trade": { "price": 2.04 },
            "open_interest": 8811,
            "underlying_asset": { "price": 149.1, "ticker": "AAPL" }
        })
    }

    #[test]
    fn test_snapshot_entry() {
        let chain = normalizer().normalize(&json!({ "results": [snapshot_entry()] }), None);

        assert_eq!(chain.skipped, 0);
        assert_eq!(chain.len(), 1);
        let c = &chain.contracts[0];
        assert_eq!(c.underlying_symbol, "AAPL");
        assert_eq!(c.contract_symbol, "O:AAPL250117C00150000");
        assert_eq!(c.option_type, OptionType::Call);
        assert_eq!(c.strike_price, 150.0);
        assert_eq!(c.expiration_date, NaiveDate::from_ymd_opt(2025, 1, 17).unwrap());
        assert_eq!(c.last_price, Some(2.04));
        assert_eq!(c.bid, Some(1.98));
        assert_eq!(c.ask, Some(2.1));
        assert_eq!(c.volume, 1520);
        assert_eq!(c.open_interest, 8811);
        assert_eq!(c.implied_volatility, Some(0.2431));
    }

    #[test]
    fn test_flat_record_with_string_numbers() {
        let raw = json!([{
            "strike_price": "95.5",
            "expiration_date": "2025-03-21T00:00:00Z",
            "option_type": "PUT",
            "bid": "1.10",
            "ask": 1.3,
            "volume": "42",
        }]);
        let chain = normalizer().normalize(&raw, Some("msft"));

        assert_eq!(chain.skipped, 0);
        let c = &chain.contracts[0];
        assert_eq!(c.underlying_symbol, "MSFT");
        assert_eq!(c.option_type, OptionType::Put);
        assert_eq!(c.strike_price, 95.5);
        assert_eq!(c.bid, Some(1.1));
        assert_eq!(c.volume, 42);
        assert_eq!(c.open_interest, 0);
        assert_eq!(c.last_price, None);
        // Synthesised when the payload has no ticker
        assert_eq!(c.contract_symbol, "O:MSFT250321P00095500");
    }

    #[test]
    fn test_bad_values_dropped_not_fatal() {
        let raw = json!([{
            "ticker": "O:XYZ250117P00020000",
            "strike_price": 20,
            "expiration_date": "2025-01-17",
            "contract_type": "put",
            "last_price": -1.0,
            "bid": "n/a",
            "volume": -5,
            "implied_volatility": 7.5
        }]);
        let chain = normalizer().normalize(&raw, None);

        assert_eq!(chain.skipped, 0);
        let c = &chain.contracts[0];
        assert_eq!(c.underlying_symbol, "XYZ");
        assert_eq!(c.last_price, None);
        assert_eq!(c.bid, None);
        assert_eq!(c.volume, 0);
        assert_eq!(c.implied_volatility, None);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let mut expired = snapshot_entry();
        expired["details"]["expiration_date"] = json!("2024-12-20");
        let mut no_strike = snapshot_entry();
        no_strike["details"]["strike_price"] = json!(null);
        let mut bad_type = snapshot_entry();
        bad_type["details"]["contract_type"] = json!("future");

        let raw = json!({
            "results": [snapshot_entry(), expired, no_strike, bad_type, "garbage", 17]
        });
        let chain = normalizer().normalize(&raw, None);

        assert_eq!(chain.len(), 1);
        assert_eq!(chain.skipped, 5);
    }

    #[test]
    fn test_missing_strike_skips_only_that_entry() {
        let mut no_strike = snapshot_entry();
        if let Some(details) = no_strike["details"].as_object_mut() {
            details.remove("strike_price");
        }

        let raw = json!({ "results": [snapshot_entry(), no_strike] });
        let chain = normalizer().normalize(&raw, None);

        assert_eq!(chain.len(), 1);
        assert_eq!(chain.skipped, 1);
        assert_eq!(chain.contracts[0].strike_price, 150.0);
    }

    #[test]
    fn test_entry_errors_are_malformed_record() {
        let result = normalizer().normalize_entry(&json!({ "strike_price": 10 }), Some("XYZ"));
        assert_matches!(result, Err(AnalyticsError::MalformedRecord(_)));
    }

    #[test]
    fn test_unrecognised_payloads_are_empty() {
        for raw in [
            json!(null),
            json!("text"),
            json!({ "status": "OK" }),
            json!({ "results": {} }),
        ] {
            let chain = normalizer().normalize(&raw, Some("AAPL"));
            assert!(chain.is_empty());
            assert_eq!(chain.skipped, 0);
        }
    }

    #[test]
    fn test_idempotent() {
        let raw = json!({ "results": [snapshot_entry(), { "strike": 3 }] });
        let first = normalizer().normalize(&raw, None);
        let second = normalizer().normalize(&raw, None);
        assert_eq!(first, second);

        // Canonical output normalises to itself
        let canonical = serde_json::to_value(&first.contracts).unwrap();
        let renormalised = normalizer().normalize(&canonical, None);
        assert_eq!(renormalised.contracts, first.contracts);
    }

    #[test]
    fn test_underlying_from_occ() {
        assert_eq!(underlying_from_occ("O:SPY250321P00512500").as_deref(), Some("SPY"));
        assert_eq!(underlying_from_occ("BRK.B250117C00400000").as_deref(), Some("BRK.B"));
        assert_eq!(underlying_from_occ("O:250117C00150000"), None);
        assert_eq!(underlying_from_occ("short"), None);
    }
}
