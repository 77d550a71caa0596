//! Black-Scholes-Merton pricing model
//!
//! Closed-form European pricing with analytic Greeks. Inputs are validated
//! up front; at zero time to expiry the model returns intrinsic value with
//! the boundary Greeks instead of evaluating the singular formula.

use chrono::NaiveDate;
use std::f64::consts::PI;

use crate::error::AnalyticsError;
use crate::types::{BSInputs, GreeksResult, OptionType};
use crate::Result;

/// Calendar days per year used for theta and time-to-expiry
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Vega and rho are quoted per percentage point
const PERCENT_POINT: f64 = 100.0;

pub fn norm_pdf(x: f64) -> f64 {
    (1.0 / (2.0 * PI).sqrt()) * (-0.5 * x * x).exp()
}

pub fn norm_cdf(x: f64) -> f64 {
    let k = 1.0 / (1.0 + 0.2316419 * x.abs());
    let poly = k * (0.319381530
        + k * (-0.356563782 + k * (1.781477937 + k * (-1.821255978 + k * 1.330274429))));

    let approx = 1.0 - norm_pdf(x) * poly;

    if x >= 0.0 {
        approx
    } else {
        1.0 - approx
    }
}

/// d1 and d2 terms; callers guarantee `time > 0`
pub fn d1_d2(input: &BSInputs) -> (f64, f64) {
    let s = input.spot;
    let k = input.strike;
    let t = input.time;
    let v = input.vol;
    let r = input.rate;

    let vol_sqrt_t = v * t.sqrt();
    let d1 = ((s / k).ln() + (r + 0.5 * v * v) * t) / vol_sqrt_t;
    let d2 = d1 - vol_sqrt_t;

    (d1, d2)
}

pub fn intrinsic_value(spot: f64, strike: f64, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    }
}

/// Model price only
pub fn black_scholes_price(input: &BSInputs) -> Result<f64> {
    input.validate()?;

    if input.time == 0.0 {
        return Ok(intrinsic_value(input.spot, input.strike, input.option_type));
    }

    Ok(closed_form_price(input, d1_d2(input)))
}

/// Model price and all first-order Greeks plus gamma
pub fn price_and_greeks(input: &BSInputs) -> Result<GreeksResult> {
    input.validate()?;

    if input.time == 0.0 {
        return Ok(expiry_boundary(input));
    }

    let (d1, d2) = d1_d2(input);
    let s = input.spot;
    let k = input.strike;
    let t = input.time;
    let v = input.vol;
    let r = input.rate;

    let pdf = norm_pdf(d1);
    let sqrt_t = t.sqrt();
    let discount = (-r * t).exp();

    let delta = match input.option_type {
        OptionType::Call => norm_cdf(d1),
        OptionType::Put => norm_cdf(d1) - 1.0,
    };

    let gamma = pdf / (s * v * sqrt_t);

    let vega = s * pdf * sqrt_t;

    let theta = match input.option_type {
        OptionType::Call => -(s * pdf * v) / (2.0 * sqrt_t) - r * k * discount * norm_cdf(d2),
        OptionType::Put => -(s * pdf * v) / (2.0 * sqrt_t) + r * k * discount * norm_cdf(-d2),
    };

    let rho = match input.option_type {
        OptionType::Call => k * t * discount * norm_cdf(d2),
        OptionType::Put => -k * t * discount * norm_cdf(-d2),
    };

    Ok(GreeksResult {
        delta,
        gamma,
        theta: theta / DAYS_PER_YEAR,
        vega: vega / PERCENT_POINT,
        rho: rho / PERCENT_POINT,
        theoretical_price: closed_form_price(input, (d1, d2)),
    })
}

/// Year fraction between valuation and expiration (calendar days / 365)
pub fn time_to_expiry_years(expiration: NaiveDate, valuation: NaiveDate) -> Result<f64> {
    let days = (expiration - valuation).num_days();
    if days < 0 {
        return Err(AnalyticsError::invalid_parameter(format!(
            "option expired on {} (valuation date {})",
            expiration, valuation
        )));
    }
    Ok(days as f64 / DAYS_PER_YEAR)
}

fn closed_form_price(input: &BSInputs, (d1, d2): (f64, f64)) -> f64 {
    let s = input.spot;
    let k = input.strike;
    let discount = (-input.rate * input.time).exp();

    let price = match input.option_type {
        OptionType::Call => s * norm_cdf(d1) - k * discount * norm_cdf(d2),
        OptionType::Put => k * discount * norm_cdf(-d2) - s * norm_cdf(-d1),
    };

    price.max(0.0)
}

fn expiry_boundary(input: &BSInputs) -> GreeksResult {
    let delta = match input.option_type {
        OptionType::Call if input.spot > input.strike => 1.0,
        OptionType::Put if input.spot < input.strike => -1.0,
        _ => 0.0,
    };

    GreeksResult {
        delta,
        theoretical_price: intrinsic_value(input.spot, input.strike, input.option_type),
        ..GreeksResult::default()
    }
}
