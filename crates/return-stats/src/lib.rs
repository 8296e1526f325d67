//! Return / Risk Calculator
//!
//! Turns a daily closing-price series into period returns and annualized
//! return, volatility and a return-per-unit-risk ratio. Annualization uses
//! the conventional 252-trading-day year and a population standard deviation.

use maven_core::{PricePoint, PriceSeries};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use thiserror::Error;

/// Trading days in a year, used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Fewest prices needed to produce one defined percent change.
pub const MIN_PRICES: usize = 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Insufficient data: need at least {needed} prices, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// What the risk-adjusted ratio is when annualized volatility is exactly zero.
///
/// Neither value is mathematically meaningful; `Zero` keeps the table numeric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVolatilityPolicy {
    #[default]
    Zero,
    /// NaN, serialized as `null`
    Undefined,
}

impl ZeroVolatilityPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Some(Self::Zero),
            "nan" | "undefined" | "null" => Some(Self::Undefined),
            _ => None,
        }
    }

    fn fallback(&self) -> f64 {
        match self {
            Self::Zero => 0.0,
            Self::Undefined => f64::NAN,
        }
    }
}

/// Annualized statistics over a price series. Returns are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub annual_return: f64,
    pub annual_std_dev: f64,
    pub risk_adjusted_return: f64,
    /// Number of percent changes the statistics were computed over
    pub observations: usize,
}

/// The pricing table shown on the dashboard, with its statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSummary {
    pub points: Vec<PricePoint>,
    pub stats: ReturnStats,
}

/// Percent change of every close against the one before it.
///
/// The first close has no predecessor and is dropped, so the result is one
/// shorter than the input (empty for fewer than two prices).
pub fn pct_changes(series: &PriceSeries) -> Result<Vec<PricePoint>, StatsError> {
    series
        .points
        .windows(2)
        .map(|w| {
            let (prev, cur) = (w[0], w[1]);
            if prev.close <= 0.0 || !prev.close.is_finite() {
                return Err(StatsError::InvalidData(format!(
                    "close on {} is {}, cannot compute change",
                    prev.date, prev.close
                )));
            }
            Ok(PricePoint {
                date: cur.date,
                price: cur.close,
                pct_change: (cur.close - prev.close) / prev.close,
            })
        })
        .collect()
}

/// Compute annualized statistics with the default zero-volatility policy.
pub fn compute_stats(series: &PriceSeries) -> Result<ReturnStats, StatsError> {
    compute_stats_with_policy(series, ZeroVolatilityPolicy::default())
}

pub fn compute_stats_with_policy(
    series: &PriceSeries,
    policy: ZeroVolatilityPolicy,
) -> Result<ReturnStats, StatsError> {
    summarize(series, policy).map(|s| s.stats)
}

/// Build the pricing table and its statistics in one pass.
pub fn summarize(
    series: &PriceSeries,
    policy: ZeroVolatilityPolicy,
) -> Result<PricingSummary, StatsError> {
    if series.len() < MIN_PRICES {
        return Err(StatsError::InsufficientData {
            needed: MIN_PRICES,
            got: series.len(),
        });
    }

    let points = pct_changes(series)?;
    let changes: Vec<f64> = points.iter().map(|p| p.pct_change).collect();
    let stats = stats_from_changes(&changes, policy);

    Ok(PricingSummary { points, stats })
}

fn stats_from_changes(changes: &[f64], policy: ZeroVolatilityPolicy) -> ReturnStats {
    let annual_return = changes.iter().mean() * TRADING_DAYS_PER_YEAR * 100.0;
    // Population (divide by N), not sample
    let annual_std_dev = changes.iter().population_std_dev() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;

    let risk_adjusted_return = if annual_std_dev == 0.0 {
        policy.fallback()
    } else {
        annual_return / annual_std_dev
    };

    ReturnStats {
        annual_return,
        annual_std_dev,
        risk_adjusted_return,
        observations: changes.len(),
    }
}
