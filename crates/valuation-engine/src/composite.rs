//! JPEGY score and the 3:1 upside/downside ratio.
//!
//! JPEGY = P/E / (growth % + yield %). Lower is better.

use serde::Serialize;
use std::fmt;
use valuation_core::stats::mean;
use valuation_core::AnnualRecord;

use crate::projection::ReturnEstimate;

/// EPS at or below this is too small to produce a meaningful P/E.
pub const MIN_JPEGY_EPS: f64 = 0.01;
/// Growth plus yield (percent) must exceed this floor.
pub const MIN_GROWTH_PLUS_YIELD: f64 = 0.01;
pub const MAX_JPEGY_PE: f64 = 100.0;
pub const MAX_YIELD: f64 = 50.0;
/// Average low assumed at this share of the current price when history has no prices.
pub const FALLBACK_LOW_RATIO: f64 = 0.7;
pub const MIN_DOWNSIDE_RISK: f64 = 0.1;
pub const UPSIDE_MIN: f64 = -100.0;
pub const UPSIDE_MAX: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum JpegyRejection {
    InvalidPrice,
    EpsTooSmall { eps: f64 },
    RatioOutOfRange { pe: f64 },
    GrowthYieldFloor { growth: f64, yield_pct: f64 },
}

impl fmt::Display for JpegyRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JpegyRejection::InvalidPrice => write!(f, "current price is not positive"),
            JpegyRejection::EpsTooSmall { eps } => {
                write!(f, "base EPS {eps:.4} is not above {MIN_JPEGY_EPS}")
            }
            JpegyRejection::RatioOutOfRange { pe } => {
                write!(f, "P/E {pe:.1} outside [0, {MAX_JPEGY_PE}]")
            }
            JpegyRejection::GrowthYieldFloor { growth, yield_pct } => write!(
                f,
                "growth {growth:.2}% + yield {yield_pct:.2}% does not exceed {MIN_GROWTH_PLUS_YIELD}%"
            ),
        }
    }
}

/// JPEGY from the current price, an EPS figure, EPS growth and current yield
/// (both percent). The yield is clamped to `[0, 50]`.
pub fn jpegy(
    current_price: f64,
    eps: f64,
    growth_rate: f64,
    current_yield: f64,
) -> Result<f64, JpegyRejection> {
    if !current_price.is_finite() || current_price <= 0.0 {
        return Err(JpegyRejection::InvalidPrice);
    }
    if !(eps > MIN_JPEGY_EPS) || !eps.is_finite() {
        return Err(JpegyRejection::EpsTooSmall { eps });
    }

    let pe = current_price / eps;
    if !(0.0..=MAX_JPEGY_PE).contains(&pe) {
        return Err(JpegyRejection::RatioOutOfRange { pe });
    }

    let yield_pct = if current_yield.is_finite() {
        current_yield.clamp(0.0, MAX_YIELD)
    } else {
        0.0
    };
    let denominator = growth_rate + yield_pct;
    if !(denominator > MIN_GROWTH_PLUS_YIELD) {
        return Err(JpegyRejection::GrowthYieldFloor {
            growth: growth_rate,
            yield_pct,
        });
    }
    Ok(pe / denominator)
}

/// JPEGY on next year's EPS.
pub fn forward_jpegy(
    current_price: f64,
    eps: f64,
    growth_rate: f64,
    current_yield: f64,
) -> Result<f64, JpegyRejection> {
    let forward_eps = eps * (1.0 + growth_rate / 100.0);
    jpegy(current_price, forward_eps, growth_rate, current_yield)
}

/// Mean low price over years with valid high and low prices.
pub fn average_historical_low(records: &[AnnualRecord]) -> Option<f64> {
    let lows: Vec<f64> = records
        .iter()
        .filter(|r| r.has_valid_prices())
        .map(|r| r.price_low)
        .collect();
    if lows.is_empty() {
        None
    } else {
        Some(mean(&lows))
    }
}

/// Average historical low, or 70% of the current price without history.
pub fn effective_low(current_price: f64, average_low: Option<f64>) -> f64 {
    average_low.unwrap_or(current_price * FALLBACK_LOW_RATIO)
}

/// Percentage drop from the current price to the floor (`low × floor_factor`),
/// bounded to `[0, 100]`.
pub fn downside_risk(current_price: f64, average_low: Option<f64>, floor_factor: f64) -> Option<f64> {
    if !current_price.is_finite() || current_price <= 0.0 {
        return None;
    }
    let floor = effective_low(current_price, average_low) * floor_factor;
    let risk = (current_price - floor) / current_price * 100.0;
    if risk.is_finite() {
        Some(risk.clamp(0.0, 100.0))
    } else {
        None
    }
}

/// Total return bounded to `[-100, 1000]`; unavailable when the return is unsizable.
pub fn upside_potential(estimate: &ReturnEstimate) -> Option<f64> {
    estimate.sized().map(|pct| pct.clamp(UPSIDE_MIN, UPSIDE_MAX))
}

/// Upside over downside. Unavailable when either side is, or when the downside
/// is too small to divide by.
pub fn ratio_3_1(upside: Option<f64>, downside: Option<f64>) -> Option<f64> {
    let (up, down) = (upside?, downside?);
    if down > MIN_DOWNSIDE_RISK {
        Some(up / down).filter(|r| r.is_finite())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ReturnRejection;
    use approx::assert_relative_eq;

    #[test]
    fn test_jpegy_basic() {
        // P/E 20, growth 8 + yield 2 -> 2.0
        let j = jpegy(40.0, 2.0, 8.0, 2.0).unwrap();
        assert_relative_eq!(j, 2.0);
    }

    #[test]
    fn test_jpegy_yield_clamped() {
        let j = jpegy(40.0, 2.0, 0.0, 80.0).unwrap();
        assert_relative_eq!(j, 20.0 / 50.0);
    }

    #[test]
    fn test_jpegy_floor_regardless_of_ratio() {
        for price in [1.0, 50.0, 199.0] {
            let err = jpegy(price, 2.0, -3.0, 3.0).unwrap_err();
            assert!(matches!(err, JpegyRejection::GrowthYieldFloor { .. }));
        }
        let err = jpegy(10.0, 2.0, 0.005, 0.0).unwrap_err();
        assert!(err.to_string().contains("0.01"));
    }

    #[test]
    fn test_jpegy_rejections() {
        assert_eq!(jpegy(0.0, 2.0, 5.0, 1.0), Err(JpegyRejection::InvalidPrice));
        assert!(matches!(
            jpegy(10.0, 0.01, 5.0, 1.0),
            Err(JpegyRejection::EpsTooSmall { .. })
        ));
        assert!(matches!(
            jpegy(500.0, 1.0, 5.0, 1.0),
            Err(JpegyRejection::RatioOutOfRange { .. })
        ));
    }

    #[test]
    fn test_forward_jpegy_lower_with_growth() {
        let current = jpegy(40.0, 2.0, 10.0, 0.0).unwrap();
        let forward = forward_jpegy(40.0, 2.0, 10.0, 0.0).unwrap();
        assert!(forward < current);
    }

    #[test]
    fn test_downside_risk() {
        // floor = 10 * 0.9 = 9 -> (50 - 9) / 50 = 82%
        assert_relative_eq!(downside_risk(50.0, Some(10.0), 0.9).unwrap(), 82.0, epsilon = 1e-9);
        // price below floor -> 0
        assert_eq!(downside_risk(5.0, Some(10.0), 0.9), Some(0.0));
        // no history -> 70% fallback: floor 0.63 * price -> 37%
        assert_relative_eq!(downside_risk(100.0, None, 0.9).unwrap(), 37.0, epsilon = 1e-9);
        assert_eq!(downside_risk(0.0, Some(10.0), 0.9), None);
    }

    #[test]
    fn test_upside_clamped() {
        assert_eq!(upside_potential(&ReturnEstimate::Sized(2500.0)), Some(UPSIDE_MAX));
        assert_eq!(
            upside_potential(&ReturnEstimate::Unsizable(ReturnRejection::NoConsensusTarget)),
            None
        );
    }

    #[test]
    fn test_ratio_3_1() {
        assert_relative_eq!(ratio_3_1(Some(90.0), Some(30.0)).unwrap(), 3.0);
        assert_eq!(ratio_3_1(Some(90.0), Some(0.05)), None);
        assert_eq!(ratio_3_1(None, Some(30.0)), None);
    }

    #[test]
    fn test_average_historical_low_skips_invalid_rows() {
        let rows = vec![
            AnnualRecord {
                year: 2022,
                price_high: 20.0,
                price_low: 10.0,
                earnings_per_share: 1.0,
                cash_flow_per_share: 0.0,
                book_value_per_share: 0.0,
                dividend_per_share: 0.0,
                is_estimate: false,
            },
            AnnualRecord {
                year: 2023,
                price_high: 0.0,
                price_low: 0.0,
                earnings_per_share: 1.0,
                cash_flow_per_share: 0.0,
                book_value_per_share: 0.0,
                dividend_per_share: 0.0,
                is_estimate: true,
            },
        ];
        assert_eq!(average_historical_low(&rows), Some(10.0));
        assert_eq!(average_historical_low(&[]), None);
    }
}
