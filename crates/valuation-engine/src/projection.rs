use serde::Serialize;
use std::fmt;
use valuation_core::{Bounds, GuardrailConfig, Metric, PerMetric};

/// Total return reported when a return cannot be sized. Means "unknown", not a total loss.
pub const RETURN_SENTINEL: f64 = -100.0;

/// Projects `base` forward `years` years at `rate` percent per year, with the rate
/// clamped to `growth`.
///
/// Unavailable when the base is not a positive finite number, the rate is not
/// finite, or the projection overflows.
pub fn project_value(base: f64, rate: f64, years: u32, growth: &Bounds) -> Option<f64> {
    if !base.is_finite() || base <= 0.0 || !rate.is_finite() {
        return None;
    }
    let rate = growth.clamp(rate);
    let projected = base * (1.0 + rate / 100.0).powi(years as i32);
    if projected.is_finite() && projected > 0.0 {
        Some(projected)
    } else {
        None
    }
}

/// Target price implied by a projected metric and a target multiple.
///
/// The multiple is clamped to `bounds` and must then lie in `(0, cap]`. For the
/// dividend metric the multiple is a yield in percent and the price is
/// `dividend / yield`; every other metric multiplies.
pub fn target_price(
    metric: Metric,
    projected: Option<f64>,
    target_multiple: f64,
    bounds: &Bounds,
    cap: f64,
) -> Option<f64> {
    let projected = projected.filter(|p| p.is_finite() && *p > 0.0)?;
    // A missing or non-positive multiple means no target for this metric.
    if !target_multiple.is_finite() || target_multiple <= 0.0 {
        return None;
    }
    let multiple = bounds.clamp(target_multiple);
    if multiple <= 0.0 || multiple > cap {
        return None;
    }
    let target = match metric {
        Metric::Dividend => projected / (multiple / 100.0),
        _ => projected * multiple,
    };
    if target.is_finite() && target > 0.0 {
        Some(target)
    } else {
        None
    }
}

/// Why a metric's target did not make it into the consensus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TargetRejection {
    Excluded,
    Unavailable,
    OutOfBand { target: f64, low: f64, high: f64 },
}

impl fmt::Display for TargetRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRejection::Excluded => write!(f, "excluded by user"),
            TargetRejection::Unavailable => write!(f, "no target could be computed"),
            TargetRejection::OutOfBand { target, low, high } => write!(
                f,
                "target {target:.2} outside reasonable range [{low:.2}, {high:.2}]"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusTarget {
    pub value: Option<f64>,
    pub included: Vec<Metric>,
    pub rejected: Vec<(Metric, TargetRejection)>,
}

impl ConsensusTarget {
    pub fn excluded(&self) -> Vec<Metric> {
        self.rejected
            .iter()
            .filter(|(_, r)| matches!(r, TargetRejection::Excluded))
            .map(|(m, _)| *m)
            .collect()
    }
}

/// Averages the per-metric targets that are not excluded, positive, finite, and
/// within `[price × minReasonable, price × maxReasonable]`.
pub fn consensus_target(
    targets: &PerMetric<Option<f64>>,
    exclusions: &PerMetric<bool>,
    current_price: f64,
    config: &GuardrailConfig,
) -> ConsensusTarget {
    let low = current_price * config.projections.min_reasonable_target_multiplier;
    let high = current_price * config.projections.max_reasonable_target_multiplier;

    let mut included = Vec::new();
    let mut rejected = Vec::new();
    let mut sum = 0.0;

    for (metric, target) in targets.iter() {
        if *exclusions.get(metric) {
            rejected.push((metric, TargetRejection::Excluded));
            continue;
        }
        let Some(target) = target.filter(|t| t.is_finite() && *t > 0.0) else {
            rejected.push((metric, TargetRejection::Unavailable));
            continue;
        };
        if !(target >= low && target <= high) {
            tracing::debug!(%metric, target, low, high, "target outside reasonable band");
            rejected.push((metric, TargetRejection::OutOfBand { target, low, high }));
            continue;
        }
        sum += target;
        included.push(metric);
    }

    let value = if included.is_empty() {
        None
    } else {
        Some(sum / included.len() as f64).filter(|v| v.is_finite())
    };

    ConsensusTarget {
        value,
        included,
        rejected,
    }
}

/// Dividends collected over `years` years, compounding from `base_dividend`.
///
/// Accumulation stops the first year the running total would pass
/// `price × maxDividendMultiplier`, and the total is clamped to that cap.
pub fn cumulative_dividends(
    base_dividend: f64,
    growth_rate: f64,
    years: u32,
    current_price: f64,
    config: &GuardrailConfig,
) -> f64 {
    let cap = current_price * config.projections.max_dividend_multiplier;
    if !cap.is_finite() || cap <= 0.0 {
        return 0.0;
    }
    if !base_dividend.is_finite() || base_dividend <= 0.0 || !growth_rate.is_finite() {
        return 0.0;
    }

    let rate = config.growth.clamp(growth_rate);
    let mut total = 0.0;
    let mut dividend = base_dividend;
    for year in 1..=years {
        dividend *= 1.0 + rate / 100.0;
        if !(total + dividend <= cap) {
            tracing::debug!(year, cap, "cumulative dividends hit cap");
            total = cap;
            break;
        }
        total += dividend;
    }
    total.min(cap)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ReturnRejection {
    InvalidPrice,
    NoConsensusTarget,
    NonFiniteInputs,
    TargetOutOfBand { target: f64, low: f64, high: f64 },
    OutOfRange { raw: f64, min: f64, max: f64 },
}

impl fmt::Display for ReturnRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnRejection::InvalidPrice => write!(f, "current price is not positive"),
            ReturnRejection::NoConsensusTarget => write!(f, "no consensus target price"),
            ReturnRejection::NonFiniteInputs => write!(f, "target or dividends are not finite"),
            ReturnRejection::TargetOutOfBand { target, low, high } => write!(
                f,
                "target {target:.2} outside [{low:.2}, {high:.2}]"
            ),
            ReturnRejection::OutOfRange { raw, min, max } => write!(
                f,
                "raw return {raw:.1}% outside [{min:.1}%, {max:.1}%]"
            ),
        }
    }
}

/// Projected total return, or the reason it cannot be sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnEstimate {
    Sized(f64),
    Unsizable(ReturnRejection),
}

impl ReturnEstimate {
    /// Percent return, with [`RETURN_SENTINEL`] standing in for an unsizable one.
    pub fn percent(&self) -> f64 {
        match self {
            ReturnEstimate::Sized(pct) => *pct,
            ReturnEstimate::Unsizable(_) => RETURN_SENTINEL,
        }
    }

    pub fn sized(&self) -> Option<f64> {
        match self {
            ReturnEstimate::Sized(pct) => Some(*pct),
            ReturnEstimate::Unsizable(_) => None,
        }
    }
}

/// Price appreciation plus dividends relative to the current price, in percent.
pub fn total_return(
    consensus: Option<f64>,
    dividends: f64,
    current_price: f64,
    config: &GuardrailConfig,
) -> ReturnEstimate {
    if !current_price.is_finite() || current_price <= 0.0 {
        return ReturnEstimate::Unsizable(ReturnRejection::InvalidPrice);
    }
    let Some(target) = consensus else {
        return ReturnEstimate::Unsizable(ReturnRejection::NoConsensusTarget);
    };
    if !target.is_finite() || !dividends.is_finite() {
        return ReturnEstimate::Unsizable(ReturnRejection::NonFiniteInputs);
    }

    let low = current_price * config.projections.min_reasonable_target_multiplier;
    let high = current_price * config.returns.max_target_multiplier;
    if target < low || target > high {
        return ReturnEstimate::Unsizable(ReturnRejection::TargetOutOfBand { target, low, high });
    }

    let raw = (target + dividends - current_price) / current_price * 100.0;
    if !raw.is_finite() || raw < config.returns.min || raw > config.returns.max {
        return ReturnEstimate::Unsizable(ReturnRejection::OutOfRange {
            raw,
            min: config.returns.min,
            max: config.returns.max,
        });
    }
    ReturnEstimate::Sized(raw)
}
