use serde::Serialize;
use std::fmt;
use valuation_core::{AnnualRecord, Metric};

use crate::composite::JpegyRejection;
use crate::projection::{ReturnRejection, TargetRejection};

/// Prices a freshly created, never-synchronised profile carries.
pub const PLACEHOLDER_PRICES: [f64; 2] = [100.0, 0.0];

/// Why part of a valuation is degraded or unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Diagnostic {
    NeedsSync,
    NoRecords,
    InvalidPrice { price: f64 },
    BaseYearFallback { requested: i32, used: i32 },
    BaseEpsNotPositive { year: i32, eps: f64 },
    GrowthClamped { metric: Metric, requested: f64, used: f64 },
    MultipleClamped { metric: Metric, requested: f64, used: f64 },
    DividendGrowthUnavailable { dividend: f64 },
    NoHistoricalPrices,
    TargetRejected { metric: Metric, rejection: TargetRejection },
    NoValidTargets { excluded: Vec<Metric>, rejected: Vec<Metric> },
    JpegyUnavailable { rejection: JpegyRejection },
    ReturnUnsizable { rejection: ReturnRejection },
}

fn join(metrics: &[Metric]) -> String {
    if metrics.is_empty() {
        return "none".to_string();
    }
    metrics.iter().map(|m| m.label()).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NeedsSync => write!(
                f,
                "profile needs sync: no fundamentals loaded yet"
            ),
            Diagnostic::NoRecords => write!(f, "no annual records"),
            Diagnostic::InvalidPrice { price } => write!(f, "invalid current price {price}"),
            Diagnostic::BaseYearFallback { requested, used } => {
                write!(f, "base year {requested} unusable, using {used}")
            }
            Diagnostic::BaseEpsNotPositive { year, eps } => {
                write!(f, "base EPS {eps} for {year} is not positive")
            }
            Diagnostic::GrowthClamped { metric, requested, used } => {
                write!(f, "{metric} growth rate {requested}% seems extreme, using {used}%")
            }
            Diagnostic::MultipleClamped { metric, requested, used } => {
                write!(f, "{metric} target multiple {requested} seems extreme, using {used}")
            }
            Diagnostic::DividendGrowthUnavailable { dividend } => write!(
                f,
                "dividend {dividend} has no growth rate, dividends left out of total return"
            ),
            Diagnostic::NoHistoricalPrices => {
                write!(f, "no valid historical prices, low estimated from current price")
            }
            Diagnostic::TargetRejected { metric, rejection } => {
                write!(f, "{metric} target rejected: {rejection}")
            }
            Diagnostic::NoValidTargets { excluded, rejected } => write!(
                f,
                "no valid ratio cible (excluded: {}; rejected: {})",
                join(excluded),
                join(rejected)
            ),
            Diagnostic::JpegyUnavailable { rejection } => {
                write!(f, "JPEGY unavailable: {rejection}")
            }
            Diagnostic::ReturnUnsizable { rejection } => {
                write!(f, "total return forced to -100%: {rejection}")
            }
        }
    }
}

/// A skeleton profile: a single record with zero EPS, cash flow and book
/// value, priced at a placeholder.
pub fn is_needs_sync(records: &[AnnualRecord], current_price: f64) -> bool {
    let [only] = records else {
        return false;
    };
    let empty = only.earnings_per_share == 0.0
        && only.cash_flow_per_share == 0.0
        && only.book_value_per_share == 0.0;
    let placeholder = PLACEHOLDER_PRICES.contains(&current_price);
    if empty && placeholder {
        tracing::warn!(year = only.year, current_price, "profile needs sync");
        true
    } else {
        false
    }
}
