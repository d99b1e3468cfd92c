use serde::{Deserialize, Serialize};
use valuation_core::{AnnualRecord, Assumptions, Metric, PerMetric, Recommendation};

use crate::diagnostics::Diagnostic;

/// Summary of a filtered historical series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
    pub samples: usize,
}

/// Historical valuation ranges over a trailing window. `None` means no sample
/// survived the plausibility band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRanges {
    pub pe: Option<HistoricalRange>,
    pub pcf: Option<HistoricalRange>,
    pub pbv: Option<HistoricalRange>,
    #[serde(rename = "yield")]
    pub yield_: Option<HistoricalRange>,
    pub eps_growth: Option<HistoricalRange>,
    pub cf_growth: Option<HistoricalRange>,
    pub bv_growth: Option<HistoricalRange>,
    pub div_growth: Option<HistoricalRange>,
}

/// Point-in-time ratios at the current price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentRatios {
    pub pe: Option<f64>,
    pub pcf: Option<f64>,
    pub pbv: Option<f64>,
    /// Percent
    #[serde(rename = "yield")]
    pub yield_: Option<f64>,
}

/// Color band of a JPEGY score, lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JpegyZone {
    Excellent,
    Attractive,
    Fair,
    Stretched,
    Expensive,
}

impl JpegyZone {
    pub fn from_score(jpegy: f64) -> Self {
        match jpegy {
            j if j <= 0.5 => JpegyZone::Excellent,
            j if j <= 1.5 => JpegyZone::Attractive,
            j if j <= 1.75 => JpegyZone::Fair,
            j if j <= 2.0 => JpegyZone::Stretched,
            _ => JpegyZone::Expensive,
        }
    }
}

/// Price thresholds behind a BUY/HOLD/SELL call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBands {
    pub floor_price: f64,
    pub buy_limit: f64,
    pub sell_limit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationStatus {
    /// Every figure computed without diagnostics
    Complete,
    /// Figures available, some inputs fell back or were rejected
    Degraded,
    /// No usable price, history, or consensus target
    Invalid,
    /// Skeleton profile that has never been populated with fundamentals
    NeedsSync,
}

/// Full output of one valuation. Every number is finite; unavailable figures
/// are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResult {
    pub status: ValuationStatus,
    pub base_year_used: Option<i32>,
    pub base_values: PerMetric<Option<f64>>,
    pub projections: PerMetric<Option<f64>>,
    pub target_prices: PerMetric<Option<f64>>,
    pub consensus_target: Option<f64>,
    pub included_metrics: Vec<Metric>,
    pub cumulative_dividends: f64,
    /// Total 5-year return in percent; `-100` when the return cannot be sized
    pub total_return_percent: f64,
    pub return_sizable: bool,
    pub current_ratios: CurrentRatios,
    pub jpegy: Option<f64>,
    pub forward_jpegy: Option<f64>,
    pub jpegy_zone: Option<JpegyZone>,
    pub downside_risk: Option<f64>,
    pub upside_potential: Option<f64>,
    pub ratio_3_1: Option<f64>,
    pub price_bands: Option<PriceBands>,
    pub recommendation: Recommendation,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValuationResult {
    /// Human-readable reasons, one per diagnostic.
    pub fn reasons(&self) -> Vec<String> {
        self.diagnostics.iter().map(|d| d.to_string()).collect()
    }

    pub fn is_usable(&self) -> bool {
        matches!(
            self.status,
            ValuationStatus::Complete | ValuationStatus::Degraded
        )
    }
}

/// One company as handed to the engine by its callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub symbol: String,
    pub records: Vec<AnnualRecord>,
    pub assumptions: Assumptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

/// Data-quality checks over one profile's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityReport {
    /// 0-100, share of checks passed
    pub overall_score: u32,
    pub critical: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
    pub checks: Vec<QualityCheck>,
}
