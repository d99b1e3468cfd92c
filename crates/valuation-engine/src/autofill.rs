use valuation_core::stats::historical_growth;
use valuation_core::{AnnualRecord, Assumptions, Bounds, GuardrailConfig, Metric};

use crate::models::HistoricalRange;
use crate::ratios::historical_ranges;

/// Years of history the suggested growth rates are measured over.
pub const GROWTH_WINDOW_YEARS: i32 = 5;

pub const FALLBACK_PE: f64 = 15.0;
pub const FALLBACK_PCF: f64 = 10.0;
pub const FALLBACK_PBV: f64 = 2.0;
pub const FALLBACK_YIELD: f64 = 2.0;

fn median_or(range: Option<HistoricalRange>, fallback: f64, bounds: &Bounds) -> f64 {
    let value = range.map(|r| r.median).unwrap_or(fallback);
    bounds.clamp(value)
}

/// Assumptions derived from history alone: clamped 5-year CAGRs, clamped
/// median historical multiples, and the latest year with positive EPS as base.
pub fn suggest_assumptions(
    records: &[AnnualRecord],
    current_price: f64,
    current_dividend: f64,
    config: &GuardrailConfig,
) -> Assumptions {
    let growth = |metric: Metric| {
        config
            .growth
            .clamp(historical_growth(records, metric.record_field(), GROWTH_WINDOW_YEARS))
    };
    let ranges = historical_ranges(records, 0, config);

    let base_year = records
        .iter()
        .filter(|r| r.earnings_per_share > 0.0)
        .map(|r| r.year)
        .max()
        .or_else(|| records.iter().map(|r| r.year).max())
        .unwrap_or(0);

    Assumptions {
        current_price,
        current_dividend,
        base_year,
        growth_rate_eps: growth(Metric::Eps),
        growth_rate_cf: growth(Metric::CashFlow),
        growth_rate_bv: growth(Metric::BookValue),
        growth_rate_div: growth(Metric::Dividend),
        target_pe: median_or(ranges.pe, FALLBACK_PE, &config.ratios.pe),
        target_pcf: median_or(ranges.pcf, FALLBACK_PCF, &config.ratios.pcf),
        target_pbv: median_or(ranges.pbv, FALLBACK_PBV, &config.ratios.pbv),
        target_yield: median_or(ranges.yield_, FALLBACK_YIELD, &config.ratios.yield_),
        ..Assumptions::default()
    }
}
