use valuation_core::stats::{mean, median};
use valuation_core::{AnnualRecord, GuardrailConfig, Metric};

use crate::models::{CurrentRatios, HistoricalRange, HistoricalRanges};

/// `num / den` when `den` is non-zero and finite, otherwise 0.
pub fn safe_divide(num: f64, den: f64) -> f64 {
    if den != 0.0 && den.is_finite() {
        let v = num / den;
        if v.is_finite() {
            return v;
        }
    }
    0.0
}

/// Price over a per-share figure. Non-positive denominators yield 0.
fn price_multiple(price: f64, per_share: f64) -> f64 {
    if per_share > 0.0 {
        safe_divide(price, per_share)
    } else {
        0.0
    }
}

/// High/low valuation ratios of one fiscal year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowRatios {
    pub pe_high: f64,
    pub pe_low: f64,
    pub pcf_high: f64,
    pub pcf_low: f64,
    pub pbv_high: f64,
    pub pbv_low: f64,
    /// Dividend over the low price (percent)
    pub yield_high: f64,
    /// Dividend over the high price (percent)
    pub yield_low: f64,
}

impl RowRatios {
    pub fn average(&self, kind: RatioKind) -> f64 {
        match kind {
            RatioKind::Pe => (self.pe_high + self.pe_low) / 2.0,
            RatioKind::Pcf => (self.pcf_high + self.pcf_low) / 2.0,
            RatioKind::Pbv => (self.pbv_high + self.pbv_low) / 2.0,
            RatioKind::Yield => (self.yield_high + self.yield_low) / 2.0,
        }
    }
}

pub fn row_ratios(record: &AnnualRecord) -> RowRatios {
    RowRatios {
        pe_high: price_multiple(record.price_high, record.earnings_per_share),
        pe_low: price_multiple(record.price_low, record.earnings_per_share),
        pcf_high: price_multiple(record.price_high, record.cash_flow_per_share),
        pcf_low: price_multiple(record.price_low, record.cash_flow_per_share),
        pbv_high: price_multiple(record.price_high, record.book_value_per_share),
        pbv_low: price_multiple(record.price_low, record.book_value_per_share),
        yield_high: price_multiple(record.dividend_per_share, record.price_low) * 100.0,
        yield_low: price_multiple(record.dividend_per_share, record.price_high) * 100.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioKind {
    Pe,
    Pcf,
    Pbv,
    Yield,
}

impl RatioKind {
    /// Historical averages outside this band are treated as bad data.
    pub fn plausible_band(&self) -> (f64, f64) {
        match self {
            RatioKind::Pe | RatioKind::Pcf => (1.0, 200.0),
            RatioKind::Pbv => (0.1, 50.0),
            RatioKind::Yield => (0.0, 50.0),
        }
    }
}

/// min/max/avg/median of the values that fall within `[lo, hi]`.
pub fn summarize(values: &[f64], lo: f64, hi: f64) -> Option<HistoricalRange> {
    let kept: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v >= lo && *v <= hi)
        .collect();
    if kept.is_empty() {
        return None;
    }
    Some(HistoricalRange {
        min: kept.iter().copied().fold(f64::INFINITY, f64::min),
        max: kept.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        avg: mean(&kept),
        median: median(&kept),
        samples: kept.len(),
    })
}

/// Records with usable prices, ascending by year, limited to the last `window`
/// years (`0` keeps everything).
fn trailing_window(records: &[AnnualRecord], window: usize) -> Vec<&AnnualRecord> {
    let mut rows: Vec<&AnnualRecord> = records.iter().filter(|r| r.has_valid_prices()).collect();
    rows.sort_by_key(|r| r.year);
    if window > 0 && rows.len() > window {
        rows.drain(..rows.len() - window);
    }
    rows
}

fn yoy_growth(rows: &[&AnnualRecord], metric: Metric) -> Vec<f64> {
    let field = metric.record_field();
    rows.windows(2)
        .filter_map(|pair| {
            let prev = pair[0].value(field);
            let curr = pair[1].value(field);
            if prev > 0.0 && curr > 0.0 {
                Some((curr - prev) / prev * 100.0)
            } else {
                None
            }
        })
        .collect()
}

/// Historical valuation ranges over the trailing `window` years.
pub fn historical_ranges(
    records: &[AnnualRecord],
    window: usize,
    config: &GuardrailConfig,
) -> HistoricalRanges {
    let rows = trailing_window(records, window);

    let averages = |kind: RatioKind, positive: fn(&AnnualRecord) -> f64| -> Option<HistoricalRange> {
        let values: Vec<f64> = rows
            .iter()
            .filter(|r| positive(r) > 0.0)
            .map(|r| row_ratios(r).average(kind))
            .collect();
        let (lo, hi) = kind.plausible_band();
        summarize(&values, lo, hi)
    };

    let growth = |metric: Metric| {
        summarize(&yoy_growth(&rows, metric), config.outliers.min, config.outliers.max)
    };

    HistoricalRanges {
        pe: averages(RatioKind::Pe, |r| r.earnings_per_share),
        pcf: averages(RatioKind::Pcf, |r| r.cash_flow_per_share),
        pbv: averages(RatioKind::Pbv, |r| r.book_value_per_share),
        yield_: averages(RatioKind::Yield, |r| r.dividend_per_share),
        eps_growth: growth(Metric::Eps),
        cf_growth: growth(Metric::CashFlow),
        bv_growth: growth(Metric::BookValue),
        div_growth: growth(Metric::Dividend),
    }
}

fn finite_positive(v: f64) -> Option<f64> {
    if v.is_finite() && v > 0.0 {
        Some(v)
    } else {
        None
    }
}

/// Ratios at the current price against the base-year record.
pub fn current_ratios(
    current_price: f64,
    current_dividend: f64,
    base: Option<&AnnualRecord>,
) -> CurrentRatios {
    if !(current_price.is_finite() && current_price > 0.0) {
        return CurrentRatios::default();
    }

    let multiple = |per_share: f64| finite_positive(per_share).and_then(|d| finite_positive(current_price / d));

    let yield_ = if current_dividend.is_finite() && current_dividend >= 0.0 {
        Some(current_dividend / current_price * 100.0)
    } else {
        None
    };

    CurrentRatios {
        pe: base.and_then(|b| multiple(b.earnings_per_share)),
        pcf: base.and_then(|b| multiple(b.cash_flow_per_share)),
        pbv: base.and_then(|b| multiple(b.book_value_per_share)),
        yield_,
    }
}
