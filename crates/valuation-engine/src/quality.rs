use valuation_core::stats::z_score_of;
use valuation_core::AnnualRecord;

use crate::diagnostics::PLACEHOLDER_PRICES;
use crate::models::{CheckStatus, DataQualityReport, QualityCheck};

const MIN_YEARS_PASS: usize = 5;
const MIN_YEARS_WARN: usize = 3;
const OUTLIER_Z: f64 = 3.0;
const MAX_YOY_GROWTH: f64 = 100.0;
const MAX_YEAR_GAP: i32 = 2;
const SPLIT_RATIO_LOW: f64 = 0.6;
const SPLIT_RATIO_HIGH: f64 = 1.8;

fn check(name: &str, status: CheckStatus, message: impl Into<String>) -> QualityCheck {
    QualityCheck {
        name: name.to_string(),
        status,
        message: message.into(),
    }
}

fn list_years(years: &[i32]) -> String {
    years.iter().map(|y| y.to_string()).collect::<Vec<_>>().join(", ")
}

fn data_quantity(records: &[AnnualRecord]) -> QualityCheck {
    let n = records.len();
    let status = if n >= MIN_YEARS_PASS {
        CheckStatus::Pass
    } else if n >= MIN_YEARS_WARN {
        CheckStatus::Warning
    } else {
        CheckStatus::Fail
    };
    check("data_quantity", status, format!("{n} years of history"))
}

fn price_validity(records: &[AnnualRecord]) -> QualityCheck {
    let bad: Vec<i32> = records
        .iter()
        .filter(|r| !r.has_valid_prices() || r.price_high < r.price_low)
        .map(|r| r.year)
        .collect();
    if records.is_empty() || bad.len() == records.len() {
        check("price_validity", CheckStatus::Fail, "no year has a valid price range")
    } else if bad.is_empty() {
        check("price_validity", CheckStatus::Pass, "all price ranges valid")
    } else {
        check(
            "price_validity",
            CheckStatus::Warning,
            format!("invalid price range in {}", list_years(&bad)),
        )
    }
}

fn eps_outliers(records: &[AnnualRecord]) -> QualityCheck {
    let values: Vec<f64> = records
        .iter()
        .map(|r| r.earnings_per_share)
        .filter(|v| v.is_finite())
        .collect();
    let outliers: Vec<i32> = records
        .iter()
        .filter(|r| r.earnings_per_share.is_finite())
        .filter(|r| z_score_of(r.earnings_per_share, &values).abs() > OUTLIER_Z)
        .map(|r| r.year)
        .collect();
    if outliers.is_empty() {
        check("eps_outliers", CheckStatus::Pass, "no statistical EPS outliers")
    } else {
        check(
            "eps_outliers",
            CheckStatus::Warning,
            format!("EPS outliers (|z| > {OUTLIER_Z}) in {}", list_years(&outliers)),
        )
    }
}

fn sorted(records: &[AnnualRecord]) -> Vec<&AnnualRecord> {
    let mut rows: Vec<&AnnualRecord> = records.iter().collect();
    rows.sort_by_key(|r| r.year);
    rows
}

fn growth_anomalies(rows: &[&AnnualRecord]) -> QualityCheck {
    let suspicious: Vec<i32> = rows
        .windows(2)
        .filter(|pair| {
            let (prev, curr) = (pair[0].earnings_per_share, pair[1].earnings_per_share);
            prev > 0.0 && curr.is_finite() && ((curr - prev) / prev * 100.0).abs() > MAX_YOY_GROWTH
        })
        .map(|pair| pair[1].year)
        .collect();
    if suspicious.is_empty() {
        check("growth_anomalies", CheckStatus::Pass, "year-over-year EPS changes plausible")
    } else {
        check(
            "growth_anomalies",
            CheckStatus::Warning,
            format!("EPS moved more than {MAX_YOY_GROWTH}% in {}", list_years(&suspicious)),
        )
    }
}

fn year_gaps(rows: &[&AnnualRecord]) -> QualityCheck {
    let gaps: Vec<String> = rows
        .windows(2)
        .filter(|pair| i64::from(pair[1].year) - i64::from(pair[0].year) > i64::from(MAX_YEAR_GAP))
        .map(|pair| format!("{}-{}", pair[0].year, pair[1].year))
        .collect();
    if gaps.is_empty() {
        check("year_gaps", CheckStatus::Pass, "no gaps in the yearly series")
    } else {
        check(
            "year_gaps",
            CheckStatus::Warning,
            format!("gaps between {}", gaps.join(", ")),
        )
    }
}

fn stock_splits(rows: &[&AnnualRecord]) -> QualityCheck {
    let jumps: Vec<i32> = rows
        .windows(2)
        .filter(|pair| pair[0].has_valid_prices() && pair[1].has_valid_prices())
        .filter(|pair| {
            let ratio = pair[1].mid_price() / pair[0].mid_price();
            ratio < SPLIT_RATIO_LOW || ratio > SPLIT_RATIO_HIGH
        })
        .map(|pair| pair[1].year)
        .collect();
    if jumps.is_empty() {
        check("stock_splits", CheckStatus::Pass, "no unadjusted split detected")
    } else {
        check(
            "stock_splits",
            CheckStatus::Warning,
            format!("possible unadjusted split in {}", list_years(&jumps)),
        )
    }
}

fn current_price(price: f64) -> QualityCheck {
    if !price.is_finite() || price <= 0.0 {
        check("current_price", CheckStatus::Fail, format!("current price {price} is not positive"))
    } else if PLACEHOLDER_PRICES.contains(&price) {
        check("current_price", CheckStatus::Fail, format!("current price {price} looks like a placeholder"))
    } else {
        check("current_price", CheckStatus::Pass, format!("current price {price:.2}"))
    }
}

fn positive_column(
    records: &[AnnualRecord],
    name: &str,
    label: &str,
    value: fn(&AnnualRecord) -> f64,
) -> QualityCheck {
    let bad: Vec<i32> = records
        .iter()
        .filter(|r| !(value(r) > 0.0))
        .map(|r| r.year)
        .collect();
    if records.is_empty() || bad.len() == records.len() {
        check(name, CheckStatus::Fail, format!("no positive {label}"))
    } else if bad.is_empty() {
        check(name, CheckStatus::Pass, format!("{label} positive every year"))
    } else {
        check(
            name,
            CheckStatus::Warning,
            format!("non-positive {label} in {}", list_years(&bad)),
        )
    }
}

/// Nine pass/warning/fail checks over a profile's history and current price.
/// The score is the share of checks passed, 0-100.
pub fn data_quality_report(records: &[AnnualRecord], price: f64) -> DataQualityReport {
    let rows = sorted(records);
    let checks = vec![
        data_quantity(records),
        price_validity(records),
        eps_outliers(records),
        growth_anomalies(&rows),
        year_gaps(&rows),
        stock_splits(&rows),
        current_price(price),
        positive_column(records, "book_value", "book value", |r| r.book_value_per_share),
        positive_column(records, "cash_flow", "cash flow", |r| r.cash_flow_per_share),
    ];

    let passed = checks.iter().filter(|c| c.status == CheckStatus::Pass).count();
    let overall_score = (passed as f64 / checks.len() as f64 * 100.0).round() as u32;

    let mut critical = Vec::new();
    let mut warnings = Vec::new();
    let mut info = Vec::new();
    for c in &checks {
        let line = format!("{}: {}", c.name, c.message);
        match c.status {
            CheckStatus::Fail => critical.push(line),
            CheckStatus::Warning => warnings.push(line),
            CheckStatus::Pass => info.push(line),
        }
    }

    DataQualityReport {
        overall_score,
        critical,
        warnings,
        info,
        checks,
    }
}
