//! Numeric helpers shared by the valuation engine.
//!
//! These are plain arithmetic utilities: invalid input yields `0.0` rather than an
//! unavailable marker. Callers that need to distinguish "no data" from a real zero
//! check their inputs before calling in.

use crate::{AnnualRecord, RecordField};

/// Mean of the finite entries. Returns 0.0 for an empty (or all non-finite) set.
pub fn mean(data: &[f64]) -> f64 {
    let finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return 0.0;
    }
    finite.iter().sum::<f64>() / finite.len() as f64
}

/// Median of the finite entries; even counts average the two central values.
pub fn median(data: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation of the finite entries.
pub fn std_dev(data: &[f64]) -> f64 {
    let finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return 0.0;
    }
    let m = mean(&finite);
    let variance = finite.iter().map(|x| (x - m).powi(2)).sum::<f64>() / finite.len() as f64;
    variance.sqrt()
}

/// z-score of `value` relative to `data`. Returns 0.0 if data has no variance.
pub fn z_score_of(value: f64, data: &[f64]) -> f64 {
    let sd = std_dev(data);
    if sd < f64::EPSILON {
        return 0.0;
    }
    (value - mean(data)) / sd
}

/// Compound annual growth rate in percent between two positive points.
///
/// Returns 0.0 when `start <= 0`, `end <= 0`, `years <= 0`, or the result is not finite.
pub fn cagr(start: f64, end: f64, years: f64) -> f64 {
    if !(start > 0.0) || !(end > 0.0) || !(years > 0.0) {
        return 0.0;
    }
    let rate = ((end / start).powf(1.0 / years) - 1.0) * 100.0;
    if rate.is_finite() {
        rate
    } else {
        0.0
    }
}

/// Historical CAGR of one record column over a trailing window.
///
/// The end point is the latest year with a positive value. The start point is the
/// latest positive year at least `window_years` before it, or failing that the
/// oldest positive year before the end point. The rate is computed over the years
/// actually elapsed, which can exceed `window_years`.
pub fn historical_growth(records: &[AnnualRecord], field: RecordField, window_years: i32) -> f64 {
    let mut points: Vec<(i32, f64)> = records
        .iter()
        .map(|r| (r.year, r.value(field)))
        .filter(|(_, v)| v.is_finite() && *v > 0.0)
        .collect();
    points.sort_by_key(|(year, _)| *year);

    let Some(&(end_year, end_value)) = points.last() else {
        return 0.0;
    };

    let anchor = points
        .iter()
        .rev()
        .find(|(year, _)| *year <= end_year.saturating_sub(window_years))
        .or_else(|| points.iter().find(|(year, _)| *year < end_year));

    match anchor {
        Some(&(start_year, start_value)) => {
            cagr(start_value, end_value, (i64::from(end_year) - i64::from(start_year)) as f64)
        }
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(year: i32, eps: f64) -> AnnualRecord {
        AnnualRecord {
            year,
            price_high: 20.0,
            price_low: 10.0,
            earnings_per_share: eps,
            cash_flow_per_share: 0.0,
            book_value_per_share: 0.0,
            dividend_per_share: 0.0,
            is_estimate: false,
        }
    }

    #[test]
    fn test_mean_drops_non_finite() {
        assert_relative_eq!(mean(&[1.0, f64::NAN, 3.0, f64::INFINITY]), 2.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_relative_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[f64::NAN]), 0.0);
    }

    #[test]
    fn test_z_score() {
        let data = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert!(z_score_of(30.0, &data).abs() < 0.01);
        assert_eq!(z_score_of(7.0, &[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn test_cagr() {
        assert_relative_eq!(cagr(100.0, 200.0, 1.0), 100.0, epsilon = 1e-9);
        assert_relative_eq!(cagr(1.0, 1.1_f64.powi(5), 5.0), 10.0, epsilon = 1e-9);
        assert_eq!(cagr(0.0, 10.0, 5.0), 0.0);
        assert_eq!(cagr(10.0, -1.0, 5.0), 0.0);
        assert_eq!(cagr(10.0, 20.0, 0.0), 0.0);
        assert_eq!(cagr(f64::NAN, 20.0, 3.0), 0.0);
    }

    #[test]
    fn test_historical_growth_uses_window_anchor() {
        let records: Vec<AnnualRecord> = (2015..=2023)
            .map(|y| record(y, 1.1_f64.powi(y - 2015)))
            .collect();
        assert_relative_eq!(
            historical_growth(&records, RecordField::EarningsPerShare, 5),
            10.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_historical_growth_unsorted_with_fallback_anchor() {
        // Only 3 years of history: falls back to the oldest positive record.
        let records = vec![record(2023, 4.0), record(2021, 1.0), record(2022, 0.0)];
        let g = historical_growth(&records, RecordField::EarningsPerShare, 5);
        assert_relative_eq!(g, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_historical_growth_anchor_beyond_window() {
        // Nearest valid anchor is 7 years back; rate is over the elapsed 7 years.
        let records = vec![record(2016, 1.0), record(2019, 0.0), record(2023, 2.0)];
        let g = historical_growth(&records, RecordField::EarningsPerShare, 5);
        assert_relative_eq!(g, (2.0_f64.powf(1.0 / 7.0) - 1.0) * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_historical_growth_extreme_years() {
        let records = vec![record(i32::MIN, 1.0), record(i32::MIN + 1, 2.0)];
        let g = historical_growth(&records, RecordField::EarningsPerShare, 5);
        assert_relative_eq!(g, 100.0, epsilon = 1e-9);

        let records = vec![record(i32::MIN, 1.0), record(i32::MAX, 2.0)];
        let g = historical_growth(&records, RecordField::EarningsPerShare, i32::MAX);
        assert!(g.is_finite() && g > 0.0);
    }

    #[test]
    fn test_historical_growth_single_point() {
        assert_eq!(
            historical_growth(&[record(2023, 5.0)], RecordField::EarningsPerShare, 5),
            0.0
        );
    }
}
