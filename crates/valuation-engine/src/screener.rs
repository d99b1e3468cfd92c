use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use valuation_core::Recommendation;

use crate::models::{Profile, ValuationResult};
use crate::traits::ProfileValuator;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenerFilters {
    pub min_jpegy: Option<f64>,
    pub max_jpegy: Option<f64>,
    pub recommendation: Option<Recommendation>,
    pub min_ratio_3_1: Option<f64>,
    /// Percent; unsizable returns never pass
    pub min_total_return: Option<f64>,
    pub limit: Option<usize>,
}

impl ScreenerFilters {
    fn has_jpegy_filter(&self) -> bool {
        self.min_jpegy.is_some() || self.max_jpegy.is_some()
    }

    pub fn accepts(&self, result: &ValuationResult) -> bool {
        if self.has_jpegy_filter() {
            let Some(j) = result.jpegy else {
                return false;
            };
            if self.min_jpegy.is_some_and(|min| j < min) || self.max_jpegy.is_some_and(|max| j > max) {
                return false;
            }
        }
        if self.recommendation.is_some_and(|r| r != result.recommendation) {
            return false;
        }
        if let Some(min) = self.min_ratio_3_1 {
            if !result.ratio_3_1.is_some_and(|r| r >= min) {
                return false;
            }
        }
        if let Some(min) = self.min_total_return {
            if !result.return_sizable || result.total_return_percent < min {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenedProfile {
    pub symbol: String,
    pub result: ValuationResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenerResult {
    pub entries: Vec<ScreenedProfile>,
    pub total_analyzed: usize,
    pub total_passed_filters: usize,
}

/// JPEGY ascending, unavailable scores last, ties broken by symbol.
fn by_jpegy(a: &ScreenedProfile, b: &ScreenedProfile) -> Ordering {
    match (a.result.jpegy, b.result.jpegy) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Values every profile in parallel and keeps the ones passing `filters`.
pub fn screen<V: ProfileValuator>(
    valuator: &V,
    profiles: &[Profile],
    filters: &ScreenerFilters,
) -> ScreenerResult {
    let total_analyzed = profiles.len();
    tracing::info!("Screening {} profiles", total_analyzed);

    let mut entries: Vec<ScreenedProfile> = profiles
        .par_iter()
        .map(|profile| ScreenedProfile {
            symbol: profile.symbol.clone(),
            result: valuator.evaluate_profile(profile),
        })
        .filter(|entry| filters.accepts(&entry.result))
        .collect();

    let total_passed_filters = entries.len();
    entries.sort_by(by_jpegy);
    if let Some(limit) = filters.limit {
        entries.truncate(limit);
    }

    tracing::info!(
        "Screen complete: {}/{} profiles passed filters, returning {}",
        total_passed_filters,
        total_analyzed,
        entries.len()
    );

    ScreenerResult {
        entries,
        total_analyzed,
        total_passed_filters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValuationEngine;
    use valuation_core::{AnnualRecord, Assumptions};

    fn profile(symbol: &str, price: f64, eps_growth: f64) -> Profile {
        let records = (0..5)
            .map(|i| AnnualRecord {
                year: 2019 + i,
                price_high: 40.0,
                price_low: 20.0,
                earnings_per_share: 2.0 + 0.2 * i as f64,
                cash_flow_per_share: 3.0,
                book_value_per_share: 10.0,
                dividend_per_share: 0.5,
                is_estimate: false,
            })
            .collect();
        Profile {
            symbol: symbol.to_string(),
            records,
            assumptions: Assumptions {
                current_price: price,
                current_dividend: 0.5,
                base_year: 2023,
                growth_rate_eps: eps_growth,
                target_pe: 15.0,
                ..Assumptions::default()
            },
        }
    }

    #[test]
    fn test_sorted_by_jpegy_with_unavailable_last() {
        let profiles = vec![
            profile("CCC", 30.0, 4.0),
            profile("AAA", 30.0, 12.0),
            profile("ZERO", 0.0, 12.0),
            profile("BBB", 30.0, 8.0),
        ];
        let result = screen(&ValuationEngine::new(), &profiles, &ScreenerFilters::default());
        let symbols: Vec<&str> = result.entries.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "BBB", "CCC", "ZERO"]);
        assert_eq!(result.total_analyzed, 4);
        assert_eq!(result.total_passed_filters, 4);
    }

    #[test]
    fn test_jpegy_filter_and_limit() {
        let profiles = vec![
            profile("CCC", 30.0, 4.0),
            profile("AAA", 30.0, 12.0),
            profile("BBB", 30.0, 8.0),
            profile("ZERO", 0.0, 12.0),
        ];
        let filters = ScreenerFilters {
            max_jpegy: Some(1.5),
            limit: Some(1),
            ..ScreenerFilters::default()
        };
        let result = screen(&ValuationEngine::new(), &profiles, &filters);
        assert_eq!(result.total_passed_filters, 2);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].symbol, "AAA");
    }

    #[test]
    fn test_return_filter_rejects_unsizable() {
        let profiles = vec![profile("ZERO", 0.0, 12.0)];
        let filters = ScreenerFilters {
            min_total_return: Some(-100.0),
            ..ScreenerFilters::default()
        };
        let result = screen(&ValuationEngine::new(), &profiles, &filters);
        assert!(result.entries.is_empty());
        assert_eq!(result.total_analyzed, 1);
    }

    #[test]
    fn test_recommendation_filter() {
        let profiles = vec![profile("AAA", 30.0, 12.0)];
        let buy_only = ScreenerFilters {
            recommendation: Some(Recommendation::Buy),
            ..ScreenerFilters::default()
        };
        let result = screen(&ValuationEngine::new(), &profiles, &buy_only);
        assert_eq!(result.entries.len(), 1);

        let sell_only = ScreenerFilters {
            recommendation: Some(Recommendation::Sell),
            ..ScreenerFilters::default()
        };
        let result = screen(&ValuationEngine::new(), &profiles, &sell_only);
        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_filters_deserialize_partial() {
        let f: ScreenerFilters = serde_json::from_str(r#"{"maxJpegy": 1.5}"#).unwrap();
        assert_eq!(f.max_jpegy, Some(1.5));
        assert_eq!(f.limit, None);
    }
}
