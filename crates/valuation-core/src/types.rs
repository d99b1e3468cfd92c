use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValuationError;

/// One fiscal year of per-share fundamentals for a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualRecord {
    pub year: i32,
    pub price_high: f64,
    pub price_low: f64,
    pub earnings_per_share: f64,
    pub cash_flow_per_share: f64,
    pub book_value_per_share: f64,
    pub dividend_per_share: f64,
    /// Analyst estimate rather than a reported year
    #[serde(default)]
    pub is_estimate: bool,
}

impl AnnualRecord {
    pub fn value(&self, field: RecordField) -> f64 {
        match field {
            RecordField::PriceHigh => self.price_high,
            RecordField::PriceLow => self.price_low,
            RecordField::EarningsPerShare => self.earnings_per_share,
            RecordField::CashFlowPerShare => self.cash_flow_per_share,
            RecordField::BookValuePerShare => self.book_value_per_share,
            RecordField::DividendPerShare => self.dividend_per_share,
        }
    }

    /// Both price bounds are finite and strictly positive.
    pub fn has_valid_prices(&self) -> bool {
        self.price_high.is_finite()
            && self.price_low.is_finite()
            && self.price_high > 0.0
            && self.price_low > 0.0
    }

    pub fn mid_price(&self) -> f64 {
        (self.price_high + self.price_low) / 2.0
    }
}

/// Numeric column of an [`AnnualRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordField {
    PriceHigh,
    PriceLow,
    EarningsPerShare,
    CashFlowPerShare,
    BookValuePerShare,
    DividendPerShare,
}

/// The four fundamentals a target price can be derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    Eps,
    CashFlow,
    BookValue,
    Dividend,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Eps,
        Metric::CashFlow,
        Metric::BookValue,
        Metric::Dividend,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Eps => "EPS",
            Metric::CashFlow => "CF",
            Metric::BookValue => "BV",
            Metric::Dividend => "DIV",
        }
    }

    pub fn record_field(&self) -> RecordField {
        match self {
            Metric::Eps => RecordField::EarningsPerShare,
            Metric::CashFlow => RecordField::CashFlowPerShare,
            Metric::BookValue => RecordField::BookValuePerShare,
            Metric::Dividend => RecordField::DividendPerShare,
        }
    }

    /// Hard ceiling on the (already clamped) target multiple for this metric.
    /// The dividend multiple is a yield in percent.
    pub fn multiple_cap(&self) -> f64 {
        match self {
            Metric::Eps => 100.0,
            Metric::CashFlow => 100.0,
            Metric::BookValue => 50.0,
            Metric::Dividend => 50.0,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per [`Metric`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerMetric<T> {
    pub eps: T,
    pub cash_flow: T,
    pub book_value: T,
    pub dividend: T,
}

impl<T> PerMetric<T> {
    pub fn from_fn(mut f: impl FnMut(Metric) -> T) -> Self {
        Self {
            eps: f(Metric::Eps),
            cash_flow: f(Metric::CashFlow),
            book_value: f(Metric::BookValue),
            dividend: f(Metric::Dividend),
        }
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::Eps => &self.eps,
            Metric::CashFlow => &self.cash_flow,
            Metric::BookValue => &self.book_value,
            Metric::Dividend => &self.dividend,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Metric, &T) -> U) -> PerMetric<U> {
        PerMetric::from_fn(|m| f(m, self.get(m)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

fn unset() -> f64 {
    f64::NAN
}

/// Projection inputs for one profile, edited by the user or auto-filled.
///
/// Growth rates and target multiples left out of the input deserialize as NaN,
/// which the engine reports as unavailable rather than treating as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assumptions {
    pub current_price: f64,
    #[serde(default)]
    pub current_dividend: f64,
    pub base_year: i32,

    #[serde(rename = "growthRateEPS", default = "unset")]
    pub growth_rate_eps: f64,
    #[serde(rename = "growthRateCF", default = "unset")]
    pub growth_rate_cf: f64,
    #[serde(rename = "growthRateBV", default = "unset")]
    pub growth_rate_bv: f64,
    #[serde(default = "unset")]
    pub growth_rate_div: f64,

    #[serde(rename = "targetPE", default = "unset")]
    pub target_pe: f64,
    #[serde(rename = "targetPCF", default = "unset")]
    pub target_pcf: f64,
    #[serde(rename = "targetPBV", default = "unset")]
    pub target_pbv: f64,
    #[serde(default = "unset")]
    pub target_yield: f64,

    #[serde(rename = "excludeEPS", default)]
    pub exclude_eps: bool,
    #[serde(rename = "excludeCF", default)]
    pub exclude_cf: bool,
    #[serde(rename = "excludeBV", default)]
    pub exclude_bv: bool,
    #[serde(rename = "excludeDIV", default)]
    pub exclude_div: bool,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            current_price: 0.0,
            current_dividend: 0.0,
            base_year: 0,
            growth_rate_eps: unset(),
            growth_rate_cf: unset(),
            growth_rate_bv: unset(),
            growth_rate_div: unset(),
            target_pe: unset(),
            target_pcf: unset(),
            target_pbv: unset(),
            target_yield: unset(),
            exclude_eps: false,
            exclude_cf: false,
            exclude_bv: false,
            exclude_div: false,
        }
    }
}

impl Assumptions {
    /// Annual growth rate in percent for a metric.
    pub fn growth_rate(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Eps => self.growth_rate_eps,
            Metric::CashFlow => self.growth_rate_cf,
            Metric::BookValue => self.growth_rate_bv,
            Metric::Dividend => self.growth_rate_div,
        }
    }

    /// Target multiple for a metric (P/E, P/CF, P/BV, or yield in percent).
    pub fn target_multiple(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Eps => self.target_pe,
            Metric::CashFlow => self.target_pcf,
            Metric::BookValue => self.target_pbv,
            Metric::Dividend => self.target_yield,
        }
    }

    pub fn is_excluded(&self, metric: Metric) -> bool {
        match metric {
            Metric::Eps => self.exclude_eps,
            Metric::CashFlow => self.exclude_cf,
            Metric::BookValue => self.exclude_bv,
            Metric::Dividend => self.exclude_div,
        }
    }

    pub fn exclusions(&self) -> PerMetric<bool> {
        PerMetric::from_fn(|m| self.is_excluded(m))
    }

    /// Current price is usable as a denominator.
    pub fn has_valid_price(&self) -> bool {
        self.current_price.is_finite() && self.current_price > 0.0
    }
}

/// Three-zone recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

impl Recommendation {
    pub fn to_label(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Sell => "SELL",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

impl FromStr for Recommendation {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Recommendation::Buy),
            "HOLD" => Ok(Recommendation::Hold),
            "SELL" => Ok(Recommendation::Sell),
            other => Err(ValuationError::InvalidInput(format!(
                "unknown recommendation '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assumptions_deserialize_dashboard_keys() {
        let json = r#"{
            "currentPrice": 50.0,
            "baseYear": 2023,
            "growthRateEPS": 10.0,
            "targetPE": 15.0,
            "excludeDIV": true
        }"#;
        let a: Assumptions = serde_json::from_str(json).unwrap();
        assert_eq!(a.growth_rate(Metric::Eps), 10.0);
        assert_eq!(a.target_multiple(Metric::Eps), 15.0);
        assert!(a.growth_rate(Metric::CashFlow).is_nan());
        assert!(a.is_excluded(Metric::Dividend));
        assert!(!a.is_excluded(Metric::Eps));
        assert_eq!(a.current_dividend, 0.0);
    }

    #[test]
    fn test_missing_required_field_is_hard_failure() {
        let json = r#"{ "baseYear": 2023 }"#;
        assert!(serde_json::from_str::<Assumptions>(json).is_err());
    }

    #[test]
    fn test_per_metric_map_and_iter() {
        let values = PerMetric::from_fn(|m| m.multiple_cap());
        let doubled = values.map(|_, v| v * 2.0);
        assert_eq!(*doubled.get(Metric::BookValue), 100.0);
        let labels: Vec<&str> = values.iter().map(|(m, _)| m.label()).collect();
        assert_eq!(labels, vec!["EPS", "CF", "BV", "DIV"]);
    }

    #[test]
    fn test_recommendation_from_str() {
        assert_eq!("buy".parse::<Recommendation>(), Ok(Recommendation::Buy));
        assert_eq!(" SELL ".parse::<Recommendation>(), Ok(Recommendation::Sell));
        assert!(matches!(
            "strong buy".parse::<Recommendation>(),
            Err(ValuationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_recommendation_serializes_upper_case() {
        let s = serde_json::to_string(&Recommendation::Buy).unwrap();
        assert_eq!(s, "\"BUY\"");
    }
}
