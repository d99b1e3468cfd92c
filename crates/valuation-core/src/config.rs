use serde::{Deserialize, Serialize};

use crate::{Metric, ValuationError};

/// Closed numeric interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, name: &str) -> Result<(), ValuationError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ValuationError::InvalidConfig(format!(
                "{name} bounds must be finite (got [{}, {}])",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(ValuationError::InvalidConfig(format!(
                "{name} min ({}) exceeds max ({})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Bounds on target multiples, one per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBounds {
    pub pe: Bounds,
    pub pcf: Bounds,
    pub pbv: Bounds,
    /// Dividend yield, in percent
    #[serde(rename = "yield")]
    pub yield_: Bounds,
}

impl RatioBounds {
    pub fn for_metric(&self, metric: Metric) -> &Bounds {
        match metric {
            Metric::Eps => &self.pe,
            Metric::CashFlow => &self.pcf,
            Metric::BookValue => &self.pbv,
            Metric::Dividend => &self.yield_,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionLimits {
    /// Targets above `price × this` are excluded from the consensus
    pub max_reasonable_target_multiplier: f64,
    /// Targets below `price × this` are excluded from the consensus
    pub min_reasonable_target_multiplier: f64,
    /// Cumulative 5-year dividends never exceed `price × this`
    pub max_dividend_multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLimits {
    /// Lowest acceptable total return, percent
    pub min: f64,
    /// Highest acceptable total return, percent
    pub max: f64,
    pub max_target_multiplier: f64,
}

/// Constants of the buy/hold/sell price bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationBands {
    /// Floor price = average historical low × this
    pub floor_factor: f64,
    /// Buy limit sits this fraction of the way from floor to target
    pub buy_fraction: f64,
    /// Sell limit = consensus target × this
    pub sell_factor: f64,
}

impl Default for RecommendationBands {
    fn default() -> Self {
        Self {
            floor_factor: 0.9,
            buy_fraction: 0.33,
            sell_factor: 1.0,
        }
    }
}

/// Read-only bounds applied to every computed quantity of a valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailConfig {
    /// Annual growth rate bounds, percent
    pub growth: Bounds,
    pub ratios: RatioBounds,
    /// Plausible year-over-year growth deltas in historical data, percent
    pub outliers: Bounds,
    pub projections: ProjectionLimits,
    pub returns: ReturnLimits,
    pub recommendation: RecommendationBands,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            growth: Bounds::new(-20.0, 20.0),
            ratios: RatioBounds {
                pe: Bounds::new(1.0, 100.0),
                pcf: Bounds::new(1.0, 100.0),
                pbv: Bounds::new(0.1, 20.0),
                yield_: Bounds::new(0.1, 20.0),
            },
            outliers: Bounds::new(-50.0, 100.0),
            projections: ProjectionLimits {
                max_reasonable_target_multiplier: 10.0,
                min_reasonable_target_multiplier: 0.1,
                max_dividend_multiplier: 10.0,
            },
            returns: ReturnLimits {
                min: -100.0,
                max: 1000.0,
                max_target_multiplier: 20.0,
            },
            recommendation: RecommendationBands::default(),
        }
    }
}

impl GuardrailConfig {
    /// Parse a JSON override and validate it. Sections left out keep their
    /// defaults; a section that is present must be complete.
    pub fn from_json_str(json: &str) -> Result<Self, ValuationError> {
        let config: GuardrailConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValuationError> {
        self.growth.validate("growth")?;
        self.ratios.pe.validate("ratios.pe")?;
        self.ratios.pcf.validate("ratios.pcf")?;
        self.ratios.pbv.validate("ratios.pbv")?;
        self.ratios.yield_.validate("ratios.yield")?;
        self.outliers.validate("outliers")?;
        Bounds::new(self.returns.min, self.returns.max).validate("returns")?;

        let p = &self.projections;
        Bounds::new(
            p.min_reasonable_target_multiplier,
            p.max_reasonable_target_multiplier,
        )
        .validate("projections target multiplier")?;

        let positives = [
            ("projections.minReasonableTargetMultiplier", p.min_reasonable_target_multiplier),
            ("projections.maxDividendMultiplier", p.max_dividend_multiplier),
            ("returns.maxTargetMultiplier", self.returns.max_target_multiplier),
            ("recommendation.floorFactor", self.recommendation.floor_factor),
            ("recommendation.sellFactor", self.recommendation.sell_factor),
        ];
        for (name, value) in positives {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValuationError::InvalidConfig(format!(
                    "{name} must be a positive number (got {value})"
                )));
            }
        }

        let buy = self.recommendation.buy_fraction;
        if !(0.0..=1.0).contains(&buy) {
            return Err(ValuationError::InvalidConfig(format!(
                "recommendation.buyFraction must be within [0, 1] (got {buy})"
            )));
        }
        Ok(())
    }
}
