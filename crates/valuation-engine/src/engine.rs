use valuation_core::{
    AnnualRecord, Assumptions, GuardrailConfig, Metric, PerMetric, ValuationError,
};

use crate::autofill::suggest_assumptions;
use crate::composite::{
    average_historical_low, downside_risk, forward_jpegy, jpegy, ratio_3_1, upside_potential,
};
use crate::diagnostics::{is_needs_sync, Diagnostic};
use crate::models::{
    DataQualityReport, HistoricalRanges, JpegyZone, ValuationResult, ValuationStatus,
};
use crate::projection::{
    consensus_target, cumulative_dividends, project_value, target_price, total_return,
    ReturnEstimate, TargetRejection,
};
use crate::quality::data_quality_report;
use crate::ratios::{current_ratios, historical_ranges};
use crate::recommendation::{classify, price_bands};
use crate::traits::ProfileValuator;
use crate::PROJECTION_YEARS;

fn finite(v: f64) -> Option<f64> {
    Some(v).filter(|v| v.is_finite())
}

/// Picks the record valuations start from: the requested year when its EPS is
/// positive, else the latest year with positive EPS, else the latest year.
pub fn select_base_record(records: &[AnnualRecord], base_year: i32) -> Option<&AnnualRecord> {
    let positive_eps = |r: &&AnnualRecord| r.earnings_per_share.is_finite() && r.earnings_per_share > 0.0;

    records
        .iter()
        .filter(positive_eps)
        .find(|r| r.year == base_year)
        .or_else(|| records.iter().filter(positive_eps).max_by_key(|r| r.year))
        .or_else(|| records.iter().max_by_key(|r| r.year))
}

/// Guardrailed valuation engine. Holds only its configuration; every call is
/// a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct ValuationEngine {
    config: GuardrailConfig,
}

impl ValuationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a custom configuration, rejected if any bound is malformed.
    pub fn with_config(config: GuardrailConfig) -> Result<Self, ValuationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GuardrailConfig {
        &self.config
    }

    /// Values one profile. Never fails: degraded inputs produce unavailable
    /// figures plus diagnostics.
    pub fn evaluate(&self, records: &[AnnualRecord], assumptions: &Assumptions) -> ValuationResult {
        let config = &self.config;
        let price = assumptions.current_price;
        let price_valid = assumptions.has_valid_price();
        let needs_sync = is_needs_sync(records, price);
        let mut diagnostics = Vec::new();

        if records.is_empty() {
            diagnostics.push(Diagnostic::NoRecords);
        }
        if !price_valid {
            diagnostics.push(Diagnostic::InvalidPrice { price });
        }

        let base = select_base_record(records, assumptions.base_year);
        if let Some(base) = base {
            if base.year != assumptions.base_year {
                diagnostics.push(Diagnostic::BaseYearFallback {
                    requested: assumptions.base_year,
                    used: base.year,
                });
            }
            if !(base.earnings_per_share > 0.0) {
                diagnostics.push(Diagnostic::BaseEpsNotPositive {
                    year: base.year,
                    eps: base.earnings_per_share,
                });
            }
        }

        for metric in Metric::ALL {
            let requested = assumptions.growth_rate(metric);
            let used = config.growth.clamp(requested);
            if requested.is_finite() && used != requested {
                diagnostics.push(Diagnostic::GrowthClamped { metric, requested, used });
            }
            let requested = assumptions.target_multiple(metric);
            let used = config.ratios.for_metric(metric).clamp(requested);
            if requested.is_finite() && requested > 0.0 && used != requested {
                diagnostics.push(Diagnostic::MultipleClamped { metric, requested, used });
            }
        }

        let base_values = PerMetric::from_fn(|m| match m {
            Metric::Dividend => finite(assumptions.current_dividend),
            _ => base.and_then(|b| finite(b.value(m.record_field()))),
        });
        let projections = base_values.map(|m, base| {
            base.and_then(|b| {
                project_value(b, assumptions.growth_rate(m), PROJECTION_YEARS, &config.growth)
            })
        });
        let target_prices = projections.map(|m, projected| {
            target_price(
                m,
                *projected,
                assumptions.target_multiple(m),
                config.ratios.for_metric(m),
                m.multiple_cap(),
            )
        });

        let consensus = consensus_target(&target_prices, &assumptions.exclusions(), price, config);
        if price_valid {
            for (metric, rejection) in &consensus.rejected {
                if matches!(rejection, TargetRejection::OutOfBand { .. }) {
                    diagnostics.push(Diagnostic::TargetRejected {
                        metric: *metric,
                        rejection: *rejection,
                    });
                }
            }
        }
        if consensus.value.is_none() {
            let excluded = consensus.excluded();
            let rejected = consensus
                .rejected
                .iter()
                .filter(|(_, r)| !matches!(r, TargetRejection::Excluded))
                .map(|(m, _)| *m)
                .collect();
            tracing::debug!("no consensus target, excluded: {:?}", excluded);
            diagnostics.push(Diagnostic::NoValidTargets { excluded, rejected });
        }

        let dividend = assumptions.current_dividend;
        if dividend.is_finite() && dividend > 0.0 && !assumptions.growth_rate_div.is_finite() {
            diagnostics.push(Diagnostic::DividendGrowthUnavailable { dividend });
        }
        let dividends = cumulative_dividends(
            assumptions.current_dividend,
            assumptions.growth_rate_div,
            PROJECTION_YEARS,
            price,
            config,
        );
        let estimate = total_return(consensus.value, dividends, price, config);
        if let ReturnEstimate::Unsizable(rejection) = estimate {
            tracing::debug!("total return unsizable: {}", rejection);
            diagnostics.push(Diagnostic::ReturnUnsizable { rejection });
        }

        let ratios = current_ratios(price, assumptions.current_dividend, base);
        let eps = base.map(|b| b.earnings_per_share).unwrap_or(0.0);
        let eps_growth = if assumptions.growth_rate_eps.is_finite() {
            config.growth.clamp(assumptions.growth_rate_eps)
        } else {
            f64::NAN
        };
        let current_yield = ratios.yield_.unwrap_or(0.0);
        let jpegy_score = match jpegy(price, eps, eps_growth, current_yield) {
            Ok(score) => Some(score),
            Err(rejection) => {
                tracing::debug!("JPEGY unavailable: {}", rejection);
                diagnostics.push(Diagnostic::JpegyUnavailable { rejection });
                None
            }
        };
        let forward = forward_jpegy(price, eps, eps_growth, current_yield).ok();

        let average_low = average_historical_low(records);
        if average_low.is_none() && !records.is_empty() {
            diagnostics.push(Diagnostic::NoHistoricalPrices);
        }
        let downside = downside_risk(price, average_low, config.recommendation.floor_factor);
        let upside = upside_potential(&estimate);

        let bands = if price_valid {
            price_bands(price, consensus.value, average_low, &config.recommendation)
        } else {
            None
        };
        let recommendation = classify(price, bands.as_ref());

        let status = if needs_sync {
            diagnostics = vec![Diagnostic::NeedsSync];
            ValuationStatus::NeedsSync
        } else if !price_valid || records.is_empty() || consensus.value.is_none() {
            ValuationStatus::Invalid
        } else if diagnostics.is_empty() {
            ValuationStatus::Complete
        } else {
            ValuationStatus::Degraded
        };

        ValuationResult {
            status,
            base_year_used: base.map(|b| b.year),
            base_values,
            projections,
            target_prices,
            consensus_target: consensus.value,
            included_metrics: consensus.included,
            cumulative_dividends: dividends,
            total_return_percent: estimate.percent(),
            return_sizable: estimate.sized().is_some(),
            current_ratios: ratios,
            jpegy: jpegy_score,
            forward_jpegy: forward,
            jpegy_zone: jpegy_score.map(JpegyZone::from_score),
            downside_risk: downside,
            upside_potential: upside,
            ratio_3_1: ratio_3_1(upside, downside),
            price_bands: bands,
            recommendation,
            diagnostics,
        }
    }

    pub fn historical_ranges(&self, records: &[AnnualRecord], window: usize) -> HistoricalRanges {
        historical_ranges(records, window, &self.config)
    }

    pub fn suggest_assumptions(
        &self,
        records: &[AnnualRecord],
        current_price: f64,
        current_dividend: f64,
    ) -> Assumptions {
        suggest_assumptions(records, current_price, current_dividend, &self.config)
    }

    pub fn data_quality_report(&self, records: &[AnnualRecord], current_price: f64) -> DataQualityReport {
        data_quality_report(records, current_price)
    }
}

impl ProfileValuator for ValuationEngine {
    fn evaluate(&self, records: &[AnnualRecord], assumptions: &Assumptions) -> ValuationResult {
        ValuationEngine::evaluate(self, records, assumptions)
    }
}
