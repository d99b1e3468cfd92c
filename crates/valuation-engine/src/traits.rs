use valuation_core::{AnnualRecord, Assumptions};

use crate::models::{Profile, ValuationResult};

/// Anything that can value one company from its history and assumptions.
/// Implementations must be pure so batches can run across threads.
pub trait ProfileValuator: Send + Sync {
    fn evaluate(&self, records: &[AnnualRecord], assumptions: &Assumptions) -> ValuationResult;

    fn evaluate_profile(&self, profile: &Profile) -> ValuationResult {
        self.evaluate(&profile.records, &profile.assumptions)
    }
}
