pub mod autofill;
pub mod composite;
pub mod diagnostics;
pub mod engine;
pub mod models;
pub mod projection;
pub mod quality;
pub mod ratios;
pub mod recommendation;
pub mod screener;
pub mod traits;

pub use diagnostics::Diagnostic;
pub use engine::ValuationEngine;
pub use models::*;
pub use traits::ProfileValuator;

/// Number of years projected forward from the base year.
pub const PROJECTION_YEARS: u32 = 5;
