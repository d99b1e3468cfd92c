pub mod config;
pub mod error;
pub mod stats;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;
