use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValuationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ValuationError {
    fn from(err: serde_json::Error) -> Self {
        ValuationError::Serialization(err.to_string())
    }
}
