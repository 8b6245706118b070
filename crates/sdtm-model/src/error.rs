use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown dataset class: {0}")]
    UnknownDatasetClass(String),
    #[error("unknown core designation: {0}")]
    UnknownCore(String),
    #[error("unknown rule id: {0}")]
    UnknownRule(String),
    #[error("invalid layer weights: {0}")]
    InvalidWeights(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
