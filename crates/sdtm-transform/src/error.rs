use sdtm_standards::StandardsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Standards(#[from] StandardsError),

    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("malformed raw table for {domain}: {message}")]
    MalformedRaw { domain: String, message: String },
}

pub type Result<T> = std::result::Result<T, TransformError>;
