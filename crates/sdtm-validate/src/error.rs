use sdtm_model::{Layer, ModelError};
use thiserror::Error;

/// Raised for malformed conformance input. Bad data content is reported as
/// defects instead.
#[derive(Debug, Error)]
pub enum ConformanceError {
    #[error("{domain} has no USUBJID column")]
    MissingSubjectKey { domain: String },

    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("{layer} layer panicked")]
    LayerPanicked { layer: Layer },

    #[error(transparent)]
    InvalidWeights(#[from] ModelError),
}
