use sdtm_standards::StandardsError;
use thiserror::Error;

/// Run-level scheduling failures. Raised before any domain is derived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("unknown domain {code}")]
    UnknownDomain { code: String },

    #[error("{domain} requires {dependency}, which is not part of the run")]
    MissingDependency { domain: String, dependency: String },

    #[error("dependency cycle between {}", domains.join(", "))]
    Cycle { domains: Vec<String> },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Standards(#[from] StandardsError),

    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("worker deriving {domain} panicked")]
    WorkerPanicked { domain: String },
}
