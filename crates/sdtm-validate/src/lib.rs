//! Conformance engine for produced SDTM tables.
//!
//! [`validate`] evaluates structural, vocabulary, cross-table and temporal
//! rules over a snapshot of produced tables and returns a weighted readiness
//! score with every defect found.

pub mod checks;
pub mod engine;
pub mod error;
pub mod report;

pub use checks::LayerOutcome;
pub use engine::{ConformanceInput, validate};
pub use error::ConformanceError;
pub use report::{ConformanceReport, DomainSummary, LayerScore};
