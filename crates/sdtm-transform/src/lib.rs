//! SDTM derivation engine.
//!
//! [`produce`] turns one domain's raw source table into its SDTM table,
//! deriving USUBJID, --SEQ, ISO 8601 dates, --DY, EPOCH and --BLFL, and
//! reshaping wide Findings data into one record per result.

pub mod baseline;
pub mod context;
pub mod datetime;
pub mod engine;
pub mod error;
pub mod frame;
pub mod identity;
pub mod issue;
pub mod normalization;
pub mod records;
pub mod reference;
pub mod sequence;
pub mod wide;

pub use context::TransformContext;
pub use datetime::{DateNormalization, IsoDateTime, normalize_datetime, parse_iso8601};
pub use engine::{failed_output, produce};
pub use error::{Result, TransformError};
pub use frame::{DomainFrame, DomainOutput, ProducedTables};
pub use normalization::{calculate_study_day, study_day_from_iso, to_standard_unit};
