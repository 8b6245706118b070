//! Per-record normalization steps applied during derivation.
//!
//! - **datetime**: --DTC values to ISO 8601 at collected precision
//! - **ct**: codelist synonyms to submission values
//! - **numeric**: Findings results to standard units
//! - **studyday**: --DY from the subject reference start date
//! - **epoch**: EPOCH from the subject's trial elements

pub mod ct;
pub mod datetime;
pub mod epoch;
pub mod numeric;
pub mod studyday;

pub use ct::normalize_terminology;
pub use datetime::normalize_dates;
pub use epoch::assign_epochs;
pub use numeric::{StandardResult, standardize_results, to_standard_unit};
pub use studyday::{calculate_study_day, derive_study_days, study_day_from_iso};
