//! Wide format processing for Findings domains.
//!
//! Collected data often carries one column per test (`GLUCOSE`, `HGB`, ...)
//! instead of one row per result. These tables are reshaped into SDTM's
//! vertical layout before any other derivation step runs.

mod findings;

pub use findings::{complete_test_names, is_vertical, reshape_findings};
