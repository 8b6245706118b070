//! Shared utilities for SDTM crates.
//!
//! Value conversion for Polars `AnyValue` cells and column readers used by
//! the derivation and conformance engines.

pub mod columns;
pub mod polars;

pub use columns::{
    column_i64s, column_strings, float_column, has_column, int_column, optional_column_strings,
    string_column,
};
pub use polars::{any_to_f64, any_to_i64, any_to_string, format_numeric, is_missing, parse_f64};
