//! Source ingestion for the study pipeline.
//!
//! Raw CSV exports are read into all-string Polars frames; typing happens
//! during derivation.

pub mod csv_table;
pub mod discovery;
pub mod error;

pub use csv_table::{CsvTable, read_csv_frame, read_csv_table, read_domain_frame};
pub use discovery::{discover_domain_files, list_csv_files};
pub use error::{IngestError, Result};
