#![deny(unsafe_code)]

pub mod codelists;
pub mod ct_loader;
pub mod domains;
pub mod error;
pub mod findings;
pub mod registry;

pub use crate::ct_loader::{load_ct_csv, parse_ct_reader};
pub use crate::error::StandardsError;
pub use crate::findings::{TestLookup, normalize_test_key, synthesize_test_code};
pub use crate::registry::DomainRegistry;
