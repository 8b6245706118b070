//! Produced domain tables and the snapshot handed to dependent domains.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use sdtm_model::Defect;

/// A produced SDTM domain dataset.
#[derive(Debug, Clone)]
pub struct DomainFrame {
    /// The SDTM domain code (e.g., "AE", "DM", "LB").
    pub domain_code: String,
    pub data: DataFrame,
}

impl DomainFrame {
    pub fn new(domain_code: impl Into<String>, data: DataFrame) -> Self {
        Self {
            domain_code: domain_code.into(),
            data,
        }
    }

    /// Returns the number of records in the frame.
    pub fn record_count(&self) -> usize {
        self.data.height()
    }
}

/// Result of deriving one domain: the table and the record-level defects raised on the way.
#[derive(Debug, Clone)]
pub struct DomainOutput {
    pub frame: DomainFrame,
    pub defects: Vec<Defect>,
}

/// Tables produced so far in a run, keyed by domain code.
///
/// Derivation only reads it. The pipeline inserts between waves, so every
/// domain in a wave sees the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct ProducedTables {
    tables: BTreeMap<String, DomainFrame>,
}

impl ProducedTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame: DomainFrame) {
        self.tables.insert(frame.domain_code.to_uppercase(), frame);
    }

    pub fn get(&self, code: &str) -> Option<&DomainFrame> {
        self.tables.get(&code.to_uppercase())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.tables.contains_key(&code.to_uppercase())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainFrame> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<DomainFrame> for ProducedTables {
    fn from_iter<I: IntoIterator<Item = DomainFrame>>(iter: I) -> Self {
        let mut tables = Self::new();
        for frame in iter {
            tables.insert(frame);
        }
        tables
    }
}
