//! Row-oriented working records used between derivation steps.
//!
//! Raw frames are read into [`WorkRecord`]s keyed by uppercase column name,
//! each step rewrites values in place, and [`build_frame`] turns the result
//! back into a typed Polars frame in domain variable order.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{Column, DataFrame, PolarsResult};
use sdtm_common::{column_strings, float_column, int_column, parse_f64, string_column};
use sdtm_model::{Domain, Variable};

use crate::error::{Result, TransformError};

/// A raw source table with every cell read as a trimmed string.
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    names: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Reads a raw frame. Column names must be unique ignoring case.
    pub fn from_frame(domain: &str, df: &DataFrame) -> Result<Self> {
        let malformed = |message: String| TransformError::MalformedRaw {
            domain: domain.to_string(),
            message,
        };
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        if names.is_empty() {
            return Err(malformed("raw table has no columns".to_string()));
        }

        let mut seen = BTreeSet::new();
        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            let header = name.trim().to_ascii_uppercase();
            if header.is_empty() {
                return Err(malformed("raw table has an unnamed column".to_string()));
            }
            if !seen.insert(header.clone()) {
                return Err(malformed(format!("duplicate column {header}")));
            }
            columns.push(column_strings(df, name)?);
        }

        let rows = (0..df.height())
            .map(|idx| columns.iter().map(|column| column[idx].clone()).collect())
            .collect();
        let names: Vec<String> = names.iter().map(|name| name.trim().to_string()).collect();
        let headers = names.iter().map(|name| name.to_ascii_uppercase()).collect();
        Ok(Self {
            headers,
            names,
            rows,
        })
    }

    /// Uppercase column names in source order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Column name as spelled in the source.
    pub fn source_name(&self, idx: usize) -> &str {
        self.names.get(idx).map_or("", String::as_str)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h.eq_ignore_ascii_case(name))
    }

    /// One record per row carrying every source column.
    pub fn into_record_set(self) -> RecordSet {
        let records = self
            .rows
            .into_iter()
            .enumerate()
            .map(|(order, row)| {
                let mut record = WorkRecord::new(order);
                for (header, value) in self.headers.iter().zip(row) {
                    record.set(header, value);
                }
                record
            })
            .collect();
        RecordSet::new(records, self.headers)
    }
}

/// One observation while it is being derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkRecord {
    /// Position in the input, before any sorting.
    pub order: usize,
    values: BTreeMap<String, String>,
}

impl WorkRecord {
    pub fn new(order: usize) -> Self {
        Self {
            order,
            values: BTreeMap::new(),
        }
    }

    /// Value of a column; absent columns read as empty.
    pub fn get(&self, name: &str) -> &str {
        self.values
            .get(&name.to_ascii_uppercase())
            .map_or("", String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_ascii_uppercase(), value.into());
    }
}

/// Working records plus the set of columns they carry.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub records: Vec<WorkRecord>,
    columns: BTreeSet<String>,
}

impl RecordSet {
    pub fn new<I, S>(records: Vec<WorkRecord>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            records,
            columns: columns
                .into_iter()
                .map(|c| c.as_ref().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(&name.to_ascii_uppercase())
    }

    /// Marks a derived column as emitted.
    pub fn add_column(&mut self, name: &str) {
        self.columns.insert(name.to_ascii_uppercase());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Builds the output frame: domain variables present in the record set, in
/// variable order. Source columns outside the domain are dropped.
pub fn build_frame(domain: &Domain, set: &RecordSet) -> PolarsResult<DataFrame> {
    let columns: Vec<Column> = domain
        .variables
        .iter()
        .filter(|variable| set.has_column(&variable.name))
        .map(|variable| typed_column(domain, variable, &set.records))
        .collect();
    DataFrame::new(columns)
}

/// A zero-row frame with every domain variable, for domains whose derivation failed.
pub fn empty_frame(domain: &Domain) -> PolarsResult<DataFrame> {
    let set = RecordSet::new(Vec::new(), domain.variables.iter().map(|v| v.name.as_str()));
    build_frame(domain, &set)
}

fn typed_column(domain: &Domain, variable: &Variable, records: &[WorkRecord]) -> Column {
    let name = variable.name.as_str();
    if is_integer_variable(domain, name) {
        let values = records
            .iter()
            .map(|record| record.get(name).parse::<i64>().ok())
            .collect();
        int_column(name, values)
    } else if variable.is_numeric() {
        let values = records
            .iter()
            .map(|record| parse_f64(record.get(name)))
            .collect();
        float_column(name, values)
    } else {
        let values = records
            .iter()
            .map(|record| record.get(name).to_string())
            .collect();
        string_column(name, values)
    }
}

/// --SEQ and --DY are whole numbers; other numeric variables are floats.
fn is_integer_variable(domain: &Domain, name: &str) -> bool {
    domain.seq_variable() == Some(name) || domain.study_days.iter().any(|pair| pair.day == name)
}

#[cfg(test)]
mod tests {
    use sdtm_standards::DomainRegistry;

    use super::*;

    fn raw(columns: Vec<Column>) -> DataFrame {
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn rejects_case_insensitive_duplicates() {
        let df = raw(vec![
            string_column("usubjid", vec!["A".to_string()]),
            string_column("USUBJID", vec!["B".to_string()]),
        ]);
        let err = RawTable::from_frame("AE", &df).unwrap_err();
        assert!(err.to_string().contains("duplicate column USUBJID"));
    }

    #[test]
    fn builds_typed_columns_in_variable_order() {
        let registry = DomainRegistry::builtin();
        let ae = registry.domain("AE").unwrap();
        let mut record = WorkRecord::new(0);
        record.set("AETERM", "HEADACHE");
        record.set("AESEQ", "1");
        record.set("USUBJID", "S-1");
        record.set("AESTDY", "-3");
        record.set("EXTRA", "dropped");
        let set = RecordSet::new(vec![record], ["AETERM", "AESEQ", "USUBJID", "AESTDY", "EXTRA"]);

        let df = build_frame(ae, &set).unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["USUBJID", "AESEQ", "AETERM", "AESTDY"]);
        assert_eq!(df.column("AESEQ").unwrap().i64().unwrap().get(0), Some(1));
        assert_eq!(df.column("AESTDY").unwrap().i64().unwrap().get(0), Some(-3));
    }

    #[test]
    fn empty_frame_has_every_variable() {
        let registry = DomainRegistry::builtin();
        let vs = registry.domain("VS").unwrap();
        let df = empty_frame(vs).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), vs.variables.len());
    }
}
