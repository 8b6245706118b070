//! Conformance layers.
//!
//! Each layer reads the same table views and returns a [`LayerOutcome`].
//! Only checks of blocking rules count toward the layer score; advisory
//! rules still emit defects.

pub mod cross_table;
pub mod structural;
pub mod temporal;
pub mod vocabulary;

use polars::prelude::{DataFrame, PolarsResult};
use sdtm_common::{column_i64s, column_strings};
use sdtm_model::{CaseInsensitiveSet, Defect, Domain, Layer, RecordKey, RuleId, Severity};
use sdtm_transform::DomainFrame;

/// Result of evaluating one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerOutcome {
    pub layer: Layer,
    pub checked: usize,
    pub passed: usize,
    pub defects: Vec<Defect>,
}

impl LayerOutcome {
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            checked: 0,
            passed: 0,
            defects: Vec::new(),
        }
    }

    /// Records one check of `rule`. The defect is only built on failure.
    pub fn evaluate(&mut self, rule: RuleId, ok: bool, defect: impl FnOnce() -> Defect) {
        self.tally(rule, 1, usize::from(!ok));
        if !ok {
            self.defects.push(defect());
        }
    }

    /// Records `checked` checks of `rule`, `failed` of which failed.
    pub fn tally(&mut self, rule: RuleId, checked: usize, failed: usize) {
        if rule.severity() == Severity::Blocking {
            self.checked += checked;
            self.passed += checked.saturating_sub(failed);
        }
    }

    pub fn push(&mut self, defect: Defect) {
        self.defects.push(defect);
    }

    pub fn score(&self) -> f64 {
        if self.checked == 0 {
            return 100.0;
        }
        self.passed as f64 / self.checked as f64 * 100.0
    }
}

/// A produced table paired with its domain metadata.
#[derive(Debug)]
pub struct TableView<'a> {
    pub domain: &'a Domain,
    pub data: &'a DataFrame,
    columns: CaseInsensitiveSet,
    subjects: Vec<String>,
    seqs: Vec<Option<i64>>,
}

impl<'a> TableView<'a> {
    pub fn new(domain: &'a Domain, frame: &'a DomainFrame) -> PolarsResult<Self> {
        let data = &frame.data;
        let columns = CaseInsensitiveSet::new(data.get_column_names().iter().map(|n| n.as_str()));
        let subjects = match columns.get("USUBJID") {
            Some(name) => column_strings(data, name)?,
            None => vec![String::new(); data.height()],
        };
        let seqs = match domain.seq_variable().and_then(|seq| columns.get(seq)) {
            Some(name) => column_i64s(data, name)?,
            None => vec![None; data.height()],
        };
        Ok(Self {
            domain,
            data,
            columns,
            subjects,
            seqs,
        })
    }

    pub fn code(&self) -> &str {
        &self.domain.code
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn has(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Column values as trimmed strings, or `None` when the column is absent.
    pub fn strings(&self, name: &str) -> PolarsResult<Option<Vec<String>>> {
        match self.columns.get(name) {
            Some(column) => column_strings(self.data, column).map(Some),
            None => Ok(None),
        }
    }

    /// Column values as integers, or `None` when the column is absent.
    pub fn integers(&self, name: &str) -> PolarsResult<Option<Vec<Option<i64>>>> {
        match self.columns.get(name) {
            Some(column) => column_i64s(self.data, column).map(Some),
            None => Ok(None),
        }
    }

    pub fn subject(&self, row: usize) -> &str {
        self.subjects.get(row).map_or("", String::as_str)
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn record(&self, row: usize) -> RecordKey {
        let key = RecordKey::new(row).with_subject(self.subject(row));
        match self.seqs.get(row).copied().flatten() {
            Some(seq) => key.with_seq(seq),
            None => key,
        }
    }

    pub fn defect(&self, rule: RuleId, message: impl Into<String>) -> Defect {
        Defect::new(rule, self.code(), message)
    }
}

/// The DM view, if DM was produced.
pub(crate) fn demographics<'v, 'a>(views: &'v [TableView<'a>]) -> Option<&'v TableView<'a>> {
    views.iter().find(|view| view.code() == "DM")
}
