use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::RuleId;

/// Ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Prevents submission readiness.
    Blocking,
    /// Reported for review; does not block.
    Advisory,
    /// Recorded for traceability only.
    Informational,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Blocking => "Blocking",
            Severity::Advisory => "Advisory",
            Severity::Informational => "Informational",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies an affected record within a produced table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    /// Zero-based row index in the produced table.
    pub row: usize,
    pub usubjid: Option<String>,
    pub seq: Option<i64>,
}

impl RecordKey {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            usubjid: None,
            seq: None,
        }
    }

    pub fn with_subject(mut self, usubjid: &str) -> Self {
        if !usubjid.is_empty() {
            self.usubjid = Some(usubjid.to_string());
        }
        self
    }

    pub fn with_seq(mut self, seq: i64) -> Self {
        self.seq = Some(seq);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defect {
    pub rule_id: RuleId,
    pub severity: Severity,
    pub domain: String,
    pub variable: Option<String>,
    pub records: Vec<RecordKey>,
    pub message: String,
}

impl Defect {
    /// Creates a defect with the rule's fixed severity.
    pub fn new(rule_id: RuleId, domain: &str, message: impl Into<String>) -> Self {
        Self {
            rule_id,
            severity: rule_id.severity(),
            domain: domain.to_string(),
            variable: None,
            records: Vec::new(),
            message: message.into(),
        }
    }

    pub fn with_variable(mut self, variable: &str) -> Self {
        self.variable = Some(variable.to_string());
        self
    }

    pub fn with_record(mut self, record: RecordKey) -> Self {
        self.records.push(record);
        self
    }

    pub fn with_records(mut self, records: Vec<RecordKey>) -> Self {
        self.records = records;
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }

    pub fn first_row(&self) -> Option<usize> {
        self.records.iter().map(|r| r.row).min()
    }

    /// Total order used to make defect lists reproducible.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.severity
            .cmp(&other.severity)
            .then_with(|| self.domain.cmp(&other.domain))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then_with(|| self.first_row().cmp(&other.first_row()))
            .then_with(|| self.variable.cmp(&other.variable))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.records.cmp(&other.records))
    }
}

/// Sorts defects into their canonical order.
pub fn sort_defects(defects: &mut [Defect]) {
    defects.sort_by(Defect::canonical_cmp);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectCounts {
    pub blocking: usize,
    pub advisory: usize,
    pub informational: usize,
}

impl DefectCounts {
    pub fn from_defects(defects: &[Defect]) -> Self {
        let mut counts = Self::default();
        for defect in defects {
            match defect.severity {
                Severity::Blocking => counts.blocking += 1,
                Severity::Advisory => counts.advisory += 1,
                Severity::Informational => counts.informational += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.blocking + self.advisory + self.informational
    }
}
