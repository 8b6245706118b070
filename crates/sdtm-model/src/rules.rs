//! Rule identifiers for derivation and conformance defects.
//!
//! Each rule carries a fixed severity. Vocabulary violations are split into
//! two rules so that closed and extensible codelists keep distinct
//! severities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defect::Severity;
use crate::error::ModelError;

/// Conformance layer a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Structural,
    Vocabulary,
    CrossTable,
    Temporal,
}

impl Layer {
    pub const ALL: [Layer; 4] = [
        Layer::Structural,
        Layer::Vocabulary,
        Layer::CrossTable,
        Layer::Temporal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Structural => "structural",
            Layer::Vocabulary => "vocabulary",
            Layer::CrossTable => "cross_table",
            Layer::Temporal => "temporal",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RuleId {
    // Structural
    RequiredVariableMissing,
    KeyValueMissing,
    DuplicateSequence,
    DuplicateSubject,
    InvalidIsoDate,
    ExpectedVariableMissing,
    // Vocabulary
    ClosedTermNotInCodelist,
    ExtensibleTermNotInCodelist,
    // Cross-table
    SubjectNotInDm,
    StudyIdMismatch,
    VisitNotInSchedule,
    // Temporal
    EndBeforeStart,
    MultipleBaseline,
    InvalidBaselineFlag,
    AfterEndOfParticipation,
    StudyDayZero,
    // Derivation
    SubjectKeyIncomplete,
    UnparseableDate,
    UnknownTestCode,
    NoUnitConversion,
    DerivationFailed,
}

impl RuleId {
    pub const ALL: [RuleId; 21] = [
        RuleId::RequiredVariableMissing,
        RuleId::KeyValueMissing,
        RuleId::DuplicateSequence,
        RuleId::DuplicateSubject,
        RuleId::InvalidIsoDate,
        RuleId::ExpectedVariableMissing,
        RuleId::ClosedTermNotInCodelist,
        RuleId::ExtensibleTermNotInCodelist,
        RuleId::SubjectNotInDm,
        RuleId::StudyIdMismatch,
        RuleId::VisitNotInSchedule,
        RuleId::EndBeforeStart,
        RuleId::MultipleBaseline,
        RuleId::InvalidBaselineFlag,
        RuleId::AfterEndOfParticipation,
        RuleId::StudyDayZero,
        RuleId::SubjectKeyIncomplete,
        RuleId::UnparseableDate,
        RuleId::UnknownTestCode,
        RuleId::NoUnitConversion,
        RuleId::DerivationFailed,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            RuleId::RequiredVariableMissing => "STR001",
            RuleId::KeyValueMissing => "STR002",
            RuleId::DuplicateSequence => "STR003",
            RuleId::DuplicateSubject => "STR004",
            RuleId::InvalidIsoDate => "STR005",
            RuleId::ExpectedVariableMissing => "STR006",
            RuleId::ClosedTermNotInCodelist => "VOC001",
            RuleId::ExtensibleTermNotInCodelist => "VOC002",
            RuleId::SubjectNotInDm => "XTB001",
            RuleId::StudyIdMismatch => "XTB002",
            RuleId::VisitNotInSchedule => "XTB003",
            RuleId::EndBeforeStart => "TMP001",
            RuleId::MultipleBaseline => "TMP002",
            RuleId::InvalidBaselineFlag => "TMP003",
            RuleId::AfterEndOfParticipation => "TMP004",
            RuleId::StudyDayZero => "TMP005",
            RuleId::SubjectKeyIncomplete => "DRV001",
            RuleId::UnparseableDate => "DRV002",
            RuleId::UnknownTestCode => "DRV003",
            RuleId::NoUnitConversion => "DRV004",
            RuleId::DerivationFailed => "DRV005",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RuleId::ExpectedVariableMissing
            | RuleId::ExtensibleTermNotInCodelist
            | RuleId::AfterEndOfParticipation
            | RuleId::UnparseableDate
            | RuleId::UnknownTestCode => Severity::Advisory,
            RuleId::NoUnitConversion => Severity::Informational,
            _ => Severity::Blocking,
        }
    }

    /// Conformance layer, or `None` for derivation-time rules.
    pub fn layer(&self) -> Option<Layer> {
        match self {
            RuleId::RequiredVariableMissing
            | RuleId::KeyValueMissing
            | RuleId::DuplicateSequence
            | RuleId::DuplicateSubject
            | RuleId::InvalidIsoDate
            | RuleId::ExpectedVariableMissing => Some(Layer::Structural),
            RuleId::ClosedTermNotInCodelist | RuleId::ExtensibleTermNotInCodelist => {
                Some(Layer::Vocabulary)
            }
            RuleId::SubjectNotInDm | RuleId::StudyIdMismatch | RuleId::VisitNotInSchedule => {
                Some(Layer::CrossTable)
            }
            RuleId::EndBeforeStart
            | RuleId::MultipleBaseline
            | RuleId::InvalidBaselineFlag
            | RuleId::AfterEndOfParticipation
            | RuleId::StudyDayZero => Some(Layer::Temporal),
            RuleId::SubjectKeyIncomplete
            | RuleId::UnparseableDate
            | RuleId::UnknownTestCode
            | RuleId::NoUnitConversion
            | RuleId::DerivationFailed => None,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RuleId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        RuleId::ALL
            .iter()
            .copied()
            .find(|rule| rule.code() == code)
            .ok_or_else(|| ModelError::UnknownRule(s.to_string()))
    }
}

impl From<RuleId> for String {
    fn from(rule: RuleId) -> Self {
        rule.code().to_string()
    }
}

impl TryFrom<String> for RuleId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
