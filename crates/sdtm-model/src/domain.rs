use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Dataset class per SDTMIG v3.4 Chapter 2 (Fundamentals of the SDTM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetClass {
    /// Interventions: CM, EX
    Interventions,
    /// Events: AE, DS, MH
    Events,
    /// Findings: LB, VS
    Findings,
    /// Special-Purpose: DM, SE
    SpecialPurpose,
    /// Trial Design: TV
    TrialDesign,
}

impl DatasetClass {
    /// Returns the canonical class name as it appears in SDTMIG documentation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetClass::Interventions => "Interventions",
            DatasetClass::Events => "Events",
            DatasetClass::Findings => "Findings",
            DatasetClass::SpecialPurpose => "Special-Purpose",
            DatasetClass::TrialDesign => "Trial Design",
        }
    }
}

impl fmt::Display for DatasetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DatasetClass {
    type Err = ModelError;

    /// Case-insensitive, with or without hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', " ");
        match normalized.as_str() {
            "INTERVENTIONS" => Ok(DatasetClass::Interventions),
            "EVENTS" => Ok(DatasetClass::Events),
            "FINDINGS" => Ok(DatasetClass::Findings),
            "SPECIAL PURPOSE" => Ok(DatasetClass::SpecialPurpose),
            "TRIAL DESIGN" => Ok(DatasetClass::TrialDesign),
            _ => Err(ModelError::UnknownDatasetClass(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Char,
    Num,
}

/// Core designation of a variable (SDTMIG v3.4 Section 4.1.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoreDesignation {
    /// Must be present and populated for every record.
    #[serde(rename = "Req")]
    Required,
    /// Must be present; may be null.
    #[serde(rename = "Exp")]
    Expected,
    /// Included when collected.
    #[serde(rename = "Perm")]
    Permissible,
}

impl CoreDesignation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoreDesignation::Required => "Req",
            CoreDesignation::Expected => "Exp",
            CoreDesignation::Permissible => "Perm",
        }
    }
}

impl FromStr for CoreDesignation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REQ" | "REQUIRED" => Ok(CoreDesignation::Required),
            "EXP" | "EXPECTED" => Ok(CoreDesignation::Expected),
            "PERM" | "PERMISSIBLE" => Ok(CoreDesignation::Permissible),
            _ => Err(ModelError::UnknownCore(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub label: String,
    pub data_type: VariableType,
    pub core: CoreDesignation,
    pub codelist_code: Option<String>,
    #[serde(default)]
    pub order: u32,
}

impl Variable {
    pub fn new(name: &str, label: &str, data_type: VariableType, core: CoreDesignation) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            data_type,
            core,
            codelist_code: None,
            order: 0,
        }
    }

    /// Bind the variable to a codelist by NCI code.
    pub fn with_codelist(mut self, code: &str) -> Self {
        self.codelist_code = Some(code.to_string());
        self
    }

    pub fn is_numeric(&self) -> bool {
        self.data_type == VariableType::Num
    }

    /// ISO 8601 date/time variables follow the `--DTC` naming rule.
    pub fn is_datetime(&self) -> bool {
        self.name.ends_with("DTC")
    }
}

/// A domain this domain reads from during derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDependency {
    pub domain: String,
    /// Required dependencies must be part of the run; optional ones only order it.
    pub required: bool,
}

/// A start/end pair that must be chronologically ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingPair {
    pub start: String,
    pub end: String,
}

/// A date variable and the study-day variable derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyDayPair {
    pub date: String,
    pub day: String,
}

/// Variables involved in baseline flag selection for a Findings domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineSpec {
    pub test_code: String,
    pub date: String,
    pub status: String,
    pub flag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub code: String,
    pub label: String,
    pub dataset_class: DatasetClass,
    pub variables: Vec<Variable>,
    /// Natural key used for record identity (SDTMIG Section 3.2.1.1).
    pub key_variables: Vec<String>,
    /// Sort order applied before --SEQ assignment, after USUBJID.
    pub sort_key: Vec<String>,
    pub dependencies: Vec<DomainDependency>,
    pub timing_pairs: Vec<TimingPair>,
    pub study_days: Vec<StudyDayPair>,
    /// Date variable used to place records in a trial element.
    pub epoch_anchor: Option<String>,
    pub baseline: Option<BaselineSpec>,
}

impl Domain {
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables
            .iter()
            .find(|variable| variable.name.eq_ignore_ascii_case(name))
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    /// The `<DOMAIN>SEQ` variable, when the domain carries one.
    pub fn seq_variable(&self) -> Option<&str> {
        let expected = format!("{}SEQ", self.code);
        self.variable(&expected).map(|v| v.name.as_str())
    }

    /// Domain-prefixed variable name, e.g. `prefixed("TESTCD")` on LB is `LBTESTCD`.
    pub fn prefixed(&self, suffix: &str) -> String {
        format!("{}{}", self.code, suffix)
    }

    pub fn variables_with_core(&self, core: CoreDesignation) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(move |v| v.core == core)
    }

    pub fn datetime_variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(|v| v.is_datetime())
    }

    pub fn coded_variables(&self) -> impl Iterator<Item = (&Variable, &str)> {
        self.variables
            .iter()
            .filter_map(|v| v.codelist_code.as_deref().map(|code| (v, code)))
    }

    pub fn carries_subjects(&self) -> bool {
        self.has_variable("USUBJID")
    }
}
