//! Test-code lookup and unit conversion types for Findings domains.

use serde::{Deserialize, Serialize};

/// A known test in a Findings domain lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDefinition {
    /// Short test code (--TESTCD), at most 8 characters.
    pub code: String,
    /// Test name (--TEST).
    pub name: String,
    pub category: Option<String>,
    /// Unit results are converted to for --STRESN/--STRESU.
    pub standard_unit: Option<String>,
}

impl TestDefinition {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            category: None,
            standard_unit: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_standard_unit(mut self, unit: &str) -> Self {
        self.standard_unit = Some(unit.to_string());
        self
    }
}

/// Multiplicative conversion of a test result between two units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversion {
    pub test_code: String,
    pub from_unit: String,
    pub to_unit: String,
    pub factor: f64,
}

impl UnitConversion {
    pub fn new(test_code: &str, from_unit: &str, to_unit: &str, factor: f64) -> Self {
        Self {
            test_code: test_code.to_string(),
            from_unit: from_unit.to_string(),
            to_unit: to_unit.to_string(),
            factor,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        value * self.factor
    }
}

/// Outcome of resolving a wide-format column name to a test code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCodeResolution {
    /// The column matched a lookup table entry.
    Known(TestDefinition),
    /// No entry matched; the code was synthesized and needs review.
    Synthesized { code: String, source_column: String },
}

impl TestCodeResolution {
    pub fn code(&self) -> &str {
        match self {
            TestCodeResolution::Known(test) => &test.code,
            TestCodeResolution::Synthesized { code, .. } => code,
        }
    }

    /// Test name; synthesized codes reuse the source column header.
    pub fn name(&self) -> &str {
        match self {
            TestCodeResolution::Known(test) => &test.name,
            TestCodeResolution::Synthesized { source_column, .. } => source_column,
        }
    }

    pub fn definition(&self) -> Option<&TestDefinition> {
        match self {
            TestCodeResolution::Known(test) => Some(test),
            TestCodeResolution::Synthesized { .. } => None,
        }
    }

    pub fn needs_review(&self) -> bool {
        matches!(self, TestCodeResolution::Synthesized { .. })
    }
}
