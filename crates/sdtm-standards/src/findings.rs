//! Test-code lookup tables and unit conversions for Findings domains.

use std::collections::BTreeMap;

use sdtm_model::{TestCodeResolution, TestDefinition, UnitConversion};

/// Maximum length of a --TESTCD value (SDTMIG v3.4 Section 4.5.3.1).
pub const TEST_CODE_MAX_LEN: usize = 8;

/// Uppercases a header and keeps only ASCII letters and digits.
///
/// `"Blood Glucose"`, `"blood_glucose"` and `"BLOODGLUCOSE"` share a key.
pub fn normalize_test_key(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Fallback test code for a header with no lookup entry: the normalized
/// header truncated to eight characters, or `UNKNOWN` when no letter or
/// digit is left.
pub fn synthesize_test_code(name: &str) -> String {
    let mut key = normalize_test_key(name);
    if key.is_empty() {
        return "UNKNOWN".to_string();
    }
    key.truncate(TEST_CODE_MAX_LEN);
    key
}

/// Lookup table of known tests for one Findings domain.
#[derive(Debug, Clone, Default)]
pub struct TestLookup {
    tests: Vec<TestDefinition>,
    keys: BTreeMap<String, usize>,
}

impl TestLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a test reachable by its code, its name and any aliases.
    pub fn insert(&mut self, test: TestDefinition, aliases: &[&str]) {
        let idx = self.tests.len();
        let mut names = vec![test.code.as_str(), test.name.as_str()];
        names.extend_from_slice(aliases);
        for name in names {
            self.keys.entry(normalize_test_key(name)).or_insert(idx);
        }
        self.tests.push(test);
    }

    pub fn with_test(mut self, test: TestDefinition, aliases: &[&str]) -> Self {
        self.insert(test, aliases);
        self
    }

    pub fn tests(&self) -> &[TestDefinition] {
        &self.tests
    }

    /// Looks a test up by code, name or alias.
    pub fn get(&self, name: &str) -> Option<&TestDefinition> {
        self.keys
            .get(&normalize_test_key(name))
            .and_then(|idx| self.tests.get(*idx))
    }

    /// Resolves a wide-format column header to a test code.
    pub fn resolve(&self, column: &str) -> TestCodeResolution {
        match self.get(column) {
            Some(test) => TestCodeResolution::Known(test.clone()),
            None => TestCodeResolution::Synthesized {
                code: synthesize_test_code(column),
                source_column: column.to_string(),
            },
        }
    }
}

pub fn lb_tests() -> TestLookup {
    TestLookup::new()
        .with_test(
            TestDefinition::new("GLUC", "Glucose")
                .with_category("CHEMISTRY")
                .with_standard_unit("mmol/L"),
            &["Blood Glucose", "GLU"],
        )
        .with_test(
            TestDefinition::new("HGB", "Hemoglobin")
                .with_category("HEMATOLOGY")
                .with_standard_unit("g/L"),
            &["HB", "Haemoglobin"],
        )
        .with_test(
            TestDefinition::new("ALT", "Alanine Aminotransferase")
                .with_category("CHEMISTRY")
                .with_standard_unit("U/L"),
            &["SGPT"],
        )
        .with_test(
            TestDefinition::new("AST", "Aspartate Aminotransferase")
                .with_category("CHEMISTRY")
                .with_standard_unit("U/L"),
            &["SGOT"],
        )
        .with_test(
            TestDefinition::new("CREAT", "Creatinine")
                .with_category("CHEMISTRY")
                .with_standard_unit("umol/L"),
            &["Serum Creatinine"],
        )
        .with_test(
            TestDefinition::new("WBC", "Leukocytes")
                .with_category("HEMATOLOGY")
                .with_standard_unit("10^9/L"),
            &["White Blood Cells", "White Blood Cell Count"],
        )
        .with_test(
            TestDefinition::new("PLAT", "Platelets")
                .with_category("HEMATOLOGY")
                .with_standard_unit("10^9/L"),
            &["PLT", "Platelet Count"],
        )
        .with_test(
            TestDefinition::new("SODIUM", "Sodium")
                .with_category("CHEMISTRY")
                .with_standard_unit("mmol/L"),
            &["NA"],
        )
}

pub fn vs_tests() -> TestLookup {
    TestLookup::new()
        .with_test(
            TestDefinition::new("SYSBP", "Systolic Blood Pressure").with_standard_unit("mmHg"),
            &["SBP", "Systolic", "Systolic BP"],
        )
        .with_test(
            TestDefinition::new("DIABP", "Diastolic Blood Pressure").with_standard_unit("mmHg"),
            &["DBP", "Diastolic", "Diastolic BP"],
        )
        .with_test(
            TestDefinition::new("PULSE", "Pulse Rate").with_standard_unit("beats/min"),
            &["HR", "Heart Rate"],
        )
        .with_test(
            TestDefinition::new("TEMP", "Temperature").with_standard_unit("C"),
            &["Body Temperature"],
        )
        .with_test(
            TestDefinition::new("WEIGHT", "Weight").with_standard_unit("kg"),
            &["WT", "Body Weight"],
        )
        .with_test(
            TestDefinition::new("HEIGHT", "Height").with_standard_unit("cm"),
            &["HT"],
        )
        .with_test(
            TestDefinition::new("RESP", "Respiratory Rate").with_standard_unit("breaths/min"),
            &["RR"],
        )
}

/// Conversions into each test's standard unit.
pub fn unit_conversions() -> Vec<UnitConversion> {
    vec![
        UnitConversion::new("GLUC", "mg/dL", "mmol/L", 0.0555),
        UnitConversion::new("HGB", "g/dL", "g/L", 10.0),
        UnitConversion::new("CREAT", "mg/dL", "umol/L", 88.42),
        UnitConversion::new("WEIGHT", "LB", "kg", 0.45359237),
        UnitConversion::new("HEIGHT", "IN", "cm", 2.54),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_test_key("Blood Glucose"), "BLOODGLUCOSE");
        assert_eq!(normalize_test_key("sys_bp (mmHg)"), "SYSBPMMHG");
    }

    #[test]
    fn synthesizes_truncated_codes() {
        assert_eq!(synthesize_test_code("Ferritin level"), "FERRITIN");
        assert_eq!(synthesize_test_code("ck"), "CK");
        assert_eq!(synthesize_test_code("25-OH Vitamin D"), "25OHVITA");
        assert_eq!(synthesize_test_code("%%"), "UNKNOWN");
    }

    #[test]
    fn resolves_by_alias() {
        let lookup = vs_tests();
        assert_eq!(lookup.resolve("Heart Rate").code(), "PULSE");
        assert_eq!(lookup.resolve("sbp").code(), "SYSBP");
        assert!(lookup.resolve("Oxygen Saturation").needs_review());
    }
}
