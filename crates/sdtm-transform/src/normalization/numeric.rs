//! Findings result standardization (--STRESC, --STRESN, --STRESU).

use sdtm_common::{format_numeric, parse_f64};
use sdtm_model::{Domain, RuleId};
use sdtm_standards::DomainRegistry;

use crate::issue::Issue;
use crate::records::RecordSet;

/// A numeric result expressed in a test's standard unit.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardResult {
    pub value: f64,
    pub unit: String,
}

/// Converts a numeric result into `standard_unit`.
///
/// A result already in the standard unit is returned unchanged, so converting
/// an already standardized result is a no-op. `None` when the registry has no
/// factor for the unit pair.
pub fn to_standard_unit(
    registry: &DomainRegistry,
    test_code: &str,
    value: f64,
    unit: &str,
    standard_unit: &str,
) -> Option<StandardResult> {
    if unit.trim().eq_ignore_ascii_case(standard_unit) {
        return Some(StandardResult {
            value,
            unit: standard_unit.to_string(),
        });
    }
    registry
        .conversion(test_code, unit.trim(), standard_unit)
        .map(|conversion| StandardResult {
            value: round_result(conversion.apply(value)),
            unit: standard_unit.to_string(),
        })
}

fn round_result(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Fills standard result variables from --ORRES and --ORRESU.
///
/// Numeric results are converted to the test's standard unit when the
/// registry knows one; non-numeric results only populate --STRESC. Records
/// that already carry a --STRESC from the source are left as collected.
pub fn standardize_results(set: &mut RecordSet, domain: &Domain, registry: &DomainRegistry) -> Vec<Issue> {
    let orres = domain.prefixed("ORRES");
    if !domain.has_variable(&orres) || !set.has_column(&orres) {
        return Vec::new();
    }
    let orresu = domain.prefixed("ORRESU");
    let testcd = domain.prefixed("TESTCD");
    let stresc = domain.prefixed("STRESC");
    let stresn = domain.prefixed("STRESN");
    let stresu = domain.prefixed("STRESU");
    let lookup = registry.test_lookup(&domain.code);
    let source_standard = set.has_column(&stresc);

    let mut issues = Vec::new();
    for record in &mut set.records {
        let result = record.get(&orres).to_string();
        if result.is_empty() || (source_standard && !record.get(&stresc).is_empty()) {
            continue;
        }
        let Some(value) = parse_f64(&result) else {
            record.set(&stresc, result);
            record.set(&stresn, "");
            record.set(&stresu, "");
            continue;
        };

        let unit = record.get(&orresu).to_string();
        let test_code = record.get(&testcd).to_string();
        let standard_unit = lookup
            .and_then(|lookup| lookup.get(&test_code))
            .and_then(|test| test.standard_unit.as_deref());
        let standard = match standard_unit {
            Some(target) if !unit.is_empty() => {
                to_standard_unit(registry, &test_code, value, &unit, target).unwrap_or_else(|| {
                    issues.push(
                        Issue::record(
                            RuleId::NoUnitConversion,
                            record.order,
                            format!("no conversion for {test_code} from {unit} to {target}"),
                        )
                        .on(&stresu),
                    );
                    StandardResult {
                        value,
                        unit: unit.clone(),
                    }
                })
            }
            _ => StandardResult { value, unit },
        };
        let formatted = format_numeric(standard.value);
        record.set(&stresc, formatted.clone());
        record.set(&stresn, formatted);
        record.set(&stresu, standard.unit);
    }

    for name in [&stresc, &stresn, &stresu] {
        if domain.has_variable(name) {
            set.add_column(name);
        }
    }
    issues
}
