//! Findings wide-to-long reshaping.

use std::collections::BTreeMap;

use sdtm_common::is_missing;
use sdtm_model::{DerivationOptions, Domain, RuleId, TestCodeResolution};
use sdtm_standards::{TestLookup, normalize_test_key};

use crate::issue::Issue;
use crate::records::{RawTable, RecordSet, WorkRecord};

/// Unit column suffixes, longest first so `GLUCUNITS` does not stop at `U`.
const UNIT_SUFFIXES: [&str; 3] = ["UNITS", "UNIT", "U"];

/// A source table is vertical when it already carries `<DOMAIN>TESTCD`.
pub fn is_vertical(table: &RawTable, domain: &Domain) -> bool {
    table.has_column(&domain.prefixed("TESTCD"))
}

#[derive(Debug)]
struct TestColumn {
    index: usize,
    resolution: TestCodeResolution,
    unit_index: Option<usize>,
}

/// Splits headers into base columns (copied onto every result record) and
/// test columns (one result record per non-missing cell).
fn classify_columns(
    table: &RawTable,
    domain: &Domain,
    lookup: &TestLookup,
    options: &DerivationOptions,
) -> (Vec<usize>, Vec<TestColumn>) {
    let is_base = |header: &str| {
        header == "USUBJID"
            || options
                .subject_key_fields
                .iter()
                .any(|field| field.eq_ignore_ascii_case(header))
            || domain.has_variable(header)
    };

    let mut base = Vec::new();
    let mut candidates: Vec<(usize, String)> = Vec::new();
    for (index, header) in table.headers().iter().enumerate() {
        if is_base(header) {
            base.push(index);
        } else {
            candidates.push((index, normalize_test_key(header)));
        }
    }

    let keys: BTreeMap<&str, usize> = candidates
        .iter()
        .map(|(index, key)| (key.as_str(), *index))
        .collect();
    let mut units: BTreeMap<usize, usize> = BTreeMap::new();
    for (index, key) in &candidates {
        let test_index = UNIT_SUFFIXES.iter().find_map(|suffix| {
            key.strip_suffix(suffix)
                .filter(|stem| !stem.is_empty())
                .and_then(|stem| keys.get(stem).copied())
                .filter(|test_index| test_index != index)
        });
        if let Some(test_index) = test_index {
            units.insert(*index, test_index);
        }
    }

    let tests = candidates
        .iter()
        .filter(|(index, _)| !units.contains_key(index))
        .map(|(index, _)| TestColumn {
            index: *index,
            resolution: lookup.resolve(table.source_name(*index)),
            unit_index: units
                .iter()
                .find(|(_, test_index)| *test_index == index)
                .map(|(unit_index, _)| *unit_index),
        })
        .collect();
    (base, tests)
}

/// Reshapes a horizontal Findings table into one record per test result.
///
/// Each non-missing test cell becomes a record carrying the row's base
/// columns plus --TESTCD, --TEST, --CAT, --ORRES and --ORRESU. Columns with
/// no lookup entry get a synthesized code and one review issue each.
pub fn reshape_findings(
    table: RawTable,
    domain: &Domain,
    lookup: &TestLookup,
    options: &DerivationOptions,
) -> (RecordSet, Vec<Issue>) {
    let (base, tests) = classify_columns(&table, domain, lookup, options);
    let testcd = domain.prefixed("TESTCD");
    let test = domain.prefixed("TEST");
    let cat = domain.prefixed("CAT");
    let orres = domain.prefixed("ORRES");
    let orresu = domain.prefixed("ORRESU");

    let issues = tests
        .iter()
        .filter(|column| column.resolution.needs_review())
        .map(|column| {
            Issue::table(
                RuleId::UnknownTestCode,
                format!(
                    "column '{}' has no test lookup entry; test code {} was synthesized",
                    table.source_name(column.index),
                    column.resolution.code()
                ),
            )
            .on(&testcd)
        })
        .collect();

    let headers = table.headers();
    let mut records = Vec::new();
    let mut has_units = false;
    let mut has_category = false;
    for row in table.rows() {
        for column in &tests {
            let cell = &row[column.index];
            if is_missing(cell) {
                continue;
            }
            let mut record = WorkRecord::new(records.len());
            for index in &base {
                record.set(&headers[*index], row[*index].as_str());
            }
            record.set(&testcd, column.resolution.code());
            record.set(&test, column.resolution.name());
            if let Some(category) = column
                .resolution
                .definition()
                .and_then(|d| d.category.as_deref())
            {
                record.set(&cat, category);
                has_category = true;
            }
            record.set(&orres, cell.as_str());
            if let Some(unit_index) = column.unit_index {
                record.set(&orresu, row[unit_index].as_str());
                has_units = true;
            }
            records.push(record);
        }
    }

    let mut columns: Vec<&str> = base.iter().map(|index| headers[*index].as_str()).collect();
    columns.extend([testcd.as_str(), test.as_str(), orres.as_str()]);
    if has_category {
        columns.push(&cat);
    }
    if has_units {
        columns.push(&orresu);
    }
    (RecordSet::new(records, columns), issues)
}

/// Fills --TEST and --CAT from the lookup for vertical records that carry
/// only a test code.
pub fn complete_test_names(set: &mut RecordSet, domain: &Domain, lookup: &TestLookup) {
    let testcd = domain.prefixed("TESTCD");
    if !set.has_column(&testcd) {
        return;
    }
    let test = domain.prefixed("TEST");
    let cat = domain.prefixed("CAT");
    let mut filled_category = false;
    for record in &mut set.records {
        let Some(definition) = lookup.get(record.get(&testcd)).cloned() else {
            continue;
        };
        if record.get(&test).is_empty() {
            record.set(&test, definition.name);
        }
        if record.get(&cat).is_empty()
            && let Some(category) = definition.category
        {
            record.set(&cat, category);
            filled_category = true;
        }
    }
    set.add_column(&test);
    if filled_category {
        set.add_column(&cat);
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::DataFrame;
    use sdtm_common::string_column;
    use sdtm_standards::DomainRegistry;

    use super::*;

    fn table(columns: &[(&str, Vec<&str>)]) -> RawTable {
        let df = DataFrame::new(
            columns
                .iter()
                .map(|(name, values)| {
                    string_column(name, values.iter().map(|v| (*v).to_string()).collect())
                })
                .collect(),
        )
        .unwrap();
        RawTable::from_frame("LB", &df).unwrap()
    }

    #[test]
    fn unit_columns_attach_to_their_test() {
        let registry = DomainRegistry::builtin();
        let lb = registry.domain("LB").unwrap();
        let raw = table(&[
            ("SUBJID", vec!["001"]),
            ("Glucose", vec!["95"]),
            ("Glucose_Unit", vec!["mg/dL"]),
            ("HGBU", vec!["g/dL"]),
            ("HGB", vec!["13.1"]),
        ]);

        let (set, issues) = reshape_findings(raw, lb, registry.test_lookup("LB").unwrap(), &DerivationOptions::new());

        assert!(issues.is_empty());
        let results: Vec<(&str, &str, &str)> = set
            .records
            .iter()
            .map(|r| (r.get("LBTESTCD"), r.get("LBORRES"), r.get("LBORRESU")))
            .collect();
        assert_eq!(results, vec![("GLUC", "95", "mg/dL"), ("HGB", "13.1", "g/dL")]);
        assert_eq!(set.records[0].get("LBCAT"), "CHEMISTRY");
    }

    #[test]
    fn unknown_columns_are_synthesized_once() {
        let registry = DomainRegistry::builtin();
        let lb = registry.domain("LB").unwrap();
        let raw = table(&[
            ("SUBJID", vec!["001", "002"]),
            ("Ferritin level", vec!["40", "55"]),
        ]);

        let (set, issues) = reshape_findings(raw, lb, registry.test_lookup("LB").unwrap(), &DerivationOptions::new());

        assert_eq!(set.len(), 2);
        assert_eq!(set.records[1].get("LBTESTCD"), "FERRITIN");
        assert_eq!(set.records[1].get("LBTEST"), "Ferritin level");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, RuleId::UnknownTestCode);
    }
}
