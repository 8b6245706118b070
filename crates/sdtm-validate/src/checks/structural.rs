//! Structural completeness: variable presence, key population, sequence and
//! subject uniqueness, ISO 8601 date format.

use std::collections::BTreeMap;

use polars::prelude::PolarsResult;
use sdtm_model::{CoreDesignation, Layer, RuleId};
use sdtm_transform::datetime::is_valid_iso8601;

use super::{LayerOutcome, TableView};

pub fn check(views: &[TableView<'_>]) -> PolarsResult<LayerOutcome> {
    let mut outcome = LayerOutcome::new(Layer::Structural);
    for view in views {
        required_variables(view, &mut outcome);
        expected_variables(view, &mut outcome)?;
        key_values(view, &mut outcome)?;
        sequence_uniqueness(view, &mut outcome);
        if view.code() == "DM" {
            subject_uniqueness(view, &mut outcome);
        }
        iso_dates(view, &mut outcome)?;
    }
    Ok(outcome)
}

fn required_variables(view: &TableView<'_>, outcome: &mut LayerOutcome) {
    for variable in view.domain.variables_with_core(CoreDesignation::Required) {
        outcome.evaluate(RuleId::RequiredVariableMissing, view.has(&variable.name), || {
            view.defect(
                RuleId::RequiredVariableMissing,
                format!("required variable {} is missing", variable.name),
            )
            .with_variable(&variable.name)
        });
    }
}

/// Expected variables must be present and, when the table has rows, populated somewhere.
fn expected_variables(view: &TableView<'_>, outcome: &mut LayerOutcome) -> PolarsResult<()> {
    for variable in view.domain.variables_with_core(CoreDesignation::Expected) {
        let populated = match view.strings(&variable.name)? {
            Some(values) => view.height() == 0 || values.iter().any(|v| !v.is_empty()),
            None => false,
        };
        outcome.evaluate(RuleId::ExpectedVariableMissing, populated, || {
            view.defect(
                RuleId::ExpectedVariableMissing,
                format!("expected variable {} is missing or empty", variable.name),
            )
            .with_variable(&variable.name)
        });
    }
    Ok(())
}

fn key_values(view: &TableView<'_>, outcome: &mut LayerOutcome) -> PolarsResult<()> {
    for key in &view.domain.key_variables {
        let Some(values) = view.strings(key)? else {
            continue;
        };
        let empty: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, value)| value.is_empty())
            .map(|(row, _)| row)
            .collect();
        outcome.tally(RuleId::KeyValueMissing, values.len(), empty.len());
        if !empty.is_empty() {
            outcome.push(
                view.defect(
                    RuleId::KeyValueMissing,
                    format!("{key} is empty in {} record(s)", empty.len()),
                )
                .with_variable(key)
                .with_records(empty.iter().map(|row| view.record(*row)).collect()),
            );
        }
    }
    Ok(())
}

/// Groups rows by key. Rows without a key are skipped.
fn group_rows<K: Ord>(keys: impl Iterator<Item = (usize, Option<K>)>) -> (usize, Vec<Vec<usize>>) {
    let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    let mut total = 0;
    for (row, key) in keys {
        if let Some(key) = key {
            total += 1;
            groups.entry(key).or_default().push(row);
        }
    }
    (total, groups.into_values().collect())
}

/// Each repeat of a key after its first occurrence is one failed check.
fn repeated(groups: &[Vec<usize>]) -> usize {
    groups.iter().map(|rows| rows.len().saturating_sub(1)).sum()
}

fn sequence_uniqueness(view: &TableView<'_>, outcome: &mut LayerOutcome) {
    let Some(seq) = view.domain.seq_variable() else {
        return;
    };
    if !view.has(seq) || !view.has("USUBJID") {
        return;
    }
    let (total, groups) = group_rows((0..view.height()).map(|row| {
        let subject = view.subject(row);
        let key = view
            .record(row)
            .seq
            .filter(|_| !subject.is_empty())
            .map(|value| (subject.to_string(), value));
        (row, key)
    }));
    outcome.tally(RuleId::DuplicateSequence, total, repeated(&groups));
    for rows in groups.iter().filter(|rows| rows.len() > 1) {
        let first = view.record(rows[0]);
        outcome.push(
            view.defect(
                RuleId::DuplicateSequence,
                format!(
                    "{seq} {} is used {} times for {}",
                    first.seq.unwrap_or_default(),
                    rows.len(),
                    view.subject(rows[0])
                ),
            )
            .with_variable(seq)
            .with_records(rows.iter().map(|row| view.record(*row)).collect()),
        );
    }
}

fn subject_uniqueness(view: &TableView<'_>, outcome: &mut LayerOutcome) {
    let (total, groups) = group_rows(
        view.subjects()
            .iter()
            .enumerate()
            .map(|(row, subject)| (row, (!subject.is_empty()).then_some(subject.as_str()))),
    );
    outcome.tally(RuleId::DuplicateSubject, total, repeated(&groups));
    for rows in groups.iter().filter(|rows| rows.len() > 1) {
        outcome.push(
            view.defect(
                RuleId::DuplicateSubject,
                format!("USUBJID {} appears in {} DM records", view.subject(rows[0]), rows.len()),
            )
            .with_variable("USUBJID")
            .with_records(rows.iter().map(|row| view.record(*row)).collect()),
        );
    }
}

fn iso_dates(view: &TableView<'_>, outcome: &mut LayerOutcome) -> PolarsResult<()> {
    for variable in view.domain.datetime_variables() {
        let Some(values) = view.strings(&variable.name)? else {
            continue;
        };
        for (row, value) in values.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
            outcome.evaluate(RuleId::InvalidIsoDate, is_valid_iso8601(value), || {
                view.defect(
                    RuleId::InvalidIsoDate,
                    format!("{} value '{value}' is not ISO 8601", variable.name),
                )
                .with_variable(&variable.name)
                .with_record(view.record(row))
            });
        }
    }
    Ok(())
}
