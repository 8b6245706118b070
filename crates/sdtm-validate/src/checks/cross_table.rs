//! Referential integrity between produced tables.

use std::collections::BTreeSet;

use polars::prelude::{DataFrame, PolarsResult};
use sdtm_common::{column_strings, format_numeric, parse_f64};
use sdtm_model::{CaseInsensitiveSet, Layer, RuleId};

use super::{LayerOutcome, TableView, demographics};

pub fn check(views: &[TableView<'_>], visit_schedule: Option<&DataFrame>) -> PolarsResult<LayerOutcome> {
    let mut outcome = LayerOutcome::new(Layer::CrossTable);
    let dm = demographics(views);
    let subjects: BTreeSet<&str> = dm
        .map(|dm| dm.subjects().iter().map(String::as_str).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let study_ids: BTreeSet<String> = match dm {
        Some(dm) => dm
            .strings("STUDYID")?
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect(),
        None => BTreeSet::new(),
    };
    let visits = match visit_schedule {
        Some(schedule) => visit_numbers(schedule)?,
        None => None,
    };

    for view in views.iter().filter(|view| view.code() != "DM") {
        if view.domain.carries_subjects() {
            subjects_in_dm(view, &subjects, &mut outcome);
        }
        if !study_ids.is_empty() {
            study_ids_match(view, &study_ids, &mut outcome)?;
        }
        if let Some(visits) = &visits
            && view.code() != "TV"
        {
            visits_scheduled(view, visits, &mut outcome)?;
        }
    }
    Ok(outcome)
}

fn subjects_in_dm(view: &TableView<'_>, subjects: &BTreeSet<&str>, outcome: &mut LayerOutcome) {
    for (row, subject) in view.subjects().iter().enumerate() {
        if subject.is_empty() {
            continue;
        }
        outcome.evaluate(RuleId::SubjectNotInDm, subjects.contains(subject.as_str()), || {
            view.defect(RuleId::SubjectNotInDm, format!("USUBJID {subject} is not in DM"))
                .with_variable("USUBJID")
                .with_record(view.record(row))
        });
    }
}

fn study_ids_match(
    view: &TableView<'_>,
    study_ids: &BTreeSet<String>,
    outcome: &mut LayerOutcome,
) -> PolarsResult<()> {
    let Some(values) = view.strings("STUDYID")? else {
        return Ok(());
    };
    for (row, value) in values.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
        outcome.evaluate(RuleId::StudyIdMismatch, study_ids.contains(value), || {
            view.defect(
                RuleId::StudyIdMismatch,
                format!("STUDYID {value} does not match DM"),
            )
            .with_variable("STUDYID")
            .with_record(view.record(row))
        });
    }
    Ok(())
}

fn visits_scheduled(
    view: &TableView<'_>,
    visits: &BTreeSet<String>,
    outcome: &mut LayerOutcome,
) -> PolarsResult<()> {
    let Some(values) = view.strings("VISITNUM")? else {
        return Ok(());
    };
    for (row, value) in values.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
        let visit = visit_key(value);
        outcome.evaluate(RuleId::VisitNotInSchedule, visits.contains(&visit), || {
            view.defect(
                RuleId::VisitNotInSchedule,
                format!("VISITNUM {value} is not in the visit schedule"),
            )
            .with_variable("VISITNUM")
            .with_record(view.record(row))
        });
    }
    Ok(())
}

/// Scheduled visit numbers, or `None` when the schedule has no VISITNUM column.
fn visit_numbers(schedule: &DataFrame) -> PolarsResult<Option<BTreeSet<String>>> {
    let columns = CaseInsensitiveSet::new(schedule.get_column_names().iter().map(|n| n.as_str()));
    let Some(column) = columns.get("VISITNUM") else {
        return Ok(None);
    };
    let visits = column_strings(schedule, column)?
        .iter()
        .filter(|v| !v.is_empty())
        .map(|v| visit_key(v))
        .collect();
    Ok(Some(visits))
}

/// `"1"`, `"1.0"` and a float 1.0 all compare as the same visit.
fn visit_key(value: &str) -> String {
    parse_f64(value).map_or_else(|| value.trim().to_string(), format_numeric)
}
