//! Temporal ordering: start/end pairs, baseline flags, end of participation
//! and study day zero.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use polars::prelude::PolarsResult;
use sdtm_model::{BaselineSpec, Layer, RuleId};
use sdtm_transform::datetime::{IsoDateTime, compare_at_common_precision, parse_iso8601};

use super::{LayerOutcome, TableView, demographics};

pub fn check(views: &[TableView<'_>]) -> PolarsResult<LayerOutcome> {
    let mut outcome = LayerOutcome::new(Layer::Temporal);
    let participation_end = participation_end(views)?;
    for view in views {
        timing_pairs(view, &mut outcome)?;
        if let Some(spec) = &view.domain.baseline {
            baseline_flags(view, spec, &mut outcome)?;
        }
        if view.code() != "DM" && view.domain.carries_subjects() {
            after_participation(view, &participation_end, &mut outcome)?;
        }
        study_day_zero(view, &mut outcome)?;
    }
    Ok(outcome)
}

fn timing_pairs(view: &TableView<'_>, outcome: &mut LayerOutcome) -> PolarsResult<()> {
    for pair in &view.domain.timing_pairs {
        let (Some(starts), Some(ends)) = (view.strings(&pair.start)?, view.strings(&pair.end)?) else {
            continue;
        };
        for (row, (start, end)) in starts.iter().zip(&ends).enumerate() {
            let (Some(start_at), Some(end_at)) = (parse_iso8601(start), parse_iso8601(end)) else {
                continue;
            };
            let ordered = compare_at_common_precision(&start_at, &end_at) != Ordering::Greater;
            outcome.evaluate(RuleId::EndBeforeStart, ordered, || {
                view.defect(
                    RuleId::EndBeforeStart,
                    format!("{} {end} is before {} {start}", pair.end, pair.start),
                )
                .with_variable(&pair.end)
                .with_record(view.record(row))
            });
        }
    }
    Ok(())
}

fn baseline_flags(view: &TableView<'_>, spec: &BaselineSpec, outcome: &mut LayerOutcome) -> PolarsResult<()> {
    let Some(flags) = view.strings(&spec.flag)? else {
        return Ok(());
    };
    let tests = view
        .strings(&spec.test_code)?
        .unwrap_or_else(|| vec![String::new(); flags.len()]);

    let mut flagged: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    for (row, flag) in flags.iter().enumerate() {
        let valid = flag.is_empty() || flag == "Y";
        outcome.evaluate(RuleId::InvalidBaselineFlag, valid, || {
            view.defect(
                RuleId::InvalidBaselineFlag,
                format!("{} value '{flag}' is not Y or null", spec.flag),
            )
            .with_variable(&spec.flag)
            .with_record(view.record(row))
        });
        if flag == "Y" {
            flagged
                .entry((view.subject(row), tests[row].as_str()))
                .or_default()
                .push(row);
        }
    }

    for ((subject, test), rows) in flagged {
        outcome.evaluate(RuleId::MultipleBaseline, rows.len() == 1, || {
            view.defect(
                RuleId::MultipleBaseline,
                format!("{} baseline records for {subject} {test}", rows.len()),
            )
            .with_variable(&spec.flag)
            .with_records(rows.iter().map(|row| view.record(*row)).collect())
        });
    }
    Ok(())
}

/// DM.RFPENDTC by USUBJID, for subjects where it parses.
fn participation_end(views: &[TableView<'_>]) -> PolarsResult<HashMap<String, IsoDateTime>> {
    let Some(dm) = demographics(views) else {
        return Ok(HashMap::new());
    };
    let Some(ends) = dm.strings("RFPENDTC")? else {
        return Ok(HashMap::new());
    };
    Ok(dm
        .subjects()
        .iter()
        .zip(&ends)
        .filter(|(subject, _)| !subject.is_empty())
        .filter_map(|(subject, end)| parse_iso8601(end).map(|at| (subject.clone(), at)))
        .collect())
}

fn after_participation(
    view: &TableView<'_>,
    participation_end: &HashMap<String, IsoDateTime>,
    outcome: &mut LayerOutcome,
) -> PolarsResult<()> {
    if participation_end.is_empty() {
        return Ok(());
    }
    for variable in view.domain.datetime_variables() {
        let Some(values) = view.strings(&variable.name)? else {
            continue;
        };
        for (row, value) in values.iter().enumerate() {
            let (Some(end), Some(at)) = (participation_end.get(view.subject(row)), parse_iso8601(value)) else {
                continue;
            };
            let within = compare_at_common_precision(&at, end) != Ordering::Greater;
            outcome.evaluate(RuleId::AfterEndOfParticipation, within, || {
                view.defect(
                    RuleId::AfterEndOfParticipation,
                    format!(
                        "{} {value} is after RFPENDTC {}",
                        variable.name,
                        end.to_iso8601()
                    ),
                )
                .with_variable(&variable.name)
                .with_record(view.record(row))
            });
        }
    }
    Ok(())
}

fn study_day_zero(view: &TableView<'_>, outcome: &mut LayerOutcome) -> PolarsResult<()> {
    for pair in &view.domain.study_days {
        let Some(days) = view.integers(&pair.day)? else {
            continue;
        };
        for (row, day) in days.iter().enumerate() {
            let Some(day) = day else {
                continue;
            };
            outcome.evaluate(RuleId::StudyDayZero, *day != 0, || {
                view.defect(RuleId::StudyDayZero, format!("{} is 0", pair.day))
                    .with_variable(&pair.day)
                    .with_record(view.record(row))
            });
        }
    }
    Ok(())
}
