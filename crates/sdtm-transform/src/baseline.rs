//! Baseline flag (--BLFL) selection.
//!
//! Per subject and test, the baseline is the latest record collected on or
//! before the subject's reference start date. Only full dates qualify and
//! records marked NOT DONE never do. The flag is `Y` or empty, never `N`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use sdtm_model::{BaselineSpec, TieBreak};

use crate::datetime::{IsoDateTime, compare_at_common_precision, compare_chronologically, parse_iso8601};
use crate::records::{RecordSet, WorkRecord};
use crate::reference::SubjectReferences;
use crate::sequence::compare_values;

struct Candidate {
    index: usize,
    collected: IsoDateTime,
}

fn candidate_date(
    record: &WorkRecord,
    spec: &BaselineSpec,
    references: &SubjectReferences,
) -> Option<IsoDateTime> {
    if record.get(&spec.status).eq_ignore_ascii_case("NOT DONE") {
        return None;
    }
    let collected = parse_iso8601(record.get(&spec.date))?;
    collected.date()?;
    let reference = parse_iso8601(references.reference_start(record.get("USUBJID"))?)?;
    (compare_at_common_precision(&collected, &reference) != Ordering::Greater).then_some(collected)
}

/// True when `challenger` should replace `current` as the baseline.
///
/// Candidates are ranked by a total order so the outcome does not depend on
/// input order: on the same day a timed record outranks a date-only one.
fn supersedes(
    challenger: &Candidate,
    current: &Candidate,
    records: &[WorkRecord],
    tie_break: &TieBreak,
) -> bool {
    match compare_chronologically(&challenger.collected, &current.collected) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => {
            let a = &records[challenger.index];
            let b = &records[current.index];
            let by_variable = match tie_break {
                TieBreak::InputOrder => Ordering::Equal,
                TieBreak::Variable(name) => compare_values(a.get(name), b.get(name), true),
            };
            by_variable.then(a.order.cmp(&b.order)) == Ordering::Less
        }
    }
}

/// Sets the baseline flag on at most one record per (USUBJID, test code).
pub fn flag_baseline(
    set: &mut RecordSet,
    spec: &BaselineSpec,
    references: &SubjectReferences,
    tie_break: &TieBreak,
) {
    if !set.has_column(&spec.test_code) {
        return;
    }

    let mut selected: BTreeMap<(String, String), Candidate> = BTreeMap::new();
    for (index, record) in set.records.iter().enumerate() {
        let subject = record.get("USUBJID");
        let test_code = record.get(&spec.test_code);
        if subject.is_empty() || test_code.is_empty() {
            continue;
        }
        let Some(collected) = candidate_date(record, spec, references) else {
            continue;
        };
        let candidate = Candidate { index, collected };
        let key = (subject.to_string(), test_code.to_string());
        let replace = selected
            .get(&key)
            .is_none_or(|current| supersedes(&candidate, current, &set.records, tie_break));
        if replace {
            selected.insert(key, candidate);
        }
    }

    for record in &mut set.records {
        record.set(&spec.flag, "");
    }
    for candidate in selected.values() {
        set.records[candidate.index].set(&spec.flag, "Y");
    }
    set.add_column(&spec.flag);
}
