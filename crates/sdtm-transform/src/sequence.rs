//! --SEQ assignment.
//!
//! Records are grouped by USUBJID and stable-sorted by the domain sort key,
//! then numbered 1..N within each subject. Runs after date normalization so
//! date keys compare on their ISO 8601 form.

use std::cmp::Ordering;

use sdtm_common::parse_f64;
use sdtm_model::Domain;

use crate::records::{RecordSet, WorkRecord};

/// Sorts records into output order and writes `<DOMAIN>SEQ` when the domain has one.
pub fn assign_sequence(set: &mut RecordSet, domain: &Domain) {
    let mut keys: Vec<&str> = Vec::with_capacity(domain.sort_key.len() + 1);
    if domain.carries_subjects() {
        keys.push("USUBJID");
    }
    keys.extend(domain.sort_key.iter().map(String::as_str));
    let numeric: Vec<bool> = keys
        .iter()
        .map(|key| domain.variable(key).is_some_and(|v| v.is_numeric()))
        .collect();

    set.records.sort_by(|a, b| {
        keys.iter()
            .zip(&numeric)
            .map(|(key, numeric)| compare_values(a.get(key), b.get(key), *numeric))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    let Some(seq_variable) = domain.seq_variable() else {
        return;
    };
    number_within_subject(&mut set.records, seq_variable);
    set.add_column(seq_variable);
}

fn number_within_subject(records: &mut [WorkRecord], seq_variable: &str) {
    let mut current: Option<String> = None;
    let mut next = 1_i64;
    for record in records {
        let subject = record.get("USUBJID");
        if current.as_deref() != Some(subject) {
            current = Some(subject.to_string());
            next = 1;
        }
        record.set(seq_variable, next.to_string());
        next += 1;
    }
}

/// Empty values sort last. Numeric variables compare by value when both parse.
pub(crate) fn compare_values(a: &str, b: &str, numeric: bool) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    if numeric && let (Some(x), Some(y)) = (parse_f64(a), parse_f64(b)) {
        return x.total_cmp(&y);
    }
    a.cmp(b)
}
