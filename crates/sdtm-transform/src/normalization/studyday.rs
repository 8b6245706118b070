//! Study day calculation per SDTMIG 4.4.4.
//!
//! Study day is relative to RFSTDTC:
//! - on or after the reference date: `(event - ref) + 1` (Day 1, 2, 3...)
//! - before the reference date: `event - ref` (Day -1, -2, -3...)
//! - there is no Day 0

use chrono::NaiveDate;
use sdtm_model::Domain;

use crate::datetime::parse_iso8601;
use crate::records::RecordSet;
use crate::reference::SubjectReferences;

/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use sdtm_transform::calculate_study_day;
///
/// let reference = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(calculate_study_day(reference, reference), 1);
///
/// let day_before = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
/// assert_eq!(calculate_study_day(day_before, reference), -1);
/// ```
pub fn calculate_study_day(event_date: NaiveDate, reference_date: NaiveDate) -> i64 {
    let days = (event_date - reference_date).num_days();
    if days >= 0 { days + 1 } else { days }
}

/// Study day from two ISO 8601 values.
///
/// `None` unless both carry at least day precision.
pub fn study_day_from_iso(event: &str, reference: &str) -> Option<i64> {
    let event = parse_iso8601(event)?.date()?;
    let reference = parse_iso8601(reference)?.date()?;
    Some(calculate_study_day(event, reference))
}

/// Fills each --DY companion whose date variable the source carries.
///
/// Subjects without a reference start date get an empty study day.
pub fn derive_study_days(set: &mut RecordSet, domain: &Domain, references: &SubjectReferences) {
    for pair in &domain.study_days {
        if !set.has_column(&pair.date) {
            continue;
        }
        for record in &mut set.records {
            let day = references
                .reference_start(record.get("USUBJID"))
                .and_then(|reference| study_day_from_iso(record.get(&pair.date), reference));
            record.set(&pair.day, day.map(|d| d.to_string()).unwrap_or_default());
        }
        set.add_column(&pair.day);
    }
}
