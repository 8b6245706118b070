//! Date/time normalization of --DTC variables.

use sdtm_model::{Domain, RuleId};

use crate::datetime::{DateNormalization, normalize_datetime};
use crate::issue::Issue;
use crate::records::RecordSet;

/// Rewrites every date/time variable the source carries to ISO 8601.
///
/// Unparseable values stay as collected and raise an advisory issue so the
/// structural layer can still report them.
pub fn normalize_dates(set: &mut RecordSet, domain: &Domain) -> Vec<Issue> {
    let mut issues = Vec::new();
    for variable in domain.datetime_variables() {
        let name = variable.name.as_str();
        if !set.has_column(name) {
            continue;
        }
        for record in &mut set.records {
            match normalize_datetime(record.get(name)) {
                DateNormalization::Missing => record.set(name, ""),
                DateNormalization::Iso(value) => record.set(name, value),
                DateNormalization::Unparseable(value) => {
                    issues.push(
                        Issue::record(
                            RuleId::UnparseableDate,
                            record.order,
                            format!("{name} value '{value}' is not a recognised date"),
                        )
                        .on(name),
                    );
                    record.set(name, value);
                }
            }
        }
    }
    issues
}
