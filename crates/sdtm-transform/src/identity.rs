//! STUDYID, DOMAIN and USUBJID construction.
//!
//! SDTMIG 4.1.2: USUBJID identifies a subject across every study and
//! submission. It is built by joining the configured source fields
//! (STUDYID, SITEID and SUBJID by default) with the configured separator.

use sdtm_model::{DerivationOptions, Domain, RuleId};

use crate::issue::Issue;
use crate::records::RecordSet;

pub fn assign_identity(set: &mut RecordSet, domain: &Domain, options: &DerivationOptions) -> Vec<Issue> {
    if domain.has_variable("STUDYID")
        && let Some(study_id) = options.study_id.as_deref()
    {
        for record in &mut set.records {
            if record.get("STUDYID").is_empty() {
                record.set("STUDYID", study_id);
            }
        }
        set.add_column("STUDYID");
    }

    if domain.has_variable("DOMAIN") {
        for record in &mut set.records {
            record.set("DOMAIN", domain.code.as_str());
        }
        set.add_column("DOMAIN");
    }

    if !domain.carries_subjects() {
        return Vec::new();
    }

    let mut issues = Vec::new();
    for record in &mut set.records {
        let missing: Vec<&str> = options
            .subject_key_fields
            .iter()
            .map(String::as_str)
            .filter(|field| record.get(field).is_empty())
            .collect();
        if missing.is_empty() {
            let usubjid = options
                .subject_key_fields
                .iter()
                .map(|field| record.get(field))
                .collect::<Vec<_>>()
                .join(&options.subject_key_separator);
            record.set("USUBJID", usubjid);
        } else if record.get("USUBJID").is_empty() {
            issues.push(
                Issue::record(
                    RuleId::SubjectKeyIncomplete,
                    record.order,
                    format!("USUBJID could not be built: {} empty", missing.join(", ")),
                )
                .on("USUBJID"),
            );
        }
    }
    set.add_column("USUBJID");
    issues
}
