//! Domain derivation: raw source table in, SDTM domain table out.

use std::collections::HashMap;

use polars::prelude::{DataFrame, PolarsResult};
use sdtm_model::{Defect, Domain, RecordKey, RuleId, sort_defects};
use tracing::{debug, info_span};

use crate::baseline::flag_baseline;
use crate::context::TransformContext;
use crate::error::{Result, TransformError};
use crate::frame::{DomainFrame, DomainOutput, ProducedTables};
use crate::identity::assign_identity;
use crate::issue::Issue;
use crate::normalization::{
    assign_epochs, derive_study_days, normalize_dates, normalize_terminology, standardize_results,
};
use crate::records::{RawTable, RecordSet, build_frame, empty_frame};
use crate::reference::{PeriodTable, SubjectReferences};
use crate::sequence::assign_sequence;
use crate::wide::{complete_test_names, is_vertical, reshape_findings};

/// Derives one domain from its raw source table.
///
/// Reads earlier domains (DM for reference dates, SE for epochs) from
/// `snapshot` and never mutates it. Record-level problems become defects on
/// the output; only an unknown domain or a malformed raw table is an error.
///
/// Steps run in this order:
/// 1. wide-to-long reshaping for horizontal Findings tables
/// 2. STUDYID, DOMAIN and USUBJID
/// 3. ISO 8601 normalization of date/time variables
/// 4. controlled terminology normalization (when enabled)
/// 5. test names and standard results for Findings
/// 6. sort and --SEQ
/// 7. --DY and EPOCH from the snapshot
/// 8. --BLFL
pub fn produce(
    domain_code: &str,
    raw: &DataFrame,
    snapshot: &ProducedTables,
    ctx: &TransformContext<'_>,
) -> Result<DomainOutput> {
    let domain = ctx.registry.require_domain(domain_code)?;
    let span = info_span!("derive", domain = %domain.code);
    let _guard = span.enter();

    let table = RawTable::from_frame(&domain.code, raw)?;
    let mut issues = Vec::new();
    let lookup = ctx.registry.test_lookup(&domain.code);
    let mut set = match lookup {
        Some(lookup) if !is_vertical(&table, domain) => {
            debug!(columns = table.headers().len(), "reshaping horizontal findings");
            let (set, reshape_issues) = reshape_findings(table, domain, lookup, ctx.options);
            issues.extend(reshape_issues);
            set
        }
        _ => table.into_record_set(),
    };

    issues.extend(assign_identity(&mut set, domain, ctx.options));
    issues.extend(normalize_dates(&mut set, domain));
    if ctx.options.normalize_terminology {
        normalize_terminology(&mut set, domain, ctx.registry);
    }
    if let Some(lookup) = lookup {
        complete_test_names(&mut set, domain, lookup);
    }
    issues.extend(standardize_results(&mut set, domain, ctx.registry));
    assign_sequence(&mut set, domain);

    let references = SubjectReferences::from_snapshot(snapshot)?;
    derive_study_days(&mut set, domain, &references);
    let periods = PeriodTable::from_snapshot(snapshot)?;
    assign_epochs(&mut set, domain, periods.as_ref());
    if let Some(spec) = &domain.baseline {
        flag_baseline(&mut set, spec, &references, &ctx.options.baseline_tie_break);
    }

    let data = build_frame(domain, &set)?;
    let defects = resolve_issues(domain, &set, issues);
    debug!(
        records = data.height(),
        defects = defects.len(),
        "derived domain"
    );
    Ok(DomainOutput {
        frame: DomainFrame::new(domain.code.clone(), data),
        defects,
    })
}

/// Output for a domain whose derivation failed: every variable, no rows,
/// and one blocking defect carrying the error.
pub fn failed_output(domain: &Domain, error: &TransformError) -> PolarsResult<DomainOutput> {
    let data = empty_frame(domain)?;
    let defect = Defect::new(
        RuleId::DerivationFailed,
        &domain.code,
        format!("derivation failed: {error}"),
    );
    Ok(DomainOutput {
        frame: DomainFrame::new(domain.code.clone(), data),
        defects: vec![defect],
    })
}

/// Turns issues into defects keyed by final row, USUBJID and --SEQ.
fn resolve_issues(domain: &Domain, set: &RecordSet, issues: Vec<Issue>) -> Vec<Defect> {
    let rows: HashMap<usize, usize> = set
        .records
        .iter()
        .enumerate()
        .map(|(row, record)| (record.order, row))
        .collect();
    let seq_variable = domain.seq_variable();

    let mut defects: Vec<Defect> = issues
        .into_iter()
        .map(|issue| {
            let mut defect = Defect::new(issue.rule, &domain.code, issue.message);
            if let Some(variable) = &issue.variable {
                defect = defect.with_variable(variable);
            }
            if let Some(row) = issue.order.and_then(|order| rows.get(&order).copied()) {
                let record = &set.records[row];
                let mut key = RecordKey::new(row).with_subject(record.get("USUBJID"));
                if let Some(seq) = seq_variable.and_then(|name| record.get(name).parse::<i64>().ok()) {
                    key = key.with_seq(seq);
                }
                defect = defect.with_record(key);
            }
            defect
        })
        .collect();
    sort_defects(&mut defects);
    defects
}
