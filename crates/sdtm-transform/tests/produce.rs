//! End-to-end derivation of single domains.

use polars::prelude::DataFrame;
use sdtm_common::{column_i64s, column_strings, string_column};
use sdtm_model::{DerivationOptions, RuleId, Severity};
use sdtm_standards::{DomainRegistry, StandardsError};
use sdtm_transform::{
    DomainOutput, ProducedTables, TransformContext, TransformError, failed_output, produce,
};

fn frame(columns: &[(&str, Vec<&str>)]) -> DataFrame {
    DataFrame::new(
        columns
            .iter()
            .map(|(name, values)| string_column(name, values.iter().map(|v| (*v).to_string()).collect()))
            .collect(),
    )
    .unwrap()
}

fn strings(output: &DomainOutput, name: &str) -> Vec<String> {
    column_strings(&output.frame.data, name).unwrap()
}

fn ints(output: &DomainOutput, name: &str) -> Vec<Option<i64>> {
    column_i64s(&output.frame.data, name).unwrap()
}

fn derive(domain: &str, raw: &DataFrame, snapshot: &ProducedTables) -> DomainOutput {
    let registry = DomainRegistry::builtin();
    let options = DerivationOptions::new();
    let ctx = TransformContext::new(&registry, &options);
    produce(domain, raw, snapshot, &ctx).unwrap()
}

fn dm_raw() -> DataFrame {
    frame(&[
        ("STUDYID", vec!["ABC", "ABC"]),
        ("SITEID", vec!["01", "02"]),
        ("SUBJID", vec!["001", "002"]),
        ("RFSTDTC", vec!["15-JAN-2024", ""]),
        ("SEX", vec!["Male", "F"]),
    ])
}

fn snapshot_with_dm() -> ProducedTables {
    let dm = derive("DM", &dm_raw(), &ProducedTables::new());
    [dm.frame].into_iter().collect()
}

#[test]
fn dm_builds_subject_keys() {
    let dm = derive("DM", &dm_raw(), &ProducedTables::new());

    assert!(dm.defects.is_empty());
    assert_eq!(strings(&dm, "USUBJID"), vec!["ABC-01-001", "ABC-02-002"]);
    assert_eq!(strings(&dm, "RFSTDTC"), vec!["2024-01-15", ""]);
    assert_eq!(strings(&dm, "SEX"), vec!["M", "F"]);
    assert_eq!(strings(&dm, "DOMAIN"), vec!["DM", "DM"]);
    let names: Vec<&str> = dm.frame.data.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(
        names,
        vec!["STUDYID", "DOMAIN", "USUBJID", "SUBJID", "RFSTDTC", "SITEID", "SEX"]
    );
}

#[test]
fn study_days_skip_day_zero() {
    let snapshot = snapshot_with_dm();
    let ae = frame(&[
        ("STUDYID", vec!["ABC", "ABC", "ABC"]),
        ("SITEID", vec!["01", "01", "01"]),
        ("SUBJID", vec!["001", "001", "001"]),
        ("AETERM", vec!["NAUSEA", "HEADACHE", "RASH"]),
        ("AESTDTC", vec!["2024-01-16", "14JAN2024", "2024-01-15"]),
    ]);

    let output = derive("AE", &ae, &snapshot);

    assert_eq!(strings(&output, "AETERM"), vec!["HEADACHE", "RASH", "NAUSEA"]);
    assert_eq!(ints(&output, "AESTDY"), vec![Some(-1), Some(1), Some(2)]);
    assert_eq!(ints(&output, "AESEQ"), vec![Some(1), Some(2), Some(3)]);
    assert_eq!(strings(&output, "EPOCH"), vec!["", "", ""]);
}

#[test]
fn missing_reference_date_leaves_study_day_empty() {
    let snapshot = snapshot_with_dm();
    let ae = frame(&[
        ("STUDYID", vec!["ABC"]),
        ("SITEID", vec!["02"]),
        ("SUBJID", vec!["002"]),
        ("AETERM", vec!["COUGH"]),
        ("AESTDTC", vec!["2024-02-01"]),
    ]);

    let output = derive("AE", &ae, &snapshot);

    assert_eq!(ints(&output, "AESTDY"), vec![None]);
    assert!(output.defects.is_empty());
}

#[test]
fn epoch_follows_subject_elements() {
    let mut snapshot = snapshot_with_dm();
    let se = frame(&[
        ("STUDYID", vec!["ABC", "ABC", "ABC"]),
        ("SITEID", vec!["01", "01", "01"]),
        ("SUBJID", vec!["001", "001", "001"]),
        ("ETCD", vec!["SCRN", "TRT", "FU"]),
        ("EPOCH", vec!["SCREENING", "TREATMENT", "FOLLOW-UP"]),
        ("SESTDTC", vec!["2024-01-01", "2024-01-15", "2024-03-01"]),
        ("SEENDTC", vec!["2024-01-15", "2024-03-01", ""]),
    ]);
    let se = derive("SE", &se, &snapshot);
    assert_eq!(ints(&se, "SESTDY"), vec![Some(-14), Some(1), Some(47)]);
    snapshot.insert(se.frame);

    let ae = frame(&[
        ("STUDYID", vec!["ABC", "ABC", "ABC", "ABC"]),
        ("SITEID", vec!["01", "01", "01", "01"]),
        ("SUBJID", vec!["001", "001", "001", "001"]),
        ("AETERM", vec!["A", "B", "C", "D"]),
        ("AESTDTC", vec!["2024-01-10", "2024-01-15", "2024-04-01", "2024-01"]),
    ]);
    let output = derive("AE", &ae, &snapshot);

    assert_eq!(strings(&output, "AESTDTC"), vec!["2024-01", "2024-01-10", "2024-01-15", "2024-04-01"]);
    assert_eq!(
        strings(&output, "EPOCH"),
        vec!["", "SCREENING", "TREATMENT", "FOLLOW-UP"]
    );
}

#[test]
fn wide_vital_signs_reshape_and_flag_baseline() {
    let snapshot = snapshot_with_dm();
    let vs = frame(&[
        ("STUDYID", vec!["ABC", "ABC"]),
        ("SITEID", vec!["01", "01"]),
        ("SUBJID", vec!["001", "001"]),
        ("VISITNUM", vec!["1", "2"]),
        ("VISIT", vec!["SCREENING", "WEEK 2"]),
        ("VSDTC", vec!["2024-01-10", "2024-01-29"]),
        ("Systolic BP", vec!["120", "118"]),
        ("Weight", vec!["100", ""]),
        ("WeightU", vec!["lb", ""]),
        ("Pain score", vec!["3", "2"]),
    ]);

    let output = derive("VS", &vs, &snapshot);

    assert_eq!(output.frame.record_count(), 5);
    assert_eq!(
        strings(&output, "VSTESTCD"),
        vec!["PAINSCOR", "PAINSCOR", "SYSBP", "SYSBP", "WEIGHT"]
    );
    assert_eq!(strings(&output, "VSTEST")[0], "Pain score");
    assert_eq!(strings(&output, "VSTEST")[2], "Systolic Blood Pressure");
    assert_eq!(ints(&output, "VSSEQ"), vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
    assert_eq!(strings(&output, "VSBLFL"), vec!["Y", "", "Y", "", "Y"]);
    assert_eq!(ints(&output, "VSDY"), vec![Some(-5), Some(15), Some(-5), Some(15), Some(-5)]);
    assert_eq!(strings(&output, "VSORRESU")[4], "LB");
    assert_eq!(strings(&output, "VSSTRESC")[4], "45.359237");
    assert_eq!(strings(&output, "VSSTRESU")[4], "kg");

    assert_eq!(output.defects.len(), 1);
    let defect = &output.defects[0];
    assert_eq!(defect.rule_id, RuleId::UnknownTestCode);
    assert_eq!(defect.severity, Severity::Advisory);
    assert_eq!(defect.variable.as_deref(), Some("VSTESTCD"));
}

#[test]
fn lab_results_convert_to_standard_units() {
    let snapshot = snapshot_with_dm();
    let lb = frame(&[
        ("STUDYID", vec!["ABC", "ABC", "ABC"]),
        ("SITEID", vec!["01", "01", "01"]),
        ("SUBJID", vec!["001", "001", "001"]),
        ("LBTESTCD", vec!["GLUC", "GLUC", "HGB"]),
        ("LBORRES", vec!["90", "5", "NEGATIVE"]),
        ("LBORRESU", vec!["mg/dL", "mg/L", ""]),
        ("VISITNUM", vec!["1", "2", "1"]),
        ("LBDTC", vec!["2024-01-10", "2024-02-10", "2024-01-10"]),
    ]);

    let output = derive("LB", &lb, &snapshot);

    assert_eq!(strings(&output, "LBTEST")[0], "Glucose");
    assert_eq!(strings(&output, "LBCAT"), vec!["CHEMISTRY", "CHEMISTRY", "HEMATOLOGY"]);
    assert_eq!(strings(&output, "LBSTRESC"), vec!["4.995", "5", "NEGATIVE"]);
    assert_eq!(strings(&output, "LBSTRESU"), vec!["mmol/L", "mg/L", ""]);
    let stresn = column_strings(&output.frame.data, "LBSTRESN").unwrap();
    assert_eq!(stresn, vec!["4.995", "5", ""]);

    assert_eq!(output.defects.len(), 1);
    assert_eq!(output.defects[0].rule_id, RuleId::NoUnitConversion);
    assert_eq!(output.defects[0].severity, Severity::Informational);
    assert_eq!(output.defects[0].records[0].seq, Some(2));
}

#[test]
fn standardized_results_are_stable_when_derived_again() {
    let snapshot = snapshot_with_dm();
    let first = frame(&[
        ("STUDYID", vec!["ABC"]),
        ("SITEID", vec!["01"]),
        ("SUBJID", vec!["001"]),
        ("LBTESTCD", vec!["HGB"]),
        ("LBORRES", vec!["13.2"]),
        ("LBORRESU", vec!["g/dL"]),
    ]);
    let once = derive("LB", &first, &snapshot);
    let value = strings(&once, "LBSTRESC")[0].clone();
    let unit = strings(&once, "LBSTRESU")[0].clone();
    assert_eq!((value.as_str(), unit.as_str()), ("132", "g/L"));

    let again = frame(&[
        ("STUDYID", vec!["ABC"]),
        ("SITEID", vec!["01"]),
        ("SUBJID", vec!["001"]),
        ("LBTESTCD", vec!["HGB"]),
        ("LBORRES", vec![value.as_str()]),
        ("LBORRESU", vec![unit.as_str()]),
    ]);
    let twice = derive("LB", &again, &snapshot);
    assert_eq!(strings(&twice, "LBSTRESC"), vec![value]);
    assert_eq!(strings(&twice, "LBSTRESU"), vec![unit]);
    assert!(twice.defects.is_empty());
}

#[test]
fn incomplete_subject_key_is_reported_per_record() {
    let ae = frame(&[
        ("STUDYID", vec!["ABC", "ABC"]),
        ("SITEID", vec!["01", "01"]),
        ("SUBJID", vec!["", "001"]),
        ("AETERM", vec!["RASH", "FEVER"]),
        ("AESTDTC", vec!["sometime", "2024-01-20"]),
    ]);

    let output = derive("AE", &ae, &ProducedTables::new());

    assert_eq!(strings(&output, "USUBJID"), vec!["ABC-01-001", ""]);
    assert_eq!(strings(&output, "AESTDTC"), vec!["2024-01-20", "sometime"]);
    let rules: Vec<(RuleId, usize)> = output
        .defects
        .iter()
        .map(|d| (d.rule_id, d.first_row().unwrap()))
        .collect();
    assert_eq!(
        rules,
        vec![(RuleId::SubjectKeyIncomplete, 1), (RuleId::UnparseableDate, 1)]
    );
}

#[test]
fn study_id_falls_back_to_run_setting() {
    let registry = DomainRegistry::builtin();
    let options = DerivationOptions::new().with_study_id("XYZ").with_separator("/");
    let ctx = TransformContext::new(&registry, &options);
    let dm = frame(&[("SITEID", vec!["9"]), ("SUBJID", vec!["12"])]);

    let output = produce("DM", &dm, &ProducedTables::new(), &ctx).unwrap();

    assert_eq!(strings(&output, "STUDYID"), vec!["XYZ"]);
    assert_eq!(strings(&output, "USUBJID"), vec!["XYZ/9/12"]);
}

#[test]
fn malformed_raw_table_is_an_error() {
    let registry = DomainRegistry::builtin();
    let options = DerivationOptions::new();
    let ctx = TransformContext::new(&registry, &options);
    let raw = frame(&[("aeterm", vec!["A"]), ("AETERM", vec!["B"])]);

    let err = produce("AE", &raw, &ProducedTables::new(), &ctx).unwrap_err();
    assert!(matches!(err, TransformError::MalformedRaw { .. }));

    let fallback = failed_output(registry.domain("AE").unwrap(), &err).unwrap();
    assert_eq!(fallback.frame.record_count(), 0);
    assert!(fallback.frame.data.column("AESEQ").is_ok());
    assert_eq!(fallback.defects.len(), 1);
    assert_eq!(fallback.defects[0].rule_id, RuleId::DerivationFailed);
    assert!(fallback.defects[0].is_blocking());
}

#[test]
fn unknown_domain_is_rejected() {
    let registry = DomainRegistry::builtin();
    let options = DerivationOptions::new();
    let ctx = TransformContext::new(&registry, &options);
    let raw = frame(&[("X", vec!["1"])]);

    let err = produce("ZZ", &raw, &ProducedTables::new(), &ctx).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Standards(StandardsError::UnknownDomain { .. })
    ));
}
