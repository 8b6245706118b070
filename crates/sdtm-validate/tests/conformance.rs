use polars::prelude::{Column, DataFrame};
use sdtm_common::{float_column, int_column, string_column};
use sdtm_model::{ConformanceOptions, Defect, Layer, LayerWeights, RuleId, Severity};
use sdtm_standards::DomainRegistry;
use sdtm_transform::{DomainFrame, ProducedTables};
use sdtm_validate::{ConformanceError, ConformanceInput, ConformanceReport, validate};

fn text(name: &str, values: &[&str]) -> Column {
    string_column(name, values.iter().map(|v| (*v).to_string()).collect())
}

fn dm(subjects: &[&str], sex: &[&str]) -> DomainFrame {
    let n = subjects.len();
    let repeat = |value: &'static str| vec![value; n];
    let subjids: Vec<&str> = subjects.iter().map(|s| &s[s.len() - 3..]).collect();
    DomainFrame::new(
        "DM",
        DataFrame::new(vec![
            text("STUDYID", &repeat("ABC")),
            text("DOMAIN", &repeat("DM")),
            text("USUBJID", subjects),
            text("SUBJID", &subjids),
            text("RFSTDTC", &repeat("2024-01-15")),
            text("RFENDTC", &repeat("2024-03-01")),
            text("RFPENDTC", &repeat("2024-04-01")),
            text("SITEID", &repeat("01")),
            float_column("AGE", vec![Some(42.0); n]),
            text("AGEU", &repeat("YEARS")),
            text("SEX", sex),
            text("RACE", &repeat("WHITE")),
            text("ARMCD", &repeat("A")),
            text("ARM", &repeat("Active")),
        ])
        .unwrap(),
    )
}

struct AeRow<'a> {
    subject: &'a str,
    seq: i64,
    term: &'a str,
    start: &'a str,
    end: &'a str,
    day: i64,
}

fn ae_column(name: &str, rows: &[AeRow<'_>], value: impl Fn(&AeRow<'_>) -> String) -> Column {
    string_column(name, rows.iter().map(value).collect())
}

fn ae(rows: &[AeRow<'_>]) -> DomainFrame {
    let n = rows.len();
    DomainFrame::new(
        "AE",
        DataFrame::new(vec![
            text("STUDYID", &vec!["ABC"; n]),
            text("DOMAIN", &vec!["AE"; n]),
            ae_column("USUBJID", rows, |r| r.subject.to_string()),
            int_column("AESEQ", rows.iter().map(|r| Some(r.seq)).collect()),
            ae_column("AETERM", rows, |r| r.term.to_string()),
            ae_column("AEDECOD", rows, |r| r.term.to_string()),
            text("AEBODSYS", &vec!["GENERAL DISORDERS"; n]),
            text("AESER", &vec!["N"; n]),
            text("AEREL", &vec!["NOT RELATED"; n]),
            ae_column("AESTDTC", rows, |r| r.start.to_string()),
            ae_column("AEENDTC", rows, |r| r.end.to_string()),
            int_column("AESTDY", rows.iter().map(|r| Some(r.day)).collect()),
        ])
        .unwrap(),
    )
}

fn clean_ae() -> Vec<AeRow<'static>> {
    vec![
        AeRow {
            subject: "ABC-01-001",
            seq: 1,
            term: "HEADACHE",
            start: "2024-01-20",
            end: "2024-01-22",
            day: 6,
        },
        AeRow {
            subject: "ABC-01-001",
            seq: 2,
            term: "NAUSEA",
            start: "2024-02-01",
            end: "2024-02-02",
            day: 18,
        },
        AeRow {
            subject: "ABC-01-002",
            seq: 1,
            term: "RASH",
            start: "2024-01-16",
            end: "2024-01-18",
            day: 2,
        },
    ]
}

fn study(dm_frame: DomainFrame, ae_frame: DomainFrame) -> ProducedTables {
    [dm_frame, ae_frame].into_iter().collect()
}

fn run(tables: &ProducedTables) -> ConformanceReport {
    let registry = DomainRegistry::builtin();
    validate(&ConformanceInput::new(tables, &registry), &ConformanceOptions::default()).unwrap()
}

fn rules(defects: &[Defect]) -> Vec<&'static str> {
    defects.iter().map(|d| d.rule_id.code()).collect()
}

#[test]
fn clean_study_is_ready() {
    let tables = study(
        dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]),
        ae(&clean_ae()),
    );

    let report = run(&tables);

    assert!(report.defects.is_empty(), "{:?}", report.defects);
    assert!(report.ready);
    assert!((report.score - 100.0).abs() < 1e-9);
    assert_eq!(report.layers.len(), 4);
    let structural = report.layer(Layer::Structural).unwrap();
    assert_eq!(structural.checked, structural.passed);
    assert!(structural.checked > 0);
    assert_eq!(report.domain("AE").unwrap().records, 3);
}

#[test]
fn collected_term_against_closed_codelist_is_one_blocking_defect() {
    let tables = study(
        dm(&["ABC-01-001", "ABC-01-002"], &["Male", "F"]),
        ae(&clean_ae()),
    );

    let report = run(&tables);

    assert_eq!(rules(&report.defects), vec!["VOC001"]);
    let defect = &report.defects[0];
    assert_eq!(defect.severity, Severity::Blocking);
    assert_eq!(defect.variable.as_deref(), Some("SEX"));
    assert_eq!(defect.records[0].usubjid.as_deref(), Some("ABC-01-001"));
    assert!(!report.ready);
    assert!(report.layer(Layer::Vocabulary).unwrap().score < 100.0);
}

#[test]
fn dangling_subject_is_one_cross_table_defect() {
    let mut rows = clean_ae();
    rows[2].subject = "ABC-01-003";
    let dangling = study(dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]), ae(&rows));

    let report = run(&dangling);
    assert_eq!(rules(&report.defects), vec!["XTB001"]);
    assert_eq!(report.defects[0].records[0].usubjid.as_deref(), Some("ABC-01-003"));
    assert_eq!(report.counts.blocking, 1);
    assert!(!report.ready);

    let fixed = study(
        dm(&["ABC-01-001", "ABC-01-002", "ABC-01-003"], &["M", "F", "F"]),
        ae(&rows),
    );
    let report = run(&fixed);
    assert!(report.defects.is_empty());
    assert!(report.ready);
}

#[test]
fn repeated_runs_are_identical() {
    let mut rows = clean_ae();
    rows[1].seq = 1;
    rows[1].end = "2024-01-01";
    rows[2].day = 0;
    let tables = study(dm(&["ABC-01-001", "ABC-01-002"], &["Male", "X"]), ae(&rows));
    let registry = DomainRegistry::builtin();
    let input = ConformanceInput::new(&tables, &registry);

    let first = validate(&input, &ConformanceOptions::default()).unwrap();
    let second = validate(&input, &ConformanceOptions::default()).unwrap();
    let sequential = validate(&input, &ConformanceOptions::default().sequential()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, sequential);
    assert_eq!(
        rules(&first.defects),
        vec!["STR003", "TMP001", "TMP005", "VOC001", "VOC001"]
    );
}

#[test]
fn duplicate_sequence_lists_every_record() {
    let mut rows = clean_ae();
    rows[1].seq = 1;
    let tables = study(dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]), ae(&rows));

    let report = run(&tables);

    assert_eq!(rules(&report.defects), vec!["STR003"]);
    let rows: Vec<usize> = report.defects[0].records.iter().map(|r| r.row).collect();
    assert_eq!(rows, vec![0, 1]);
    let structural = report.layer(Layer::Structural).unwrap();
    assert_eq!(structural.checked - structural.passed, 1);
    assert!(!report.ready);
}

#[test]
fn missing_required_variable_is_structural() {
    let mut demographics = dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]);
    demographics.data = demographics.data.drop("SEX").unwrap();
    let tables = study(demographics, ae(&clean_ae()));

    let report = run(&tables);

    assert_eq!(rules(&report.defects), vec!["STR001"]);
    assert_eq!(report.defects[0].domain, "DM");
    assert_eq!(report.defects[0].variable.as_deref(), Some("SEX"));
    assert!(report.layer(Layer::Structural).unwrap().score < 100.0);
    assert!(!report.ready);
}

#[test]
fn empty_key_value_lists_the_record() {
    let mut rows = clean_ae();
    rows[2].term = "";
    let tables = study(dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]), ae(&rows));

    let report = run(&tables);

    assert_eq!(rules(&report.defects), vec!["STR002"]);
    let defect = &report.defects[0];
    assert_eq!(defect.variable.as_deref(), Some("AETERM"));
    assert_eq!(defect.records.len(), 1);
    assert_eq!(defect.records[0].row, 2);
    assert!(!report.ready);
}

#[test]
fn repeated_demographics_subject_is_reported_once() {
    let tables = study(
        dm(&["ABC-01-001", "ABC-01-001", "ABC-01-002"], &["M", "M", "F"]),
        ae(&clean_ae()),
    );

    let report = run(&tables);

    assert_eq!(rules(&report.defects), vec!["STR004"]);
    let rows: Vec<usize> = report.defects[0].records.iter().map(|r| r.row).collect();
    assert_eq!(rows, vec![0, 1]);
    assert!(!report.ready);
}

#[test]
fn non_iso_date_is_structural() {
    let mut rows = clean_ae();
    rows[0].start = "15-JAN-2024";
    let tables = study(dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]), ae(&rows));

    let report = run(&tables);

    assert_eq!(rules(&report.defects), vec!["STR005"]);
    assert_eq!(report.defects[0].message, "AESTDTC value '15-JAN-2024' is not ISO 8601");
    assert_eq!(report.defects[0].records[0].row, 0);
    assert!(!report.ready);
}

#[test]
fn study_identifier_must_match_demographics() {
    let mut events = ae(&clean_ae());
    events
        .data
        .with_column(text("STUDYID", &["ABC", "XYZ", "ABC"]))
        .unwrap();
    let tables = study(dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]), events);

    let report = run(&tables);

    assert_eq!(rules(&report.defects), vec!["XTB002"]);
    assert_eq!(report.defects[0].message, "STUDYID XYZ does not match DM");
    assert_eq!(report.defects[0].records[0].row, 1);
    assert!(!report.ready);
}

#[test]
fn overall_score_is_the_weighted_mean_of_layers() {
    let mut rows = clean_ae();
    rows[2].subject = "ABC-01-003";
    let tables = study(dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]), ae(&rows));
    let registry = DomainRegistry::builtin();
    let options = ConformanceOptions {
        weights: LayerWeights {
            structural: 1.0,
            vocabulary: 0.0,
            cross_table: 3.0,
            temporal: 0.0,
        },
        ..ConformanceOptions::default()
    };

    let report = validate(&ConformanceInput::new(&tables, &registry), &options).unwrap();

    let cross_table = report.layer(Layer::CrossTable).unwrap();
    assert_eq!(cross_table.weight, 3.0);
    assert_eq!((cross_table.checked, cross_table.passed), (6, 5));
    assert!((cross_table.score - 500.0 / 6.0).abs() < 1e-9);
    let expected = (100.0 + 3.0 * cross_table.score) / 4.0;
    assert!((report.score - expected).abs() < 1e-9);
}

#[test]
fn structural_failure_blocks_above_the_threshold() {
    let mut rows = clean_ae();
    rows[1].seq = 1;
    let tables = study(dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]), ae(&rows));
    let registry = DomainRegistry::builtin();
    let options = ConformanceOptions {
        ready_threshold: 50.0,
        ..ConformanceOptions::default()
    };

    let report = validate(&ConformanceInput::new(&tables, &registry), &options).unwrap();

    assert!(report.score > 50.0);
    let structural = report.layer(Layer::Structural).unwrap();
    assert!(structural.passed < structural.checked);
    assert!(!report.ready);
}

#[test]
fn weights_outside_the_score_range_are_rejected() {
    let tables = study(
        dm(&["ABC-01-001", "ABC-01-002"], &["Male", "F"]),
        ae(&clean_ae()),
    );
    let registry = DomainRegistry::builtin();
    let input = ConformanceInput::new(&tables, &registry);
    let invalid = [
        LayerWeights {
            structural: 0.0,
            vocabulary: -1.0,
            cross_table: 1.0,
            temporal: 1.0,
        },
        LayerWeights {
            temporal: f64::NAN,
            ..LayerWeights::default()
        },
        LayerWeights {
            structural: 0.0,
            vocabulary: 0.0,
            cross_table: 0.0,
            temporal: 0.0,
        },
    ];

    for weights in invalid {
        let options = ConformanceOptions {
            weights,
            ..ConformanceOptions::default()
        };
        let err = validate(&input, &options).unwrap_err();
        assert!(matches!(err, ConformanceError::InvalidWeights(_)), "{weights:?}");
    }
}

#[test]
fn advisory_defects_do_not_block() {
    let mut rows = clean_ae();
    rows[0].end = "2024-05-01";
    let tables = study(dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]), ae(&rows));

    let report = run(&tables);

    assert_eq!(rules(&report.defects), vec!["TMP004"]);
    assert_eq!(report.counts.advisory, 1);
    assert!((report.score - 100.0).abs() < 1e-9);
    assert!(report.ready);
}

#[test]
fn visits_outside_the_schedule_are_reported() {
    let registry = DomainRegistry::builtin();
    let vs = DomainFrame::new(
        "VS",
        DataFrame::new(vec![
            text("STUDYID", &["ABC", "ABC"]),
            text("DOMAIN", &["VS", "VS"]),
            text("USUBJID", &["ABC-01-001", "ABC-01-001"]),
            int_column("VSSEQ", vec![Some(1), Some(2)]),
            text("VSTESTCD", &["SYSBP", "SYSBP"]),
            text("VSTEST", &["Systolic Blood Pressure", "Systolic Blood Pressure"]),
            text("VSBLFL", &["Y", ""]),
            float_column("VISITNUM", vec![Some(1.0), Some(7.0)]),
        ])
        .unwrap(),
    );
    let tables: ProducedTables = [dm(&["ABC-01-001"], &["M"]), vs].into_iter().collect();
    let schedule = DataFrame::new(vec![text("VISITNUM", &["1", "2"])]).unwrap();
    let input = ConformanceInput::new(&tables, &registry).with_visit_schedule(&schedule);

    let report = validate(&input, &ConformanceOptions::default()).unwrap();

    let visits: Vec<&Defect> = report
        .defects
        .iter()
        .filter(|d| d.rule_id == RuleId::VisitNotInSchedule)
        .collect();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].records[0].seq, Some(2));
    assert_eq!(visits[0].message, "VISITNUM 7 is not in the visit schedule");
}

#[test]
fn multiple_baseline_flags_are_blocking() {
    let registry = DomainRegistry::builtin();
    let vs = DomainFrame::new(
        "VS",
        DataFrame::new(vec![
            text("USUBJID", &["ABC-01-001", "ABC-01-001", "ABC-01-001"]),
            int_column("VSSEQ", vec![Some(1), Some(2), Some(3)]),
            text("VSTESTCD", &["SYSBP", "SYSBP", "DIABP"]),
            text("VSBLFL", &["Y", "Y", "N"]),
        ])
        .unwrap(),
    );
    let tables: ProducedTables = [vs].into_iter().collect();

    let report = validate(&ConformanceInput::new(&tables, &registry), &ConformanceOptions::default()).unwrap();

    let temporal: Vec<&str> = report
        .defects
        .iter()
        .filter(|d| d.rule_id.layer() == Some(Layer::Temporal))
        .map(|d| d.rule_id.code())
        .collect();
    assert_eq!(temporal, vec!["TMP002", "TMP003"]);
}

#[test]
fn table_without_subject_key_is_rejected() {
    let registry = DomainRegistry::builtin();
    let ae = DomainFrame::new(
        "AE",
        DataFrame::new(vec![text("AETERM", &["HEADACHE"])]).unwrap(),
    );
    let tables: ProducedTables = [ae].into_iter().collect();

    let err = validate(&ConformanceInput::new(&tables, &registry), &ConformanceOptions::default())
        .unwrap_err();
    assert!(matches!(err, ConformanceError::MissingSubjectKey { ref domain } if domain == "AE"));
}

#[test]
fn derivation_defects_clear_readiness() {
    let tables = study(
        dm(&["ABC-01-001", "ABC-01-002"], &["M", "F"]),
        ae(&clean_ae()),
    );
    let mut report = run(&tables);
    assert!(report.ready);

    report.absorb(vec![
        Defect::new(RuleId::UnknownTestCode, "LB", "test code synthesized"),
        Defect::new(RuleId::DerivationFailed, "CM", "derivation failed"),
    ]);

    assert!(!report.ready);
    assert_eq!(rules(&report.defects), vec!["DRV005", "DRV003"]);
    let domains: Vec<&str> = report.domains.iter().map(|d| d.domain.as_str()).collect();
    assert_eq!(domains, vec!["AE", "CM", "DM", "LB"]);
    assert_eq!(report.domain("CM").unwrap().blocking, 1);
}

#[test]
fn report_serializes_rule_codes() {
    let tables = study(
        dm(&["ABC-01-001", "ABC-01-002"], &["Male", "F"]),
        ae(&clean_ae()),
    );
    let report = run(&tables);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["ready"], false);
    assert_eq!(json["defects"][0]["rule_id"], "VOC001");
    assert_eq!(json["layers"][0]["layer"], "structural");
    insta::assert_snapshot!(report.defects[0].message.clone(), @"SEX value 'Male' is not in codelist Sex (C66731)");
}
