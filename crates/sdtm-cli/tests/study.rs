use std::fs;
use std::path::Path;

use sdtm_cli::config::RunConfig;
use sdtm_cli::pipeline::{StudyReport, load_registry, read_study_sources, run_study, write_report};
use sdtm_model::RuleId;
use sdtm_standards::DomainRegistry;
use tempfile::TempDir;

const DM: &str = "\
STUDYID,SITEID,SUBJID,RFSTDTC,RFENDTC,SEX,AGE
ABC,01,001,2024-01-15,2024-03-01,M,34
ABC,01,002,2024-02-01,2024-04-01,F,51
";

const AE: &str = "\
STUDYID,SITEID,SUBJID,AETERM,AESTDTC,AEENDTC
ABC,01,001,HEADACHE,2024-01-20,2024-01-22
ABC,01,002,NAUSEA,2024-02-03,2024-02-04
";

fn study_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn run(dir: &Path) -> sdtm_cli::pipeline::StudyOutcome {
    let registry = DomainRegistry::builtin();
    run_study(dir, &RunConfig::default(), &registry, None).unwrap()
}

#[test]
fn reads_only_files_that_name_a_domain() {
    let dir = study_dir(&[("dm.csv", DM), ("study_ae.csv", AE), ("notes.csv", "A,B\n1,2\n")]);
    let registry = DomainRegistry::builtin();
    let raw = read_study_sources(dir.path(), &registry).unwrap();
    assert_eq!(raw.keys().map(String::as_str).collect::<Vec<_>>(), vec!["AE", "DM"]);
    assert_eq!(raw["DM"].height(), 2);
}

#[test]
fn clean_study_is_ready() {
    let dir = study_dir(&[("dm.csv", DM), ("ae.csv", AE)]);
    let outcome = run(dir.path());

    assert_eq!(outcome.report.order, vec!["DM", "AE"]);
    assert!(outcome.report.failed.is_empty());
    assert_eq!(outcome.report.conformance.counts.blocking, 0);
    assert!(outcome.report.ready());
    assert_eq!(outcome.tables.get("AE").unwrap().record_count(), 2);
}

#[test]
fn subject_missing_from_dm_blocks_the_study() {
    let ae = format!("{AE}ABC,01,099,RASH,2024-02-10,\n");
    let dir = study_dir(&[("dm.csv", DM), ("ae.csv", &ae)]);
    let outcome = run(dir.path());

    let conformance = &outcome.report.conformance;
    let dangling: Vec<_> = conformance
        .defects
        .iter()
        .filter(|d| d.rule_id == RuleId::SubjectNotInDm)
        .collect();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].domain, "AE");
    assert!(!outcome.report.ready());
}

#[test]
fn missing_required_dependency_is_an_error() {
    let dir = study_dir(&[("ae.csv", AE)]);
    let registry = DomainRegistry::builtin();
    let error = run_study(dir.path(), &RunConfig::default(), &registry, None).unwrap_err();
    assert!(format!("{error:#}").contains("AE requires DM"));
}

#[test]
fn report_round_trips_through_json() {
    let dir = study_dir(&[("dm.csv", DM), ("ae.csv", AE)]);
    let outcome = run(dir.path());
    let path = dir.path().join("report.json");
    write_report(&path, &outcome.report).unwrap();

    let parsed: StudyReport = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed.order, outcome.report.order);
    assert_eq!(parsed.conformance.defects, outcome.report.conformance.defects);
    assert_eq!(parsed.ready(), outcome.report.ready());
}

#[test]
fn threshold_from_config_controls_the_verdict() {
    let dir = study_dir(&[("dm.csv", DM), ("ae.csv", AE)]);
    let config = RunConfig::from_toml("[conformance]\nready_threshold = 101.0\n").unwrap();
    let registry = DomainRegistry::builtin();
    let outcome = run_study(dir.path(), &config, &registry, None).unwrap();
    assert!(!outcome.report.ready());
}

#[test]
fn controlled_terminology_export_extends_codelists() {
    let ct = "\
Code,Codelist Code,Codelist Extensible (Yes/No),Codelist Name,CDISC Submission Value
C66731,,No,Sex,SEX
C99999,C66731,,Sex,UNDIFFERENTIATED
";
    let dir = study_dir(&[("ct.csv", ct)]);
    let registry = load_registry(Some(&dir.path().join("ct.csv"))).unwrap();
    let sex = registry.codelist("C66731").unwrap();
    assert!(sex.contains("UNDIFFERENTIATED"));
    assert!(sex.contains("M"));
}

#[test]
fn unreadable_terminology_is_reported_with_its_path() {
    let error = load_registry(Some(Path::new("/nonexistent/ct.csv"))).unwrap_err();
    assert!(format!("{error:#}").contains("/nonexistent/ct.csv"));
}
