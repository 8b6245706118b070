use std::io::Write;
use std::path::Path;

use sdtm_standards::{DomainRegistry, StandardsError, load_ct_csv, parse_ct_reader};

const CT_EXPORT: &str = "\
Code,Codelist Code,Codelist Extensible (Yes/No),Codelist Name,CDISC Submission Value,CDISC Synonym(s),NCI Preferred Term
C66731,,No,Sex,SEX,,CDISC SDTM Sex of Individual Terminology
C16576,C66731,,Sex,F,Female,Female
C20197,C66731,,Sex,M,Male,Male
C17998,C66731,,Sex,U,U; UNK; Unknown,Unknown
C66742,,No,No Yes Response,NY,,CDISC SDTM Yes No Terminology
C49487,C66742,,No Yes Response,N,No,No
C49488,C66742,,No Yes Response,Y,Yes,Yes
C66728,,Yes,Relation to Reference Period,STENRF,,
C25629,C66728,,Relation to Reference Period,BEFORE,,Prior
";

#[test]
fn parses_codelist_and_term_rows() {
    let codelists = parse_ct_reader(CT_EXPORT.as_bytes(), Path::new("ct.csv")).expect("parse");
    let codes: Vec<&str> = codelists.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["C66728", "C66731", "C66742"]);

    let sex = &codelists[1];
    assert!(!sex.extensible);
    assert_eq!(sex.name, "Sex");
    assert_eq!(sex.submission_values(), vec!["F", "M", "U"]);
    assert_eq!(sex.normalize("unk"), Some("U"));
    assert!(codelists[0].extensible);
}

#[test]
fn missing_required_column_is_an_error() {
    let err = parse_ct_reader("Code,Name\nC1,x\n".as_bytes(), Path::new("bad.csv"))
        .expect_err("missing columns");
    assert!(matches!(err, StandardsError::MissingColumn { ref column, .. } if column == "Codelist Code"));
}

#[test]
fn loads_from_disk_and_merges_into_registry() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(CT_EXPORT.as_bytes()).expect("write");
    let codelists = load_ct_csv(file.path()).expect("load");

    let mut registry = DomainRegistry::builtin();
    let before = registry.codelist_count();
    let merged = registry.merge_codelists(codelists);
    assert_eq!(merged, 3);
    assert_eq!(registry.codelist_count(), before + 1);
    assert!(registry.codelist("C66728").is_some());
}

#[test]
fn missing_file_reports_path() {
    let err = load_ct_csv(Path::new("/nonexistent/ct.csv")).expect_err("missing file");
    insta::assert_snapshot!(
        err.to_string().split(':').next().unwrap_or_default(),
        @"failed to read file /nonexistent/ct.csv"
    );
}
