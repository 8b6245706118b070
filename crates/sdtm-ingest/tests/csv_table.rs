use std::fs;
use std::path::PathBuf;

use sdtm_common::column_strings;
use sdtm_ingest::{CsvTable, IngestError, read_csv_frame, read_csv_table, read_domain_frame};

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write csv");
    path
}

#[test]
fn reads_headers_and_pads_short_rows() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write(
        &dir,
        "dm.csv",
        "\u{feff}STUDYID, SITEID ,SUBJID,SEX\n\nS1,001,0001,M\nS1,001,0002\n",
    );
    let table = read_csv_table(&path).expect("read");
    assert_eq!(table.headers, vec!["STUDYID", "SITEID", "SUBJID", "SEX"]);
    assert_eq!(table.height(), 2);
    assert_eq!(table.rows[1], vec!["S1", "001", "0002", ""]);
}

#[test]
fn frame_holds_string_columns() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write(&dir, "vs.csv", "SUBJID,WEIGHT\n0001, 70.5 \n0002,\n");
    let df = read_csv_frame(&path).expect("frame");
    assert_eq!(df.height(), 2);
    assert_eq!(column_strings(&df, "WEIGHT").unwrap(), vec!["70.5", ""]);
}

#[test]
fn duplicate_headers_are_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write(&dir, "ae.csv", "AETERM,aeterm\nx,y\n");
    let err = read_csv_table(&path).expect_err("duplicate");
    assert!(matches!(err, IngestError::DuplicateColumn { ref column, .. } if column == "aeterm"));
}

#[test]
fn empty_file_has_no_header() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write(&dir, "empty.csv", "\n\n");
    assert!(matches!(
        read_csv_table(&path),
        Err(IngestError::MissingHeader { .. })
    ));
}

#[test]
fn stacking_unions_columns() {
    let mut first = CsvTable {
        headers: vec!["SUBJID".to_string(), "HGB".to_string()],
        rows: vec![vec!["1".to_string(), "13".to_string()]],
    };
    first.stack(CsvTable {
        headers: vec!["GLUC".to_string(), "SUBJID".to_string()],
        rows: vec![vec!["5.1".to_string(), "2".to_string()]],
    });
    assert_eq!(first.headers, vec!["SUBJID", "HGB", "GLUC"]);
    assert_eq!(
        first.rows,
        vec![
            vec!["1".to_string(), "13".to_string(), String::new()],
            vec!["2".to_string(), String::new(), "5.1".to_string()],
        ]
    );
}

#[test]
fn domain_frame_stacks_split_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let a = write(&dir, "ae.csv", "SUBJID,AETERM\n1,Headache\n");
    let b = write(&dir, "ae2.csv", "SUBJID,AETERM\n2,Nausea\n");
    let df = read_domain_frame(&[a, b]).expect("stacked");
    assert_eq!(
        column_strings(&df, "AETERM").unwrap(),
        vec!["Headache", "Nausea"]
    );
}
