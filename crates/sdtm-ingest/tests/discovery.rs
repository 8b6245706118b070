//! Tests for domain file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use sdtm_ingest::{IngestError, discover_domain_files, list_csv_files};

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "A,B\n1,2\n").expect("write file");
    path
}

#[test]
fn discovers_domains_and_skips_unknown_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    touch(dir.path(), "dm.csv");
    touch(dir.path(), "ae.csv");
    touch(dir.path(), "AE2.csv");
    touch(dir.path(), "lb_raw.csv");
    touch(dir.path(), "README.csv");
    touch(dir.path(), "notes.txt");

    let files = list_csv_files(dir.path()).expect("list csv");
    assert_eq!(files.len(), 5);

    let discovered = discover_domain_files(&files, &["DM", "AE", "LB", "VS"]);
    let summary: Vec<(&str, usize)> = discovered
        .iter()
        .map(|(domain, paths)| (domain.as_str(), paths.len()))
        .collect();
    assert_eq!(summary, vec![("AE", 2), ("DM", 1), ("LB", 1)]);
}

#[test]
fn missing_directory_is_an_error() {
    let err = list_csv_files(Path::new("/nonexistent/study")).expect_err("missing dir");
    assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
}
