//! File discovery and domain matching.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Lists all CSV files in a directory, sorted by file name.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let read_error = |source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Groups CSV files by the domain code their file name refers to.
///
/// `dm.csv`, `STUDY_AE.csv`, `lb_raw.csv` and `LB2.csv` all match. Files
/// that name no known domain are skipped.
pub fn discover_domain_files(
    csv_files: &[PathBuf],
    known_domains: &[&str],
) -> BTreeMap<String, Vec<PathBuf>> {
    let mut by_length: Vec<String> = known_domains.iter().map(|d| d.to_uppercase()).collect();
    by_length.sort_by_key(|domain| std::cmp::Reverse(domain.len()));

    let mut domain_files: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in csv_files {
        let stem = path
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or_default()
            .to_uppercase();
        if let Some(domain) = match_domain(&stem, &by_length) {
            domain_files.entry(domain).or_default().push(path.clone());
        }
    }
    domain_files
}

fn match_domain(stem: &str, domains: &[String]) -> Option<String> {
    let parts: Vec<&str> = stem.split(['_', '-', ' ', '.']).collect();
    // Whole-part matches are tried before numbered prefixes.
    for part in &parts {
        if let Some(domain) = domains.iter().find(|d| d.as_str() == *part) {
            return Some(domain.clone());
        }
    }
    for part in &parts {
        for domain in domains {
            if let Some(rest) = part.strip_prefix(domain.as_str())
                && rest.chars().all(|c| c.is_ascii_digit())
            {
                return Some(domain.clone());
            }
        }
    }
    None
}
