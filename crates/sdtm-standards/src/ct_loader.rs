//! Loader for CDISC Controlled Terminology CSV exports.
//!
//! Each export holds two kinds of rows. Codelist rows have a blank
//! `Codelist Code` and carry the codelist's own NCI code in `Code` plus its
//! extensibility. Term rows name their parent in `Codelist Code` and carry the
//! permissible value in `CDISC Submission Value`.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use sdtm_model::{Codelist, Term};
use tracing::debug;

use crate::error::StandardsError;

const COL_CODE: &str = "Code";
const COL_CODELIST_CODE: &str = "Codelist Code";
const COL_CODELIST_NAME: &str = "Codelist Name";
const COL_EXTENSIBLE: &str = "Codelist Extensible (Yes/No)";
const COL_SUBMISSION_VALUE: &str = "CDISC Submission Value";
const COL_SYNONYMS: &str = "CDISC Synonym(s)";
const COL_PREFERRED_TERM: &str = "NCI Preferred Term";

fn header_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn get_string(row: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_yes_no(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

fn split_synonyms(value: Option<String>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Loads a CT export from disk.
pub fn load_ct_csv(path: &Path) -> Result<Vec<Codelist>, StandardsError> {
    let file = std::fs::File::open(path).map_err(|e| StandardsError::io(path, e))?;
    let codelists = parse_ct_reader(file, path)?;
    debug!(
        path = %path.display(),
        codelists = codelists.len(),
        "loaded controlled terminology"
    );
    Ok(codelists)
}

/// Parses a CT export from any reader. `source` is only used in errors.
pub fn parse_ct_reader<R: Read>(reader: R, source: &Path) -> Result<Vec<Codelist>, StandardsError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| StandardsError::csv(source, &e))?
        .clone();

    let idx_codelist_code = header_index(&headers, COL_CODELIST_CODE).ok_or_else(|| {
        StandardsError::MissingColumn {
            path: source.to_path_buf(),
            column: COL_CODELIST_CODE.to_string(),
        }
    })?;
    let idx_submission_value = header_index(&headers, COL_SUBMISSION_VALUE).ok_or_else(|| {
        StandardsError::MissingColumn {
            path: source.to_path_buf(),
            column: COL_SUBMISSION_VALUE.to_string(),
        }
    })?;
    let idx_code = header_index(&headers, COL_CODE);
    let idx_name = header_index(&headers, COL_CODELIST_NAME);
    let idx_extensible = header_index(&headers, COL_EXTENSIBLE);
    let idx_synonyms = header_index(&headers, COL_SYNONYMS);
    let idx_preferred = header_index(&headers, COL_PREFERRED_TERM);

    let mut codelists: BTreeMap<String, Codelist> = BTreeMap::new();

    for row in reader.records() {
        let row = row.map_err(|e| StandardsError::csv(source, &e))?;
        let name = get_string(&row, idx_name).unwrap_or_default();
        let extensible = get_string(&row, idx_extensible)
            .as_deref()
            .and_then(parse_yes_no);

        match get_string(&row, Some(idx_codelist_code)) {
            None => {
                // Codelist row: its own NCI code lives in `Code`.
                let Some(code) = get_string(&row, idx_code) else {
                    continue;
                };
                let entry = codelists
                    .entry(code.to_uppercase())
                    .or_insert_with(|| Codelist::new(&code, &name, extensible.unwrap_or(true)));
                if let Some(extensible) = extensible {
                    entry.extensible = extensible;
                }
                if entry.name.is_empty() {
                    entry.name = name;
                }
            }
            Some(parent) => {
                let Some(submission_value) = get_string(&row, Some(idx_submission_value)) else {
                    continue;
                };
                let codelist = codelists
                    .entry(parent.to_uppercase())
                    .or_insert_with(|| Codelist::new(&parent, &name, extensible.unwrap_or(true)));
                codelist.add_term(Term {
                    code: get_string(&row, idx_code).unwrap_or_default(),
                    submission_value,
                    synonyms: split_synonyms(get_string(&row, idx_synonyms)),
                    preferred_term: get_string(&row, idx_preferred),
                });
            }
        }
    }

    Ok(codelists.into_values().collect())
}
