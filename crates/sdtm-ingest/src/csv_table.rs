use std::collections::HashSet;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use polars::prelude::DataFrame;
use sdtm_common::string_column;
use tracing::debug;

use crate::error::{IngestError, Result};

/// A raw CSV export: trimmed headers and rows padded to the header width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Appends another table; columns are unioned in first-seen order.
    pub fn stack(&mut self, other: CsvTable) {
        let mut positions = Vec::with_capacity(other.headers.len());
        for header in &other.headers {
            let position = match self.headers.iter().position(|h| h == header) {
                Some(position) => position,
                None => {
                    self.headers.push(header.clone());
                    for row in &mut self.rows {
                        row.push(String::new());
                    }
                    self.headers.len() - 1
                }
            };
            positions.push(position);
        }
        for row in other.rows {
            let mut stacked = vec![String::new(); self.headers.len()];
            for (value, position) in row.into_iter().zip(&positions) {
                stacked[*position] = value;
            }
            self.rows.push(stacked);
        }
    }

    /// Converts to a frame of string columns.
    pub fn into_frame(self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.headers.len());
        for (idx, header) in self.headers.iter().enumerate() {
            let values: Vec<String> = self
                .rows
                .iter()
                .map(|row| row.get(idx).cloned().unwrap_or_default())
                .collect();
            columns.push(string_column(header, values));
        }
        Ok(DataFrame::new(columns)?)
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn csv_error(path: &Path, error: &csv::Error) -> IngestError {
    IngestError::Csv {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

/// Reads a CSV export. Blank lines are skipped and the first non-blank row
/// is the header.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| match e.into_kind() {
            csv::ErrorKind::Io(source) => IngestError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => IngestError::Csv {
                path: path.to_path_buf(),
                message: format!("{other:?}"),
            },
        })?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, &e))?;
        let cells: Vec<String> = record.iter().map(normalize_cell).collect();
        if cells.iter().all(String::is_empty) {
            continue;
        }
        match &headers {
            None => headers = Some(record.iter().map(normalize_header).collect()),
            Some(header_row) => {
                let mut row = cells;
                row.resize(header_row.len(), String::new());
                rows.push(row);
            }
        }
    }

    let headers = headers.ok_or_else(|| IngestError::MissingHeader {
        path: path.to_path_buf(),
    })?;
    let mut seen = HashSet::new();
    for header in &headers {
        if !seen.insert(header.to_ascii_uppercase()) {
            return Err(IngestError::DuplicateColumn {
                path: path.to_path_buf(),
                column: header.clone(),
            });
        }
    }
    debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "read csv table"
    );
    Ok(CsvTable { headers, rows })
}

/// Reads one CSV export straight into a string frame.
pub fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    read_csv_table(path)?.into_frame()
}

/// Reads and stacks every file discovered for one domain.
pub fn read_domain_frame(paths: &[PathBuf]) -> Result<DataFrame> {
    let mut stacked = CsvTable::default();
    for path in paths {
        stacked.stack(read_csv_table(path)?);
    }
    stacked.into_frame()
}
