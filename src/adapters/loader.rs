//! Delimited file adapter: Implementation of RecordSource.
//!
//! Reads the raw Cleveland layout: one record per line, 14 delimited numeric
//! fields in `COLUMN_NAMES` order, `?` marking a missing value.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::domain::{DataError, LoadReport, LoadedRecords, Record, COLUMN_COUNT, COLUMN_NAMES};
use crate::ports::RecordSource;

/// Token marking a missing value in the raw data.
pub const MISSING_SENTINEL: &str = "?";

/// Field delimiter of the raw data files.
pub const DEFAULT_DELIMITER: char = ',';

/// Record source backed by a delimited text file.
#[derive(Debug, Clone)]
pub struct DelimitedFileSource {
    path: PathBuf,
    delimiter: char,
}

impl DelimitedFileSource {
    /// Comma-delimited source at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: DEFAULT_DELIMITER,
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for DelimitedFileSource {
    fn load(&self) -> Result<LoadedRecords, DataError> {
        let file = File::open(&self.path).map_err(|source| DataError::Io {
            path: self.path.clone(),
            source,
        })?;
        let loaded = parse_records(BufReader::new(file), self.delimiter).map_err(|e| match e {
            DataError::Io { source, .. } => DataError::Io {
                path: self.path.clone(),
                source,
            },
            other => other,
        })?;

        tracing::info!(
            path = %self.path.display(),
            rows_read = loaded.report.rows_read,
            rows_dropped = loaded.report.rows_dropped,
            "Records loaded"
        );
        Ok(loaded)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Load comma-delimited records from `path`.
///
/// # Errors
/// See [`parse_records`]; an unreadable file is `DataError::Io`.
pub fn load_records(path: impl AsRef<Path>) -> Result<LoadedRecords, DataError> {
    DelimitedFileSource::new(path.as_ref()).load()
}

/// Parse delimited records from any buffered reader.
///
/// Blank lines are skipped. A row with a missing field (the `?` sentinel or
/// an empty token) is dropped and counted in the report.
///
/// # Errors
/// Returns `DataError::ColumnCount` or `DataError::InvalidNumber` naming the
/// 1-based line of the first malformed row, or `DataError::Io` if reading fails.
pub fn parse_records<R: BufRead>(reader: R, delimiter: char) -> Result<LoadedRecords, DataError> {
    let mut records = Vec::new();
    let mut report = LoadReport::default();
    let mut values = Vec::with_capacity(COLUMN_COUNT);

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| DataError::Io {
            path: PathBuf::new(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        report.rows_read += 1;

        let tokens: Vec<&str> = line.split(delimiter).map(str::trim).collect();
        if tokens.len() != COLUMN_COUNT {
            return Err(DataError::ColumnCount {
                line: line_no,
                expected: COLUMN_COUNT,
                found: tokens.len(),
            });
        }

        if tokens.iter().any(|t| t.is_empty() || *t == MISSING_SENTINEL) {
            report.rows_dropped += 1;
            tracing::warn!(line = line_no, "Dropping row with missing value");
            continue;
        }

        values.clear();
        for (column, token) in COLUMN_NAMES.into_iter().zip(&tokens) {
            let value = token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DataError::InvalidNumber {
                    line: line_no,
                    column,
                    value: (*token).to_string(),
                })?;
            values.push(value);
        }

        // Length is COLUMN_COUNT by construction.
        if let Ok(record) = Record::from_columns(&values) {
            records.push(record);
        }
    }

    Ok(LoadedRecords { records, report })
}
