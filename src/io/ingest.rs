//! CSV ingest and row admission.
//!
//! This module turns an uploaded CSV (file, stdin, or any reader) into a
//! `RawTable`:
//!
//! - header names are trimmed (and a UTF-8 BOM removed) so lookups are exact
//! - every cell is trimmed
//! - rows with a missing cell are dropped, not imputed
//!
//! No numeric interpretation happens here; that is the feature pipeline's job.

use std::fs::File;
use std::io::Read;

use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{CsvSource, RawRow, RawTable};
use crate::error::{DataError, ForecastError};

/// Cell values treated as missing, in addition to the empty string.
const NA_MARKERS: [&str; 18] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN",
];

/// Open the configured source and read it into a `RawTable`.
pub fn load_raw_table(source: &CsvSource) -> Result<RawTable, ForecastError> {
    let table = match source {
        CsvSource::Path(path) => {
            let file = File::open(path).map_err(|source| DataError::Open {
                path: path.clone(),
                source,
            })?;
            read_raw_table(file)?
        }
        CsvSource::Stdin => read_raw_table(std::io::stdin().lock())?,
    };

    info!(
        source = %source.describe(),
        columns = table.headers.len(),
        rows_read = table.rows_read,
        rows_used = table.rows_used(),
        "loaded upload"
    );
    Ok(table)
}

/// Read a CSV with a header row from any reader.
pub fn read_raw_table<R: Read>(reader: R) -> Result<RawTable, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_header_name)
        .collect();

    let mut rows = Vec::new();
    let mut dropped_lines = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        rows_read += 1;

        // Records start on line 2 (the header is line 1) unless the reader knows better.
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        if record.len() > headers.len() {
            return Err(DataError::RaggedRow {
                line,
                expected: headers.len(),
                found: record.len(),
            });
        }

        match admit_row(&record, headers.len()) {
            Some(cells) => rows.push(RawRow { line, cells }),
            None => {
                debug!(line, "dropping row with missing values");
                dropped_lines.push(line);
            }
        }
    }

    Ok(RawTable {
        headers,
        rows,
        rows_read,
        dropped_lines,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    name.trim_start_matches('\u{feff}').trim().to_string()
}

/// Returns the row's cells if none is missing.
fn admit_row(record: &StringRecord, width: usize) -> Option<Vec<String>> {
    if record.len() < width {
        return None;
    }
    let mut cells = Vec::with_capacity(width);
    for cell in record.iter() {
        let cell = cell.trim();
        if is_missing(cell) {
            return None;
        }
        cells.push(cell.to_string());
    }
    Some(cells)
}

pub fn is_missing(cell: &str) -> bool {
    cell.is_empty() || NA_MARKERS.contains(&cell)
}
