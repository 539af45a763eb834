//! Export predictions (and the scaled features) to CSV.
//!
//! The prediction export is the primary output of the tool: a two-column table
//! `Date/Time,<prediction name>` in row order, easy to open in a spreadsheet.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{FeatureTable, Prediction, RowStamp};
use crate::error::{AppError, OUTPUT_EXIT_CODE};

/// Timestamp layout used in every export.
pub const EXPORT_TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Header of the timestamp column in exports.
pub const EXPORT_TIMESTAMP_HEADER: &str = "Date/Time";

/// Write predictions as CSV to any writer.
pub fn write_predictions<W: Write>(writer: W, predictions: &[Prediction], value_name: &str) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([EXPORT_TIMESTAMP_HEADER, value_name])
        .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to write predictions header: {e}")))?;

    for p in predictions {
        wtr.write_record([
            p.timestamp.format(EXPORT_TIMESTAMP_FMT).to_string(),
            p.value.to_string(),
        ])
        .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to write prediction row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to flush predictions CSV: {e}")))?;
    Ok(())
}

/// Render predictions as an in-memory CSV document.
pub fn predictions_to_csv_string(predictions: &[Prediction], value_name: &str) -> Result<String, AppError> {
    let mut buf = Vec::new();
    write_predictions(&mut buf, predictions, value_name)?;
    String::from_utf8(buf).map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Predictions CSV is not UTF-8: {e}")))
}

/// Write predictions to a CSV file.
pub fn write_predictions_csv(path: &Path, predictions: &[Prediction], value_name: &str) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_predictions(file, predictions, value_name)
}

/// Write a feature table (with its timestamps) to a CSV file.
pub fn write_features_csv(path: &Path, stamps: &[RowStamp], features: &FeatureTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to create features CSV '{}': {e}", path.display())))?;
    write_features(file, stamps, features)
}

pub fn write_features<W: Write>(writer: W, stamps: &[RowStamp], features: &FeatureTable) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![EXPORT_TIMESTAMP_HEADER.to_string()];
    header.extend(features.columns.iter().cloned());
    wtr.write_record(&header)
        .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to write features header: {e}")))?;

    for (i, stamp) in stamps.iter().enumerate().take(features.n_rows()) {
        let mut record = Vec::with_capacity(features.n_cols() + 1);
        record.push(stamp.timestamp.format(EXPORT_TIMESTAMP_FMT).to_string());
        record.extend(features.values.row(i).iter().map(|v| format!("{v:.10}")));
        wtr.write_record(&record)
            .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to write features row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(OUTPUT_EXIT_CODE, format!("Failed to flush features CSV: {e}")))?;
    Ok(())
}
