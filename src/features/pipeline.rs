//! Raw table → model-ready feature table.
//!
//! Steps, in order:
//!
//! 1. resolve the designated columns (missing ones are a `DataError`)
//! 2. parse the timestamp column
//! 3. clean and parse the two load columns (thousands separators allowed)
//! 4. derive `PGE_Malin_Delta`, `Load_Delta`, `Load_Sum`
//! 5. drop the target, timestamp and four source columns
//! 6. coerce every remaining column; unparseable cells are rejected
//! 7. standardize with statistics from this batch
//!
//! Row admission (dropping incomplete rows) already happened in ingest.

use nalgebra::DMatrix;
use tracing::{debug, info};

use crate::domain::{
    DegeneratePolicy, FeatureSchema, FeatureTable, LOAD_DELTA, LOAD_SUM, PGE_MALIN_DELTA, RawTable,
    RowStamp, ScalingParameters,
};
use crate::error::DataError;
use crate::features::clean::{coerce_numeric, parse_load, parse_strict, parse_timestamp};
use crate::math::standardize;

/// Everything the pipeline produces for one upload.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// One entry per surviving row, in original order.
    pub stamps: Vec<RowStamp>,
    /// Engineered features before scaling.
    pub processed: FeatureTable,
    /// Scaled features, ready for inference.
    pub features: FeatureTable,
    pub scaling: ScalingParameters,
}

/// Column positions of the designated inputs.
struct SourceColumns {
    timestamp: usize,
    load_a: usize,
    load_b: usize,
    price_a: usize,
    price_b: usize,
}

/// Run the full feature pipeline on an admitted raw table.
pub fn transform(
    raw: &RawTable,
    schema: &FeatureSchema,
    policy: DegeneratePolicy,
) -> Result<TransformOutput, DataError> {
    let src = resolve_source_columns(raw, schema)?;

    let stamps = extract_stamps(raw, &schema.timestamp, src.timestamp)?;
    let load_a = numeric_column(raw, &schema.load_a, src.load_a, parse_load)?;
    let load_b = numeric_column(raw, &schema.load_b, src.load_b, parse_load)?;
    let price_a = numeric_column(raw, &schema.price_a, src.price_a, parse_strict)?;
    let price_b = numeric_column(raw, &schema.price_b, src.price_b, parse_strict)?;

    let derived = [
        (
            PGE_MALIN_DELTA,
            price_a.iter().zip(&price_b).map(|(a, b)| a - b).collect::<Vec<_>>(),
        ),
        (
            LOAD_DELTA,
            load_a.iter().zip(&load_b).map(|(a, b)| a - b).collect(),
        ),
        (
            LOAD_SUM,
            load_a.iter().zip(&load_b).map(|(a, b)| a + b).collect(),
        ),
    ];
    for (name, values) in &derived {
        check_finite(raw, name, values)?;
    }

    let excluded = schema.excluded_columns();
    let mut columns: Vec<String> = Vec::new();
    let mut data: Vec<Vec<f64>> = Vec::new();

    for (idx, name) in raw.headers.iter().enumerate() {
        if excluded.contains(&name.as_str()) {
            continue;
        }
        columns.push(name.clone());
        if derived.iter().any(|(d, _)| d == name) {
            // Overwritten below; the upload's own values are never read.
            data.push(Vec::new());
        } else {
            data.push(coerced_column(raw, name, idx)?);
        }
    }

    // A derived feature replaces an upload column of the same name in place;
    // otherwise it is appended.
    for (name, values) in derived {
        match columns.iter().position(|c| c == name) {
            Some(pos) => data[pos] = values,
            None => {
                columns.push(name.to_string());
                data.push(values);
            }
        }
    }

    debug!(columns = ?columns, "feature layout");

    let processed = to_table(columns, &data, raw.rows.len());
    let (features, scaling) = standardize(&processed, policy)?;

    info!(
        rows = features.n_rows(),
        features = features.n_cols(),
        degenerate = scaling.degenerate.len(),
        "feature pipeline complete"
    );

    Ok(TransformOutput {
        stamps,
        processed,
        features,
        scaling,
    })
}

fn resolve_source_columns(raw: &RawTable, schema: &FeatureSchema) -> Result<SourceColumns, DataError> {
    let find = |name: &str| {
        raw.column_index(name).ok_or_else(|| DataError::MissingColumn {
            column: name.to_string(),
        })
    };

    Ok(SourceColumns {
        timestamp: find(&schema.timestamp)?,
        load_a: find(&schema.load_a)?,
        load_b: find(&schema.load_b)?,
        price_a: find(&schema.price_a)?,
        price_b: find(&schema.price_b)?,
    })
}

fn extract_stamps(raw: &RawTable, column: &str, idx: usize) -> Result<Vec<RowStamp>, DataError> {
    raw.rows
        .iter()
        .map(|row| {
            let value = &row.cells[idx];
            let timestamp = parse_timestamp(value).ok_or_else(|| DataError::InvalidTimestamp {
                column: column.to_string(),
                line: row.line,
                value: value.clone(),
            })?;
            Ok(RowStamp {
                line: row.line,
                timestamp,
            })
        })
        .collect()
}

/// Parse a designated column; any failure aborts the run.
fn numeric_column(
    raw: &RawTable,
    column: &str,
    idx: usize,
    parse: fn(&str) -> Option<f64>,
) -> Result<Vec<f64>, DataError> {
    raw.rows
        .iter()
        .map(|row| {
            let value = &row.cells[idx];
            parse(value).ok_or_else(|| DataError::InvalidNumber {
                column: column.to_string(),
                line: row.line,
                value: value.clone(),
            })
        })
        .collect()
}

/// Coerce a generic feature column. Cells that do not convert are undefined,
/// and an undefined cell can never be scaled, so it ends the run here.
fn coerced_column(raw: &RawTable, column: &str, idx: usize) -> Result<Vec<f64>, DataError> {
    raw.rows
        .iter()
        .map(|row| {
            let value = &row.cells[idx];
            coerce_numeric(value).ok_or_else(|| DataError::UndefinedCell {
                column: column.to_string(),
                line: row.line,
                value: value.clone(),
            })
        })
        .collect()
}

/// Derived features can overflow even when every input cell is finite.
fn check_finite(raw: &RawTable, column: &str, values: &[f64]) -> Result<(), DataError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(DataError::UndefinedCell {
            column: column.to_string(),
            line: raw.rows[i].line,
            value: values[i].to_string(),
        }),
        None => Ok(()),
    }
}

fn to_table(columns: Vec<String>, data: &[Vec<f64>], n_rows: usize) -> FeatureTable {
    let values = DMatrix::from_fn(n_rows, columns.len(), |i, j| data[j][i]);
    FeatureTable::new(columns, values)
}
