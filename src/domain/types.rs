//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - produced by ingest and consumed by the feature pipeline
//! - handed to any `Model` implementation for batch inference
//! - rendered/exported by the front-end without further conversion

use std::path::PathBuf;

use chrono::NaiveDateTime;
use nalgebra::DMatrix;

/// Name of the derived price spread feature.
pub const PGE_MALIN_DELTA: &str = "PGE_Malin_Delta";
/// Name of the derived load difference feature.
pub const LOAD_DELTA: &str = "Load_Delta";
/// Name of the derived load total feature.
pub const LOAD_SUM: &str = "Load_Sum";

/// Default location of the trained model artifact (relative to the working directory).
pub const DEFAULT_MODEL_PATH: &str = "Saved Models/random_forest_model.json";

/// Designated input columns consumed by the feature pipeline.
///
/// Names are matched exactly after trimming surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    pub timestamp: String,
    /// First load column (also the minuend of `Load_Delta`).
    pub load_a: String,
    /// Second load column.
    pub load_b: String,
    /// First price column (minuend of `PGE_Malin_Delta`).
    pub price_a: String,
    pub price_b: String,
    /// Prediction target; dropped from the features when present in the upload.
    pub target: String,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self {
            timestamp: "Date/Time".to_string(),
            load_a: "NP15_LOAD".to_string(),
            load_b: "SP15_LOAD".to_string(),
            price_a: "PG&E".to_string(),
            price_b: "Malin".to_string(),
            target: "DA SPNP".to_string(),
        }
    }
}

impl FeatureSchema {
    /// Columns that must exist in the upload.
    pub fn required_columns(&self) -> [&str; 5] {
        [
            self.timestamp.as_str(),
            self.load_a.as_str(),
            self.load_b.as_str(),
            self.price_a.as_str(),
            self.price_b.as_str(),
        ]
    }

    /// Columns removed from the feature set (absent ones are ignored).
    pub fn excluded_columns(&self) -> [&str; 6] {
        [
            self.target.as_str(),
            self.timestamp.as_str(),
            self.load_a.as_str(),
            self.price_b.as_str(),
            self.price_a.as_str(),
            self.load_b.as_str(),
        ]
    }
}

/// One admitted row of the uploaded table.
///
/// Every cell is present (rows with missing cells never make it here) and
/// has been trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source CSV (header is line 1).
    pub line: usize,
    pub cells: Vec<String>,
}

/// The uploaded table after header normalization and row admission.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Data records read from the source (admitted or not).
    pub rows_read: usize,
    /// Source lines of records dropped for missing cells.
    pub dropped_lines: Vec<usize>,
}

impl RawTable {
    /// Position of a column by exact (post-trim) name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }
}

/// Timestamp of one surviving row, with the line it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowStamp {
    pub line: usize,
    pub timestamp: NaiveDateTime,
}

/// Dense numeric feature table (rows × columns) with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub values: DMatrix<f64>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, values: DMatrix<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.ncols());
        Self { columns, values }
    }

    /// A table with the given columns and no rows.
    pub fn empty(columns: Vec<String>) -> Self {
        let n = columns.len();
        Self {
            columns,
            values: DMatrix::zeros(0, n),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy of a column's values, by name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.values.column(idx).iter().copied().collect())
    }

    /// Copy of one row's values in column order.
    pub fn row(&self, idx: usize) -> Vec<f64> {
        self.values.row(idx).iter().copied().collect()
    }
}

/// What to do with a column whose standard deviation is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneratePolicy {
    /// Fail the run with a `DataError` naming the column(s).
    #[default]
    Reject,
    /// Subtract the mean but do not divide (the column becomes all zeros).
    Center,
}

/// Per-column mean and population standard deviation of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingParameters {
    pub columns: Vec<String>,
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
    /// Columns that could not be divided by their std (only under `Center`).
    pub degenerate: Vec<String>,
}

/// One model output paired with the row it was computed for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub line: usize,
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Where the uploaded CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvSource {
    Path(PathBuf),
    Stdin,
}

impl CsvSource {
    /// `-` means stdin, anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            CsvSource::Stdin
        } else {
            CsvSource::Path(PathBuf::from(arg))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CsvSource::Path(p) => p.display().to_string(),
            CsvSource::Stdin => "<stdin>".to_string(),
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub csv: CsvSource,
    pub model_path: PathBuf,
    pub schema: FeatureSchema,
    pub degenerate: DegeneratePolicy,

    /// Column name used for the prediction in exports and tables.
    pub prediction_name: String,

    pub show_raw: bool,
    pub show_processed: bool,
    pub show_scaled: bool,
    pub show_predictions: bool,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_predictions: Option<PathBuf>,
    pub export_features: Option<PathBuf>,
}
