//! Error types.
//!
//! The core (ingest, feature pipeline, models, runner) reports failures through
//! [`ForecastError`], which distinguishes the three failure kinds a run can hit.
//! The binary converts everything into [`AppError`], which only carries an exit
//! code and a human-readable message.
//!
//! Exit codes: 2 = input/data, 3 = model load, 4 = inference, 5 = writing an
//! output file (exports, generated samples).

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for failures while writing output files.
pub const OUTPUT_EXIT_CODE: u8 = 5;

/// Boxed cause attached to inference and model-load failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed, missing or non-coercible input data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Missing required column: `{column}`")]
    MissingColumn { column: String },

    #[error("Failed to open CSV '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read CSV: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("Line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: invalid timestamp in `{column}`: '{value}'")]
    InvalidTimestamp {
        column: String,
        line: usize,
        value: String,
    },

    #[error("Line {line}: `{column}` value '{value}' is not a number")]
    InvalidNumber {
        column: String,
        line: usize,
        value: String,
    },

    #[error("Line {line}: `{column}` value '{value}' could not be converted to a finite number")]
    UndefinedCell {
        column: String,
        line: usize,
        value: String,
    },

    #[error("Cannot scale constant column(s): {}", columns.join(", "))]
    DegenerateColumns { columns: Vec<String> },
}

/// Top-level failure of a prediction run.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Inference failed: {message}")]
    Inference {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Failed to load model '{}': {source}", path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl ForecastError {
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
            source: None,
        }
    }

    pub fn model_load(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Process exit code used by the binary for this failure kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            ForecastError::Data(_) => 2,
            ForecastError::ModelLoad { .. } => 3,
            ForecastError::Inference { .. } => 4,
        }
    }
}

impl From<csv::Error> for DataError {
    fn from(source: csv::Error) -> Self {
        DataError::Csv { source }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        // Keep the cause chain visible; the binary only prints `Display`.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(&format!("\n  caused by: {text}"));
            }
            source = cause.source();
        }
        Self::new(err.exit_code(), message)
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        ForecastError::from(err).into()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_kind() {
        let data: ForecastError = DataError::MissingColumn {
            column: "NP15_LOAD".to_string(),
        }
        .into();
        assert_eq!(data.exit_code(), 2);
        assert_eq!(ForecastError::inference("boom").exit_code(), 4);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(ForecastError::model_load("m.json", io).exit_code(), 3);
    }

    #[test]
    fn app_error_keeps_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let app: AppError = ForecastError::model_load("Saved Models/m.json", io).into();
        assert_eq!(app.exit_code(), 3);
        let text = app.to_string();
        assert!(text.contains("Saved Models/m.json"));
        assert!(text.contains("no such file"));
    }

    #[test]
    fn missing_column_names_the_column() {
        let err = DataError::MissingColumn {
            column: "PG&E".to_string(),
        };
        assert_eq!(err.to_string(), "Missing required column: `PG&E`");
    }
}
