//! Shared "predict pipeline" logic used by the CLI subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> feature transform -> model load -> batch inference
//!
//! The subcommands can then focus on presentation (summary, previews, plots).

use crate::domain::{CsvSource, DegeneratePolicy, FeatureSchema, PredictConfig, Prediction, RawTable};
use crate::error::ForecastError;
use crate::features::{TransformOutput, transform};
use crate::io::ingest::load_raw_table;
use crate::models::{Model, load_model};

/// All computed outputs of a single `spnp predict` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub raw: RawTable,
    pub transform: TransformOutput,
    pub predictions: Vec<Prediction>,
    pub model_label: String,
}

/// Execute the full prediction pipeline and return the computed outputs.
pub fn run_predict(config: &PredictConfig) -> Result<RunOutput, ForecastError> {
    // 1) Read the upload.
    let raw = load_raw_table(&config.csv)?;

    // 2) Build features before touching the model, so bad data fails fast.
    let transformed = transform(&raw, &config.schema, config.degenerate)?;

    // 3) Load the trained model.
    let model = load_model(&config.model_path)?;

    let predictions = crate::predict::run(model.as_ref(), &transformed.stamps, &transformed.features)?;
    Ok(RunOutput {
        raw,
        transform: transformed,
        predictions,
        model_label: model.label(),
    })
}

/// Execute the pipeline on an already-read table with a caller-provided model.
///
/// This is useful for tests and for callers that keep one model loaded across
/// many uploads.
pub fn run_with_model(
    raw: RawTable,
    model: &dyn Model,
    schema: &FeatureSchema,
    policy: DegeneratePolicy,
) -> Result<RunOutput, ForecastError> {
    let transformed = transform(&raw, schema, policy)?;
    let predictions = crate::predict::run(model, &transformed.stamps, &transformed.features)?;

    Ok(RunOutput {
        raw,
        transform: transformed,
        predictions,
        model_label: model.label(),
    })
}

/// Execute only ingest + transform (for `spnp features`).
pub fn run_features(
    csv: &CsvSource,
    schema: &FeatureSchema,
    policy: DegeneratePolicy,
) -> Result<(RawTable, TransformOutput), ForecastError> {
    let raw = load_raw_table(csv)?;
    let transformed = transform(&raw, schema, policy)?;
    Ok((raw, transformed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureTable;
    use crate::error::BoxError;
    use crate::io::ingest::read_raw_table;

    struct SumModel;

    impl Model for SumModel {
        fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>, BoxError> {
            Ok((0..features.n_rows()).map(|i| features.row(i).iter().sum()).collect())
        }

        fn label(&self) -> String {
            "sum".to_string()
        }
    }

    const CSV: &str = "Date/Time,NP15_LOAD,SP15_LOAD,PG&E,Malin,Hydro,DA SPNP\n\
2023-01-01 00:00,\"1,000\",800,40.0,35.0,12,30\n\
2023-01-01 01:00,\"1,100\",,41.0,36.0,13,31\n\
2023-01-01 02:00,\"1,200\",900,42.0,36.5,15,32\n\
2023-01-01 03:00,\"1,050\",850,39.0,35.5,11,29\n";

    #[test]
    fn run_with_model_pairs_predictions_with_surviving_rows() {
        let raw = read_raw_table(CSV.as_bytes()).unwrap();
        let out = run_with_model(raw, &SumModel, &FeatureSchema::default(), DegeneratePolicy::Reject).unwrap();

        assert_eq!(out.model_label, "sum");
        assert_eq!(out.raw.dropped_lines, vec![3]);
        let lines: Vec<usize> = out.predictions.iter().map(|p| p.line).collect();
        assert_eq!(lines, vec![2, 4, 5]);
        assert_eq!(out.transform.features.n_rows(), 3);
    }

    #[test]
    fn missing_designated_column_is_a_data_error() {
        let raw = read_raw_table("Date/Time,NP15_LOAD\n2023-01-01 00:00,1\n".as_bytes()).unwrap();
        let err = run_with_model(raw, &SumModel, &FeatureSchema::default(), DegeneratePolicy::Reject).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
