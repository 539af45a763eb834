//! Prediction runner: one batch inference call, outputs paired with timestamps.

use tracing::info;

use crate::domain::{FeatureTable, Prediction, RowStamp};
use crate::error::ForecastError;
use crate::models::Model;

/// Run the model over the whole feature table and pair each output with the
/// timestamp of the row it came from.
///
/// The model is called exactly once, even for an empty table.
pub fn run(model: &dyn Model, stamps: &[RowStamp], features: &FeatureTable) -> Result<Vec<Prediction>, ForecastError> {
    if stamps.len() != features.n_rows() {
        return Err(ForecastError::inference(format!(
            "{} timestamps for {} feature rows",
            stamps.len(),
            features.n_rows()
        )));
    }

    info!(model = %model.label(), rows = features.n_rows(), "running inference");

    let values = model.predict(features).map_err(|source| ForecastError::Inference {
        message: format!("model '{}' failed", model.label()),
        source: Some(source),
    })?;

    if values.len() != features.n_rows() {
        return Err(ForecastError::inference(format!(
            "model returned {} predictions for {} rows",
            values.len(),
            features.n_rows()
        )));
    }
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::inference(format!(
            "model returned a non-finite prediction for line {}",
            stamps[pos].line
        )));
    }

    Ok(stamps
        .iter()
        .zip(values)
        .map(|(stamp, value)| Prediction {
            line: stamp.line,
            timestamp: stamp.timestamp,
            value,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;
    use nalgebra::DMatrix;

    use super::*;
    use crate::error::BoxError;

    /// Sums each row and counts how often it was asked to predict.
    struct RowSum {
        calls: AtomicUsize,
    }

    impl Model for RowSum {
        fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..features.n_rows()).map(|i| features.values.row(i).sum()).collect())
        }

        fn label(&self) -> String {
            "row-sum".to_string()
        }
    }

    struct Fixed(Vec<f64>);

    impl Model for Fixed {
        fn predict(&self, _: &FeatureTable) -> Result<Vec<f64>, BoxError> {
            Ok(self.0.clone())
        }

        fn label(&self) -> String {
            "fixed".to_string()
        }
    }

    struct Broken;

    impl Model for Broken {
        fn predict(&self, _: &FeatureTable) -> Result<Vec<f64>, BoxError> {
            Err("weights file truncated".into())
        }

        fn label(&self) -> String {
            "broken".to_string()
        }
    }

    fn stamps(lines: &[usize]) -> Vec<RowStamp> {
        let day = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        lines
            .iter()
            .enumerate()
            .map(|(h, &line)| RowStamp {
                line,
                timestamp: day.and_hms_opt(h as u32, 0, 0).unwrap(),
            })
            .collect()
    }

    fn table(rows: usize) -> FeatureTable {
        let data: Vec<f64> = (0..rows * 2).map(|v| v as f64).collect();
        FeatureTable::new(
            vec!["a".to_string(), "b".to_string()],
            DMatrix::from_row_slice(rows, 2, &data),
        )
    }

    #[test]
    fn pairs_outputs_with_source_rows() {
        let model = RowSum {
            calls: AtomicUsize::new(0),
        };
        let stamps = stamps(&[2, 5, 6]);
        let preds = run(&model, &stamps, &table(3)).unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(preds.len(), 3);
        assert_eq!(preds.iter().map(|p| p.line).collect::<Vec<_>>(), vec![2, 5, 6]);
        assert_eq!(preds[1].timestamp, stamps[1].timestamp);
        assert_eq!(preds.iter().map(|p| p.value).collect::<Vec<_>>(), vec![1.0, 5.0, 9.0]);
    }

    #[test]
    fn empty_table_still_calls_model_once() {
        let model = RowSum {
            calls: AtomicUsize::new(0),
        };
        let preds = run(&model, &[], &table(0)).unwrap();
        assert!(preds.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn model_failure_keeps_its_cause() {
        let err = run(&Broken, &stamps(&[2]), &table(1)).unwrap_err();
        match &err {
            ForecastError::Inference { source: Some(cause), .. } => {
                assert_eq!(cause.to_string(), "weights file truncated");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn wrong_length_output_is_rejected() {
        let err = run(&Fixed(vec![1.0]), &stamps(&[2, 3]), &table(2)).unwrap_err();
        assert!(err.to_string().contains("1 predictions for 2 rows"));
    }

    #[test]
    fn non_finite_output_is_rejected() {
        let err = run(&Fixed(vec![1.0, f64::NAN]), &stamps(&[2, 9]), &table(2)).unwrap_err();
        assert!(err.to_string().contains("line 9"));
    }

    #[test]
    fn timestamp_count_must_match_rows() {
        let err = run(&Fixed(vec![]), &stamps(&[2]), &table(0)).unwrap_err();
        assert!(matches!(err, ForecastError::Inference { .. }));
    }
}
