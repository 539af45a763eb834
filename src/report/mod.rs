//! Reporting utilities: prediction statistics and formatted terminal output.

pub mod format;

pub use format::*;

use chrono::NaiveDateTime;

use crate::domain::Prediction;

/// Simple statistics over a prediction series.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionStats {
    pub n: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
}

/// Summarize predictions; `None` for an empty series.
pub fn prediction_stats(predictions: &[Prediction]) -> Option<PredictionStats> {
    let first = predictions.first()?;
    let last = predictions.last()?;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for p in predictions {
        min = min.min(p.value);
        max = max.max(p.value);
        sum += p.value;
    }

    Some(PredictionStats {
        n: predictions.len(),
        min,
        max,
        mean: sum / predictions.len() as f64,
        first: first.timestamp,
        last: last.timestamp,
    })
}
