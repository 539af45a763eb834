//! Per-column standardization.
//!
//! Every batch is scaled with statistics computed from that batch alone:
//!
//! ```text
//! z = (x - mean) / std        std = sqrt(Σ (x - mean)^2 / n)
//! ```
//!
//! The population estimator (divide by `n`) is used so that re-scaling an
//! already scaled table is a no-op up to rounding.
//!
//! A column whose std is zero cannot be divided; see `DegeneratePolicy`.

use nalgebra::DMatrix;
use tracing::warn;

use crate::domain::{DegeneratePolicy, FeatureTable, ScalingParameters};
use crate::error::DataError;

/// Relative tolerance below which a std is treated as zero.
const DEGENERATE_REL_TOL: f64 = 1e-12;

/// Compute mean and population std for each column of the batch.
///
/// An empty batch gets `mean = 0`, `std = 1` for every column so that the
/// (empty) transform is still well defined.
pub fn fit_scaling(table: &FeatureTable, policy: DegeneratePolicy) -> Result<ScalingParameters, DataError> {
    let n = table.n_rows();
    let mut means = Vec::with_capacity(table.n_cols());
    let mut stds = Vec::with_capacity(table.n_cols());
    let mut degenerate = Vec::new();

    for (name, col) in table.columns.iter().zip(table.values.column_iter()) {
        if n == 0 {
            means.push(0.0);
            stds.push(1.0);
            continue;
        }

        let mean = col.iter().sum::<f64>() / n as f64;
        let var = col.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        let std = var.sqrt();

        if is_degenerate(mean, std) {
            degenerate.push(name.clone());
        }
        means.push(mean);
        stds.push(std);
    }

    if !degenerate.is_empty() {
        match policy {
            DegeneratePolicy::Reject => {
                return Err(DataError::DegenerateColumns { columns: degenerate });
            }
            DegeneratePolicy::Center => {
                warn!(columns = ?degenerate, "constant feature columns will be centered but not scaled");
            }
        }
    }

    Ok(ScalingParameters {
        columns: table.columns.clone(),
        means,
        stds,
        degenerate,
    })
}

/// Apply previously computed parameters to a table with the same columns.
pub fn apply_scaling(table: &FeatureTable, params: &ScalingParameters) -> FeatureTable {
    debug_assert_eq!(table.columns, params.columns);

    let mut values = DMatrix::zeros(table.n_rows(), table.n_cols());
    for (j, name) in table.columns.iter().enumerate() {
        let mean = params.means[j];
        // Degenerate columns are only centered.
        let scale = if params.degenerate.contains(name) { 1.0 } else { params.stds[j] };
        for i in 0..table.n_rows() {
            values[(i, j)] = (table.values[(i, j)] - mean) / scale;
        }
    }

    FeatureTable::new(table.columns.clone(), values)
}

/// Fit on the batch and transform it in one go.
pub fn standardize(
    table: &FeatureTable,
    policy: DegeneratePolicy,
) -> Result<(FeatureTable, ScalingParameters), DataError> {
    let params = fit_scaling(table, policy)?;
    let scaled = apply_scaling(table, &params);
    Ok((scaled, params))
}

fn is_degenerate(mean: f64, std: f64) -> bool {
    !std.is_finite() || std <= DEGENERATE_REL_TOL * mean.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: usize, data: &[f64]) -> FeatureTable {
        FeatureTable::new(
            columns.iter().map(|c| c.to_string()).collect(),
            DMatrix::from_row_slice(rows, columns.len(), data),
        )
    }

    #[test]
    fn standardize_uses_population_std() {
        let t = table(&["x"], 4, &[1.0, 2.0, 3.0, 4.0]);
        let (scaled, params) = standardize(&t, DegeneratePolicy::Reject).unwrap();

        assert!((params.means[0] - 2.5).abs() < 1e-12);
        assert!((params.stds[0] - 1.25_f64.sqrt()).abs() < 1e-12);

        let z = scaled.column("x").unwrap();
        let expected = (1.0 - 2.5) / 1.25_f64.sqrt();
        assert!((z[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn rescaling_scaled_output_is_identity() {
        let t = table(
            &["a", "b"],
            5,
            &[1.0, 100.0, 3.0, -50.0, 2.0, 20.0, 8.0, 10.0, -4.0, 0.5],
        );
        let (once, _) = standardize(&t, DegeneratePolicy::Reject).unwrap();
        let (twice, params) = standardize(&once, DegeneratePolicy::Reject).unwrap();

        for j in 0..2 {
            assert!(params.means[j].abs() < 1e-12);
            assert!((params.stds[j] - 1.0).abs() < 1e-12);
        }
        for (a, b) in once.values.iter().zip(twice.values.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn constant_column_is_rejected_by_default() {
        let t = table(&["a", "flat"], 3, &[1.0, 7.0, 2.0, 7.0, 3.0, 7.0]);
        let err = standardize(&t, DegeneratePolicy::Reject).unwrap_err();
        match err {
            DataError::DegenerateColumns { columns } => assert_eq!(columns, vec!["flat"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn constant_column_is_centered_when_allowed() {
        let t = table(&["a", "flat"], 3, &[1.0, 7.0, 2.0, 7.0, 3.0, 7.0]);
        let (scaled, params) = standardize(&t, DegeneratePolicy::Center).unwrap();
        assert_eq!(params.degenerate, vec!["flat"]);
        assert!(scaled.column("flat").unwrap().iter().all(|v| *v == 0.0));
        assert!(scaled.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn single_row_is_degenerate_everywhere() {
        let t = table(&["a", "b"], 1, &[5.0, -3.0]);
        let err = fit_scaling(&t, DegeneratePolicy::Reject).unwrap_err();
        assert!(matches!(err, DataError::DegenerateColumns { ref columns } if columns.len() == 2));
    }

    #[test]
    fn empty_batch_scales_to_empty() {
        let t = FeatureTable::empty(vec!["a".to_string()]);
        let (scaled, params) = standardize(&t, DegeneratePolicy::Reject).unwrap();
        assert!(scaled.is_empty());
        assert_eq!(scaled.columns, vec!["a"]);
        assert_eq!(params.stds, vec![1.0]);
    }
}
