//! Trained model artifacts and the batch-inference seam.
//!
//! The prediction runner only knows about the `Model` trait, so tests (or a
//! future alternative back-end) can inject their own implementation. The
//! concrete models here are read from a JSON artifact produced by the training
//! side:
//!
//! ```json
//! { "kind": "random_forest", "feature_names": ["Hydro", "..."], "trees": [ ... ] }
//! { "kind": "linear", "intercept": 31.2, "coefficients": [0.4, -1.3, 2.2] }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::FeatureTable;
use crate::error::{BoxError, ForecastError};
use crate::models::forest::{TreeNode, forest_predict_row};

/// Batch inference over a scaled feature table.
///
/// Implementations must be pure: the same table always yields the same output,
/// and nothing about the model changes between calls.
pub trait Model: Send + Sync {
    /// One prediction per row of `features`, in row order.
    fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>, BoxError>;

    /// Short human-readable label for logs and reports.
    fn label(&self) -> String;
}

/// Shared read-only handle, loaded once and reused across runs.
pub type SharedModel = Arc<dyn Model>;

/// Serialized model, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    RandomForest {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feature_names: Option<Vec<String>>,
        trees: Vec<TreeNode>,
    },
    Linear {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feature_names: Option<Vec<String>>,
        intercept: f64,
        coefficients: Vec<f64>,
    },
}

/// Structural facts about an artifact (for `spnp model` and logs).
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSummary {
    pub kind: &'static str,
    pub trees: usize,
    pub max_depth: usize,
    pub leaves: usize,
    /// Number of input columns the model expects, when it can tell.
    pub n_features: Option<usize>,
    pub feature_names: Vec<String>,
}

impl ModelArtifact {
    /// Check the artifact is usable before any inference happens.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ModelArtifact::RandomForest { feature_names, trees } => {
                if trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(&format!("trees[{i}]"))?;
                }
                if let Some(names) = feature_names {
                    let max_feature = trees.iter().filter_map(TreeNode::max_feature).max();
                    if let Some(max) = max_feature {
                        if max >= names.len() {
                            return Err(format!(
                                "a split uses feature {max} but only {} feature names are listed",
                                names.len()
                            ));
                        }
                    }
                }
                Ok(())
            }
            ModelArtifact::Linear {
                feature_names,
                intercept,
                coefficients,
            } => {
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("linear model has non-finite parameters".to_string());
                }
                if let Some(names) = feature_names {
                    if names.len() != coefficients.len() {
                        return Err(format!(
                            "{} feature names for {} coefficients",
                            names.len(),
                            coefficients.len()
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    pub fn summary(&self) -> ArtifactSummary {
        match self {
            ModelArtifact::RandomForest { feature_names, trees } => ArtifactSummary {
                kind: "random_forest",
                trees: trees.len(),
                max_depth: trees.iter().map(TreeNode::depth).max().unwrap_or(0),
                leaves: trees.iter().map(TreeNode::n_leaves).sum(),
                n_features: feature_names.as_ref().map(Vec::len),
                feature_names: feature_names.clone().unwrap_or_default(),
            },
            ModelArtifact::Linear {
                feature_names,
                coefficients,
                ..
            } => ArtifactSummary {
                kind: "linear",
                trees: 0,
                max_depth: 0,
                leaves: 0,
                n_features: Some(coefficients.len()),
                feature_names: feature_names.clone().unwrap_or_default(),
            },
        }
    }

    fn check_width(&self, n_cols: usize) -> Result<(), BoxError> {
        let declared = match self {
            ModelArtifact::RandomForest { feature_names, trees } => {
                // Every referenced column must exist, whether or not names are listed.
                if let Some(max) = trees.iter().filter_map(TreeNode::max_feature).max() {
                    if max >= n_cols {
                        return Err(format!(
                            "model splits on feature {max} but the table has {n_cols} columns"
                        )
                        .into());
                    }
                }
                feature_names.as_ref().map(Vec::len)
            }
            ModelArtifact::Linear { coefficients, .. } => Some(coefficients.len()),
        };

        match declared {
            Some(expected) if expected != n_cols => Err(format!(
                "model expects {expected} feature columns, table has {n_cols}"
            )
            .into()),
            _ => Ok(()),
        }
    }
}

impl Model for ModelArtifact {
    fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>, BoxError> {
        // Artifacts can be built in code as well as read from disk.
        self.validate()?;
        self.check_width(features.n_cols())?;

        let mut out = Vec::with_capacity(features.n_rows());
        for i in 0..features.n_rows() {
            let row = features.row(i);
            let y = match self {
                ModelArtifact::RandomForest { trees, .. } => forest_predict_row(trees, &row)
                    .ok_or_else(|| format!("forest could not score row {i}"))?,
                ModelArtifact::Linear {
                    intercept,
                    coefficients,
                    ..
                } => intercept + coefficients.iter().zip(&row).map(|(c, x)| c * x).sum::<f64>(),
            };
            out.push(y);
        }
        Ok(out)
    }

    fn label(&self) -> String {
        let s = self.summary();
        match self {
            ModelArtifact::RandomForest { .. } => {
                format!("random forest ({} trees, max depth {})", s.trees, s.max_depth)
            }
            ModelArtifact::Linear { .. } => format!("linear ({} coefficients)", s.n_features.unwrap_or(0)),
        }
    }
}

/// Read and validate an artifact without wrapping it as a model.
pub fn read_artifact(path: &Path) -> Result<ModelArtifact, ForecastError> {
    let file = File::open(path).map_err(|e| ForecastError::model_load(path, e))?;
    let artifact: ModelArtifact =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| ForecastError::model_load(path, e))?;
    artifact
        .validate()
        .map_err(|msg| ForecastError::model_load(path, msg))?;
    Ok(artifact)
}

/// Load the model used for inference.
pub fn load_model(path: &Path) -> Result<SharedModel, ForecastError> {
    let artifact = read_artifact(path)?;
    info!(path = %path.display(), model = %artifact.label(), "loaded model");
    Ok(Arc::new(artifact))
}
