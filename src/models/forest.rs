//! Regression trees and forests as stored in the model artifact.
//!
//! A node is either a leaf (`value`) or a split on one feature column:
//! rows with `x[feature] <= threshold` go left, everything else goes right.
//! A forest predicts the mean of its trees.

use serde::{Deserialize, Serialize};

/// One node of a regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeNode {
    /// Feature column index for splits (`None` for leaves).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<usize>,
    /// Split threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Prediction value, required at leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<TreeNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<TreeNode>>,
}

impl TreeNode {
    pub fn leaf(value: f64) -> Self {
        Self {
            feature: None,
            threshold: None,
            value: Some(value),
            left: None,
            right: None,
        }
    }

    pub fn split(feature: usize, threshold: f64, left: TreeNode, right: TreeNode) -> Self {
        Self {
            feature: Some(feature),
            threshold: Some(threshold),
            value: None,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature.is_none()
    }

    pub fn depth(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        let left = self.left.as_ref().map(|n| n.depth()).unwrap_or(0);
        let right = self.right.as_ref().map(|n| n.depth()).unwrap_or(0);
        1 + left.max(right)
    }

    pub fn n_leaves(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.left.as_ref().map(|n| n.n_leaves()).unwrap_or(0)
            + self.right.as_ref().map(|n| n.n_leaves()).unwrap_or(0)
    }

    /// Largest feature index referenced anywhere in the tree.
    pub fn max_feature(&self) -> Option<usize> {
        let here = self.feature;
        let left = self.left.as_ref().and_then(|n| n.max_feature());
        let right = self.right.as_ref().and_then(|n| n.max_feature());
        [here, left, right].into_iter().flatten().max()
    }

    /// Check the node shape recursively. `path` locates the node in messages.
    pub fn validate(&self, path: &str) -> Result<(), String> {
        match self.feature {
            None => {
                if self.left.is_some() || self.right.is_some() {
                    return Err(format!("{path}: leaf node has children"));
                }
                match self.value {
                    Some(v) if v.is_finite() => Ok(()),
                    Some(_) => Err(format!("{path}: leaf value is not finite")),
                    None => Err(format!("{path}: leaf is missing `value`")),
                }
            }
            Some(_) => {
                match self.threshold {
                    Some(t) if t.is_finite() => {}
                    _ => return Err(format!("{path}: split needs a finite `threshold`")),
                }
                let left = self
                    .left
                    .as_ref()
                    .ok_or_else(|| format!("{path}: split is missing `left`"))?;
                let right = self
                    .right
                    .as_ref()
                    .ok_or_else(|| format!("{path}: split is missing `right`"))?;
                left.validate(&format!("{path}.left"))?;
                right.validate(&format!("{path}.right"))
            }
        }
    }

    /// Walk the tree for one row.
    ///
    /// `None` when the walk cannot finish: a split on a column the row does
    /// not have, a missing child, or a leaf without a value.
    pub fn predict_row(&self, row: &[f64]) -> Option<f64> {
        let mut node = self;
        loop {
            let Some(feature) = node.feature else {
                return node.value;
            };
            let x = *row.get(feature)?;
            let next = if x <= node.threshold? {
                node.left.as_deref()
            } else {
                node.right.as_deref()
            };
            node = next?;
        }
    }
}

/// Mean prediction of a set of trees for one row.
pub fn forest_predict_row(trees: &[TreeNode], row: &[f64]) -> Option<f64> {
    if trees.is_empty() {
        return None;
    }
    let mut sum = 0.0;
    for tree in trees {
        sum += tree.predict_row(row)?;
    }
    Some(sum / trees.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, lo: f64, hi: f64) -> TreeNode {
        TreeNode::split(feature, threshold, TreeNode::leaf(lo), TreeNode::leaf(hi))
    }

    #[test]
    fn split_sends_equal_values_left() {
        let tree = stump(0, 1.0, 10.0, 20.0);
        assert_eq!(tree.predict_row(&[1.0]), Some(10.0));
        assert_eq!(tree.predict_row(&[1.0001]), Some(20.0));
    }

    #[test]
    fn forest_averages_trees() {
        let trees = vec![stump(0, 0.0, 1.0, 3.0), stump(1, 0.0, 5.0, 7.0)];
        assert_eq!(forest_predict_row(&trees, &[1.0, -1.0]), Some((3.0 + 5.0) / 2.0));
        assert_eq!(forest_predict_row(&[], &[1.0]), None);
    }

    #[test]
    fn shape_helpers() {
        let tree = TreeNode::split(2, 0.5, stump(0, 0.0, 1.0, 2.0), TreeNode::leaf(3.0));
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.n_leaves(), 3);
        assert_eq!(tree.max_feature(), Some(2));
        assert!(tree.validate("tree[0]").is_ok());
    }

    #[test]
    fn validate_reports_missing_child() {
        let mut tree = stump(0, 0.0, 1.0, 2.0);
        tree.right = None;
        let err = tree.validate("tree[3]").unwrap_err();
        assert_eq!(err, "tree[3]: split is missing `right`");
    }

    #[test]
    fn deserializes_compact_json() {
        let json = r#"{"feature":1,"threshold":2.5,"left":{"value":1.0},"right":{"value":4.0}}"#;
        let tree: TreeNode = serde_json::from_str(json).unwrap();
        assert_eq!(tree, stump(1, 2.5, 1.0, 4.0));
    }

    #[test]
    fn leaf_without_value_is_invalid() {
        let json = r#"{"feature":0,"threshold":0.0,"left":{"value":5.0},"right":{}}"#;
        let tree: TreeNode = serde_json::from_str(json).unwrap();
        assert_eq!(tree.validate("t").unwrap_err(), "t.right: leaf is missing `value`");
    }

    #[test]
    fn unknown_node_keys_are_rejected() {
        let json = r#"{"feature":0,"threshold":0.0,"left":{"leaf_value":5.0},"right":{"value":9.0}}"#;
        assert!(serde_json::from_str::<TreeNode>(json).is_err());
    }

    #[test]
    fn walk_stops_on_short_rows_and_broken_splits() {
        let tree = stump(5, 0.0, 1.0, 2.0);
        assert_eq!(tree.predict_row(&[0.0]), None);

        let mut no_threshold = stump(0, 0.0, 1.0, 2.0);
        no_threshold.threshold = None;
        assert_eq!(no_threshold.predict_row(&[0.0]), None);
    }
}
