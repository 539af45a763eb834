//! Prediction models.
//!
//! The runner is generic over the `Model` trait; the bundled implementation is
//! a JSON artifact holding either a regression forest or a linear model.

pub mod forest;
pub mod model;

pub use forest::TreeNode;
pub use model::*;
