//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the designated input columns (`FeatureSchema`)
//! - the uploaded table after admission (`RawTable`, `RawRow`)
//! - engineered features and their scaling (`FeatureTable`, `ScalingParameters`)
//! - model outputs (`Prediction`) and the run configuration (`PredictConfig`)

pub mod types;

pub use types::*;
