//! Numeric utilities: per-column standardization of feature batches.

pub mod scaling;

pub use scaling::*;
