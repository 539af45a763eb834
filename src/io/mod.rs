//! Input/output helpers.
//!
//! - CSV ingest + row admission (`ingest`)
//! - prediction and feature exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
