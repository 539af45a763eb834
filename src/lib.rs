//! `spnp-forecast` library crate.
//!
//! The binary (`spnp`) is a thin wrapper around this library so that:
//!
//! - the feature pipeline and inference are testable without spawning processes
//! - a long-running caller can load a model once and score many uploads
//!
//! Data flow: `io::ingest` (CSV -> `RawTable`) -> `features` (cleaning,
//! derived columns, standardization) -> `models` (trained artifact) ->
//! `predict` (one timestamped value per surviving row) -> `report`/`plot`/`io::export`.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod predict;
pub mod report;
