//! Feature engineering.
//!
//! Responsibilities:
//!
//! - parse and clean individual cells (`clean`)
//! - turn an admitted raw table into a scaled feature table (`pipeline`)

pub mod clean;
pub mod pipeline;

pub use pipeline::*;
