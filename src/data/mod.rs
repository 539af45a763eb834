//! Synthetic input data for trying the tool and for tests.

pub mod sample;

pub use sample::*;
