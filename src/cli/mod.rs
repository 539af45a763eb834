//! Command-line parsing for the DA SPNP prediction tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the feature/model code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::DEFAULT_MODEL_PATH;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "spnp", version, about = "Day-ahead SP15/NP15 spread (DA SPNP) predictor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict DA SPNP for every complete row of an uploaded CSV.
    Predict(PredictArgs),
    /// Run the feature pipeline only and print/export the scaled features.
    Features(FeaturesArgs),
    /// Summarize a saved model artifact.
    Model(ModelArgs),
    /// Write a synthetic upload with the expected columns.
    Sample(SampleArgs),
}

/// Where the upload comes from and how it is turned into features.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Upload CSV (`-` reads stdin). Prompts for a file when omitted.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub csv: Option<String>,

    /// Center constant columns instead of rejecting the upload.
    #[arg(long)]
    pub allow_constant_columns: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Model artifact (JSON).
    #[arg(short = 'm', long, env = "SPNP_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Column name for predictions in tables and exports.
    #[arg(long, default_value = "DA SPNP")]
    pub target_name: String,

    /// Show the uploaded rows.
    #[arg(long)]
    pub show_raw: bool,

    /// Show engineered features before scaling.
    #[arg(long)]
    pub show_processed: bool,

    /// Show the scaled features passed to the model.
    #[arg(long)]
    pub show_scaled: bool,

    /// Show every prediction.
    #[arg(long)]
    pub show_predictions: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export predictions to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the scaled feature table to CSV.
    #[arg(long = "export-features")]
    pub export_features: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FeaturesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print features before scaling as well.
    #[arg(long)]
    pub show_processed: bool,

    /// Export the scaled feature table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Model artifact (JSON).
    #[arg(short = 'm', long, env = "SPNP_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short = 'o', long)]
    pub out: PathBuf,

    /// Number of hourly rows.
    #[arg(short = 'n', long, default_value_t = 168)]
    pub rows: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First timestamp (`YYYY-MM-DD` or `YYYY-MM-DD HH:MM`).
    #[arg(long, default_value = "2023-01-01")]
    pub start: String,

    /// Probability that a cell is left blank.
    #[arg(long, default_value_t = 0.01)]
    pub blank_prob: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_defaults() {
        let cli = Cli::try_parse_from(["spnp", "predict", "--csv", "upload.csv"]).unwrap();
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.input.csv.as_deref(), Some("upload.csv"));
        assert_eq!(args.target_name, "DA SPNP");
        assert!(!args.no_plot);
        assert!(!args.input.allow_constant_columns);
        assert_eq!(args.width, 100);
    }

    #[test]
    fn sample_requires_out() {
        assert!(Cli::try_parse_from(["spnp", "sample"]).is_err());
        let cli = Cli::try_parse_from(["spnp", "sample", "--out", "s.csv", "-n", "24"]).unwrap();
        let Command::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(args.rows, 24);
    }
}
