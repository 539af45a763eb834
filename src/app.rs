//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - installs logging and loads `.env`
//! - parses CLI arguments
//! - runs the predict/features pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, FeaturesArgs, InputArgs, ModelArgs, PredictArgs, SampleArgs};
use crate::domain::{CsvSource, DegeneratePolicy, FeatureSchema, PredictConfig};
use crate::error::AppError;
use crate::report::{RAW_PREVIEW_ROWS, format_feature_table, format_predictions, format_raw_preview};

pub mod pipeline;

/// Entry point for the `spnp` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();

    // `SPNP_MODEL_PATH` may come from `.env`; load it before clap reads env defaults.
    dotenvy::dotenv().ok();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Predict(args) => handle_predict(args),
        Command::Features(args) => handle_features(args),
        Command::Model(args) => handle_model(args),
        Command::Sample(args) => handle_sample(args),
    }
}

/// Logs go to stderr so stdout stays clean for tables and piped CSV.
fn init_logging() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let config = predict_config_from_args(&args)?;
    let run = pipeline::run_predict(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));

    if config.show_raw {
        println!("{}", format_raw_preview(&run.raw, RAW_PREVIEW_ROWS));
    }
    if config.show_processed {
        println!(
            "{}",
            format_feature_table("Processed features", &run.transform.stamps, &run.transform.processed)
        );
    }
    if config.show_scaled {
        println!(
            "{}",
            format_feature_table("Scaled features", &run.transform.stamps, &run.transform.features)
        );
    }
    if config.show_predictions {
        println!("{}", format_predictions(&run.predictions, &config.prediction_name));
    }

    if config.plot {
        let plot = crate::plot::render_prediction_plot(
            &run.predictions,
            &config.prediction_name,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_predictions {
        crate::io::export::write_predictions_csv(path, &run.predictions, &config.prediction_name)?;
        info!(path = %path.display(), rows = run.predictions.len(), "wrote predictions");
    }
    if let Some(path) = &config.export_features {
        crate::io::export::write_features_csv(path, &run.transform.stamps, &run.transform.features)?;
        info!(path = %path.display(), "wrote scaled features");
    }

    Ok(())
}

fn handle_features(args: FeaturesArgs) -> Result<(), AppError> {
    let schema = FeatureSchema::default();
    let csv = resolve_csv_source(&args.input, &schema)?;
    let (_, transformed) = pipeline::run_features(&csv, &schema, degenerate_policy(&args.input))?;

    if args.show_processed {
        println!(
            "{}",
            format_feature_table("Processed features", &transformed.stamps, &transformed.processed)
        );
    }
    println!(
        "{}",
        format_feature_table("Scaled features", &transformed.stamps, &transformed.features)
    );

    if let Some(path) = &args.export {
        crate::io::export::write_features_csv(path, &transformed.stamps, &transformed.features)?;
        info!(path = %path.display(), "wrote scaled features");
    }
    Ok(())
}

fn handle_model(args: ModelArgs) -> Result<(), AppError> {
    let artifact = crate::models::read_artifact(&args.model)?;
    let summary = artifact.summary();

    println!("Model: {}", args.model.display());
    println!("Kind: {}", summary.kind);
    if summary.trees > 0 {
        println!(
            "Trees: {} | max depth={} | leaves={}",
            summary.trees, summary.max_depth, summary.leaves
        );
    }
    match summary.n_features {
        Some(n) => println!("Inputs: {n}"),
        None => println!("Inputs: unknown"),
    }
    if !summary.feature_names.is_empty() {
        println!("Feature names: {}", summary.feature_names.join(", "));
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let start = crate::features::clean::parse_timestamp(&args.start)
        .ok_or_else(|| AppError::new(2, format!("Unrecognized start timestamp: '{}'", args.start)))?;

    let config = crate::data::SampleConfig {
        rows: args.rows,
        seed: args.seed,
        start,
        blank_prob: args.blank_prob,
    };
    let sample = crate::data::generate_sample(&config)?;
    crate::data::write_sample_csv(&args.out, &sample)?;

    println!("Wrote {} rows to {}", sample.rows.len(), args.out.display());
    Ok(())
}

pub fn predict_config_from_args(args: &PredictArgs) -> Result<PredictConfig, AppError> {
    let schema = FeatureSchema::default();
    let csv = resolve_csv_source(&args.input, &schema)?;

    Ok(PredictConfig {
        csv,
        model_path: args.model.clone(),
        schema,
        degenerate: degenerate_policy(&args.input),
        prediction_name: args.target_name.clone(),
        show_raw: args.show_raw,
        show_processed: args.show_processed,
        show_scaled: args.show_scaled,
        show_predictions: args.show_predictions,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_predictions: args.export.clone(),
        export_features: args.export_features.clone(),
    })
}

/// `--csv` when given, otherwise ask interactively.
fn resolve_csv_source(input: &InputArgs, schema: &FeatureSchema) -> Result<CsvSource, AppError> {
    match &input.csv {
        Some(arg) => Ok(CsvSource::from_arg(arg)),
        None => crate::cli::picker::prompt_for_csv_path(schema).map(CsvSource::Path),
    }
}

fn degenerate_policy(input: &InputArgs) -> DegeneratePolicy {
    if input.allow_constant_columns {
        DegeneratePolicy::Center
    } else {
        DegeneratePolicy::Reject
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::cli::Cli;

    fn predict_args(argv: &[&str]) -> PredictArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Predict(args) => args,
            other => panic!("expected predict, got {other:?}"),
        }
    }

    #[test]
    fn config_from_flags() {
        let args = predict_args(&[
            "spnp",
            "predict",
            "--csv",
            "-",
            "--model",
            "m.json",
            "--no-plot",
            "--allow-constant-columns",
            "--export",
            "out.csv",
        ]);
        let config = predict_config_from_args(&args).unwrap();

        assert_eq!(config.csv, CsvSource::Stdin);
        assert_eq!(config.model_path, PathBuf::from("m.json"));
        assert!(!config.plot);
        assert_eq!(config.degenerate, DegeneratePolicy::Center);
        assert_eq!(config.export_predictions, Some(PathBuf::from("out.csv")));
        assert_eq!(config.prediction_name, "DA SPNP");
    }

    #[test]
    fn constant_columns_rejected_by_default() {
        let args = predict_args(&["spnp", "predict", "--csv", "upload.csv", "--model", "m.json"]);
        let config = predict_config_from_args(&args).unwrap();
        assert_eq!(config.degenerate, DegeneratePolicy::Reject);
        assert_eq!(config.csv, CsvSource::Path(PathBuf::from("upload.csv")));
    }
}
