//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - maps arguments into `DownloadConfig` / `ExportConfig`
//! - asks for confirmation where a run is long or writes a placeholder
//! - runs the pipeline and prints the summary

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;
use tracing::info;

use crate::cli::{Cli, Command, DownloadArgs, DummyArgs, ExportArgs, LocateArgs, OutputArgs};
use crate::data::EarthEngineClient;
use crate::domain::{BoundingBox, DownloadConfig, GridSpec, MIB, RasterSource};
use crate::error::AppError;
use crate::export::{ExportConfig, ModelBundle, ModelMetadata};
use crate::tiling::ReqwestTransport;

pub mod pipeline;

/// Entry point for the `sprep` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    crate::logging::init_logging(cli.verbose);

    match cli.command {
        Command::Download(args) => handle_download(args),
        Command::Export(args) => handle_export(args),
        Command::DummyModel(args) => handle_dummy(args),
        Command::LocateModel(args) => handle_locate(args),
    }
}

fn handle_download(args: DownloadArgs) -> Result<(), AppError> {
    let config = download_config_from_args(&args)?;
    println!("{}", crate::report::format_download_plan(&config));

    if !args.yes && !crate::cli::prompt::confirm("Continue?")? {
        return Err(AppError::failure("Cancelled."));
    }

    let service = EarthEngineClient::from_env()?;
    let transport = ReqwestTransport::new();
    let report = pipeline::run_download(&config, &service, &transport)?;

    println!("{}", crate::report::format_download_summary(&report));
    report.ensure_merged()
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let model = crate::io::read_fitted_json(&args.model)?;
    let scaler = crate::io::read_fitted_json(&args.scaler)?;
    let metadata = metadata_from_args(&args);
    let bundle = crate::export::package(model, scaler, metadata, args.accuracy)?;

    write_and_verify(&bundle, &export_config_from_args(&args.output))
}

fn handle_dummy(args: DummyArgs) -> Result<(), AppError> {
    println!("A dummy model predicts the class prior only. Do not use it in production.");
    if !args.yes && !crate::cli::prompt::confirm("Create dummy model?")? {
        return Err(AppError::failure("Cancelled."));
    }

    let bundle = crate::export::dummy_bundle(args.seed)?;
    write_and_verify(&bundle, &export_config_from_args(&args.output))
}

fn handle_locate(args: LocateArgs) -> Result<(), AppError> {
    let candidates = crate::io::default_candidates(&args.root, &args.file_name);

    match crate::io::find_existing_export(&candidates) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => {
            let searched: Vec<String> = candidates.iter().map(|p| format!("  {}", p.display())).collect();
            Err(AppError::failure(format!(
                "No exported model found. Searched:\n{}\nRun `sprep export` or `sprep dummy-model`.",
                searched.join("\n")
            )))
        }
    }
}

/// Write the bundle, load it back to confirm it decodes, and print the summary.
fn write_and_verify<M, S>(bundle: &ModelBundle<M, S>, config: &ExportConfig) -> Result<(), AppError>
where
    M: serde::Serialize,
    S: serde::Serialize,
{
    let path = config.model_path();
    let bytes = crate::io::write_bundle(bundle, &path)?;
    verify_bundle(&path)?;
    info!(bytes, "bundle verified");

    println!("{}", crate::report::format_export_summary(bundle, &path, bytes));
    Ok(())
}

fn verify_bundle(path: &Path) -> Result<(), AppError> {
    let loaded: ModelBundle<Value, Value> = crate::io::read_bundle(path)?;
    if loaded.feature_names.len() != crate::export::FEATURE_NAMES.len() {
        return Err(AppError::failure(format!(
            "Bundle at '{}' has {} feature names after reload",
            path.display(),
            loaded.feature_names.len()
        )));
    }
    Ok(())
}

pub fn download_config_from_args(args: &DownloadArgs) -> Result<DownloadConfig, AppError> {
    let bounds = BoundingBox::from_array(args.bounds_array()).map_err(|e| AppError::failure(e.to_string()))?;
    let grid = GridSpec::new(args.nx, args.ny).map_err(|e| AppError::failure(e.to_string()))?;
    if !(args.delay.is_finite() && args.delay >= 0.0) {
        return Err(AppError::failure(format!("--delay must be a non-negative number of seconds, got {}", args.delay)));
    }
    if !(args.scale.is_finite() && args.scale > 0.0) {
        return Err(AppError::failure(format!("--scale must be positive, got {}", args.scale)));
    }
    if args.start > args.end {
        return Err(AppError::failure(format!("--start {} is after --end {}", args.start, args.end)));
    }

    let mut imagery = RasterSource::sentinel2(&args.country, args.start, args.end, args.max_cloud);
    imagery.output = args.imagery_output.clone();
    let mut labels = RasterSource::worldcover(&args.country);
    labels.output = args.labels_output.clone();

    Ok(DownloadConfig {
        bounds,
        grid,
        max_tile_bytes: args.max_tile_mb.saturating_mul(MIB),
        request_delay: Duration::from_secs_f64(args.delay),
        scale_m: args.scale,
        work_dir: args.work_dir.clone(),
        sources: vec![imagery, labels],
    })
}

pub fn export_config_from_args(args: &OutputArgs) -> ExportConfig {
    ExportConfig {
        output_dir: args.output_dir.clone(),
        file_name: args.file_name.clone(),
    }
}

fn metadata_from_args(args: &ExportArgs) -> ModelMetadata {
    ModelMetadata {
        version: args.bundle_version.clone(),
        n_estimators: args.n_estimators,
        max_depth: args.max_depth,
        n_features: args.n_features,
        training_samples: args.training_samples,
        test_samples: args.test_samples,
        classes: args.classes.clone(),
        ..ModelMetadata::new(args.model_type.clone())
    }
}
