//! Command-line parsing for `sprep`.
//!
//! Parsing and dispatch stay separate from the raster and export code; the
//! `app` module maps these structs into plain config values.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_MAX_TILE_BYTES, DEFAULT_REQUEST_DELAY, DEFAULT_SCALE_M, MIB, RWANDA_BOUNDS};
use crate::export::{DEFAULT_OUTPUT_DIR, DUMMY_SEED, MODEL_FILE_NAME};

pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "sprep",
    version,
    about = "Sentinel-2 / WorldCover tiled download and model bundle export"
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download imagery and labels tile by tile and merge them into two GeoTIFFs.
    Download(DownloadArgs),
    /// Package a fitted model and scaler (JSON files) into the service bundle.
    Export(ExportArgs),
    /// Write an untrained placeholder bundle for testing the inference service.
    DummyModel(DummyArgs),
    /// Print the path of an already exported model, if any.
    LocateModel(LocateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct DownloadArgs {
    /// Region as MIN_LON MIN_LAT MAX_LON MAX_LAT (defaults to Rwanda).
    #[arg(
        long,
        num_args = 4,
        value_names = ["MIN_LON", "MIN_LAT", "MAX_LON", "MAX_LAT"],
        allow_negative_numbers = true
    )]
    pub bounds: Option<Vec<f64>>,

    /// Country name used to clip both sources (FAO GAUL ADM0_NAME).
    #[arg(long, default_value = "Rwanda")]
    pub country: String,

    /// Grid columns (longitude).
    #[arg(long, default_value_t = 4)]
    pub nx: usize,

    /// Grid rows (latitude).
    #[arg(long, default_value_t = 4)]
    pub ny: usize,

    /// Skip tiles larger than this many MiB.
    #[arg(long, default_value_t = DEFAULT_MAX_TILE_BYTES / MIB)]
    pub max_tile_mb: u64,

    /// Seconds to wait between requests.
    #[arg(long, default_value_t = DEFAULT_REQUEST_DELAY.as_secs_f64())]
    pub delay: f64,

    /// Output pixel size in meters.
    #[arg(long, default_value_t = DEFAULT_SCALE_M)]
    pub scale: f64,

    /// First day of the imagery composite window.
    #[arg(long, default_value = "2025-01-01")]
    pub start: NaiveDate,

    /// Last day of the imagery composite window.
    #[arg(long, default_value = "2025-09-30")]
    pub end: NaiveDate,

    /// Drop scenes with more cloud cover than this (percent).
    #[arg(long, default_value_t = 20.0)]
    pub max_cloud: f64,

    /// Directory for transient tile files.
    #[arg(long, default_value = "temp_tiles")]
    pub work_dir: PathBuf,

    /// Merged imagery output.
    #[arg(long, default_value = "sentinel.tif")]
    pub imagery_output: PathBuf,

    /// Merged label output.
    #[arg(long, default_value = "labels.tif")]
    pub labels_output: PathBuf,

    /// Do not ask for confirmation.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl DownloadArgs {
    pub fn bounds_array(&self) -> [f64; 4] {
        match self.bounds.as_deref() {
            Some(&[a, b, c, d]) => [a, b, c, d],
            _ => RWANDA_BOUNDS,
        }
    }
}

/// Where a bundle is written.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Directory the bundle is written to (created if missing).
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Bundle file name.
    #[arg(long, default_value = MODEL_FILE_NAME)]
    pub file_name: String,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Fitted classifier as JSON.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    /// Fitted feature scaler as JSON.
    #[arg(long, value_name = "JSON")]
    pub scaler: PathBuf,

    /// Held-out accuracy in [0, 1].
    #[arg(long)]
    pub accuracy: Option<f64>,

    #[arg(long, default_value = "RandomForestClassifier")]
    pub model_type: String,

    #[arg(long)]
    pub n_estimators: Option<u32>,

    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Feature width the model was trained on, if the model JSON does not say.
    #[arg(long)]
    pub n_features: Option<usize>,

    #[arg(long)]
    pub training_samples: Option<usize>,

    #[arg(long)]
    pub test_samples: Option<usize>,

    /// Class labels, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub classes: Option<Vec<String>>,

    /// Bundle version string.
    #[arg(long, default_value = crate::export::DEFAULT_VERSION)]
    pub bundle_version: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DummyArgs {
    /// Seed for the synthetic training data.
    #[arg(long, default_value_t = DUMMY_SEED)]
    pub seed: u64,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Do not ask for confirmation.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Debug, Args, Clone)]
pub struct LocateArgs {
    /// Directory to search from.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Bundle file name to look for.
    #[arg(long, default_value = MODEL_FILE_NAME)]
    pub file_name: String,
}
