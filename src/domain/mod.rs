//! Domain types used throughout the pipelines.
//!
//! This module defines:
//!
//! - geometry values (`BoundingBox`, `GridSpec`, `GridCell`)
//! - raster source descriptions (`RasterSource`, `ImageQuery`)
//! - per-tile results (`TileRecord`, `TileOutcome`, `SkipReason`)
//! - the download run configuration (`DownloadConfig`)

pub mod types;

pub use types::*;
