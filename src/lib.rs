//! `sentinel-prep` library crate.
//!
//! The binary (`sprep`) is a thin wrapper around this library so that:
//!
//! - the tile, merge and export logic is testable without spawning processes
//! - the remote service and HTTP transport can be swapped for fakes
//!
//! Two workflows live here: the tiled Earth Engine download and mosaic
//! (`tiling`, `raster`, `app::pipeline`) and the model bundle export
//! (`export`, `io`).

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod export;
pub mod io;
pub mod logging;
pub mod raster;
pub mod report;
pub mod tiling;
