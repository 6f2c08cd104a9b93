//! Shared domain types.
//!
//! These types are deliberately plain data so they can be:
//!
//! - built from CLI flags without touching the network
//! - passed between the grid, fetch, and merge stages by value
//! - asserted on directly in tests

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Tiles advertised above this size are skipped.
pub const DEFAULT_MAX_TILE_BYTES: u64 = 50 * MIB;

/// Rwanda extent as `[min_lon, min_lat, max_lon, max_lat]`.
pub const RWANDA_BOUNDS: [f64; 4] = [28.85, -2.85, 30.90, -1.05];

/// Ground sample distance (metres) requested for every tile.
pub const DEFAULT_SCALE_M: f64 = 10.0;

/// Courtesy pause between consecutive remote requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);

/// Errors raised while constructing geometry values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error(
        "invalid bounding box [{min_lon}, {min_lat}, {max_lon}, {max_lat}]: min must be < max on both axes"
    )]
    InvalidBounds {
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    },
    #[error("grid dimensions must be positive (got {nx}x{ny})")]
    EmptyGrid { nx: usize, ny: usize },
}

/// Axis-aligned lon/lat rectangle.
///
/// Fields are private so the `min < max` invariant holds for every value.
/// Serialized as `[min_lon, min_lat, max_lon, max_lat]`; deserializing goes
/// through [`BoundingBox::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, GeometryError> {
        let finite = [min_lon, min_lat, max_lon, max_lat].iter().all(|v| v.is_finite());
        if !finite || min_lon >= max_lon || min_lat >= max_lat {
            return Err(GeometryError::InvalidBounds {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
            });
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Sub-box whose edge ordering the caller already guarantees.
    pub(crate) fn from_ordered(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        debug_assert!(min_lon < max_lon && min_lat < max_lat);
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    pub fn from_array(bounds: [f64; 4]) -> Result<Self, GeometryError> {
        Self::new(bounds[0], bounds[1], bounds[2], bounds[3])
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// `[min_lon, min_lat, max_lon, max_lat]`, the order the remote service expects.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    /// True when `other` lies inside `self` (edges inclusive, within `tol`).
    pub(crate) fn contains(&self, other: &BoundingBox, tol: f64) -> bool {
        other.min_lon >= self.min_lon - tol
            && other.min_lat >= self.min_lat - tol
            && other.max_lon <= self.max_lon + tol
            && other.max_lat <= self.max_lat + tol
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = GeometryError;

    fn try_from(bounds: [f64; 4]) -> Result<Self, Self::Error> {
        Self::from_array(bounds)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bounds: BoundingBox) -> Self {
        bounds.to_array()
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}, {:.4}, {:.4}]",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Number of tiles along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    nx: usize,
    ny: usize,
}

impl GridSpec {
    pub fn new(nx: usize, ny: usize) -> Result<Self, GeometryError> {
        if nx == 0 || ny == 0 {
            return Err(GeometryError::EmptyGrid { nx, ny });
        }
        Ok(Self { nx, ny })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn cell_count(&self) -> usize {
        self.nx * self.ny
    }
}

/// One sub-rectangle of a parent box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// 1-based position in generation order (used in tile file names).
    pub index: usize,
    /// Column index along longitude.
    pub i: usize,
    /// Row index along latitude.
    pub j: usize,
    pub bounds: BoundingBox,
}

/// Output encoding requested from the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    #[serde(rename = "GEO_TIFF")]
    GeoTiff,
}

impl RasterFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            RasterFormat::GeoTiff => "GEO_TIFF",
        }
    }
}

/// Per-request export parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadParams {
    pub scale_m: f64,
    pub format: RasterFormat,
}

/// Administrative boundary used to clip a query.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminBoundary {
    pub table_id: String,
    pub field: String,
    pub value: String,
}

impl AdminBoundary {
    /// GAUL level-0 country outline.
    pub fn country(name: &str) -> Self {
        Self {
            table_id: "FAO/GAUL/2015/level0".to_string(),
            field: "ADM0_NAME".to_string(),
            value: name.to_string(),
        }
    }
}

/// What image to export, described independently of any region.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageQuery {
    /// Per-pixel median over a date- and cloud-filtered collection.
    MedianComposite {
        collection: String,
        start: NaiveDate,
        end: NaiveDate,
        cloud_property: String,
        max_cloud_percent: f64,
        bands: Vec<String>,
        clip: Option<AdminBoundary>,
    },
    /// A single image asset.
    Asset {
        asset_id: String,
        bands: Vec<String>,
        clip: Option<AdminBoundary>,
    },
}

/// Which of the two rasters a source produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Imagery,
    Labels,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Imagery => "imagery",
            SourceKind::Labels => "labels",
        }
    }
}

/// A named raster source and where its tiles and mosaic go.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSource {
    pub kind: SourceKind,
    pub label: String,
    /// Tile file stem: `<prefix>_<n>.tif`.
    pub tile_prefix: String,
    pub query: ImageQuery,
    pub output: PathBuf,
}

impl RasterSource {
    /// Sentinel-2 surface reflectance median composite (R, G, B, NIR).
    pub fn sentinel2(country: &str, start: NaiveDate, end: NaiveDate, max_cloud_percent: f64) -> Self {
        Self {
            kind: SourceKind::Imagery,
            label: "Sentinel-2".to_string(),
            tile_prefix: "sentinel".to_string(),
            query: ImageQuery::MedianComposite {
                collection: "COPERNICUS/S2_SR_HARMONIZED".to_string(),
                start,
                end,
                cloud_property: "CLOUDY_PIXEL_PERCENTAGE".to_string(),
                max_cloud_percent,
                bands: ["B4", "B3", "B2", "B8"].iter().map(|b| b.to_string()).collect(),
                clip: Some(AdminBoundary::country(country)),
            },
            output: PathBuf::from("sentinel.tif"),
        }
    }

    /// ESA WorldCover 2021 land-cover classes.
    pub fn worldcover(country: &str) -> Self {
        Self {
            kind: SourceKind::Labels,
            label: "WorldCover".to_string(),
            tile_prefix: "labels".to_string(),
            query: ImageQuery::Asset {
                asset_id: "ESA/WorldCover/v200/2021".to_string(),
                bands: vec!["Map".to_string()],
                clip: Some(AdminBoundary::country(country)),
            },
            output: PathBuf::from("labels.tif"),
        }
    }

    pub fn tile_path(&self, work_dir: &Path, cell: &GridCell) -> PathBuf {
        work_dir.join(format!("{}_{}.tif", self.tile_prefix, cell.index))
    }
}

/// Why a tile was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Advertised content length above the configured ceiling.
    Oversize { advertised: u64, ceiling: u64 },
    /// The body ran past the ceiling while streaming, whatever the header said.
    OversizeBody { ceiling: u64 },
    /// The remote service refused to produce a download URL.
    Service(String),
    /// Transport failure or non-success HTTP status.
    Network(String),
    /// Writing the tile to disk failed.
    Io(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Oversize { advertised, ceiling } => write!(
                f,
                "tile too large ({:.1}MB > {:.1}MB)",
                *advertised as f64 / MIB as f64,
                *ceiling as f64 / MIB as f64
            ),
            SkipReason::OversizeBody { ceiling } => write!(
                f,
                "tile body exceeded the {:.1}MB limit while downloading",
                *ceiling as f64 / MIB as f64
            ),
            SkipReason::Service(msg) => write!(f, "service error: {msg}"),
            SkipReason::Network(msg) => write!(f, "network error: {msg}"),
            SkipReason::Io(msg) => write!(f, "write error: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileOutcome {
    Downloaded { path: PathBuf, bytes: u64 },
    Skipped(SkipReason),
}

/// Result of fetching one grid cell for one source.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRecord {
    pub cell: GridCell,
    pub outcome: TileOutcome,
}

impl TileRecord {
    pub fn path(&self) -> Option<&Path> {
        match &self.outcome {
            TileOutcome::Downloaded { path, .. } => Some(path),
            TileOutcome::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, TileOutcome::Skipped(_))
    }
}

/// A full download run's configuration.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub bounds: BoundingBox,
    pub grid: GridSpec,
    pub max_tile_bytes: u64,
    pub request_delay: Duration,
    pub scale_m: f64,
    /// Directory for transient per-tile files.
    pub work_dir: PathBuf,
    pub sources: Vec<RasterSource>,
}

impl DownloadConfig {
    pub fn params(&self) -> DownloadParams {
        DownloadParams {
            scale_m: self.scale_m,
            format: RasterFormat::GeoTiff,
        }
    }
}
