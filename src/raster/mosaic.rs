//! Tile mosaicking.
//!
//! The merged grid spans the union of all tile extents at the first tile's
//! pixel size. Tiles are pasted in order and, band by band, the first valid
//! sample at each location wins; later tiles only fill samples that are still
//! nodata. Nothing is resampled, so every tile must share the first tile's
//! pixel size, band count and sample type.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::geotiff::{GeoTransform, Raster, RasterError, Samples, read_geotiff, write_geotiff};

/// Relative tolerance when comparing pixel sizes between tiles.
const RESOLUTION_RTOL: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("no tiles to merge")]
    NoTiles,
    #[error("tile {tile} has {found} band(s), expected {expected}")]
    BandMismatch { tile: usize, found: u16, expected: u16 },
    #[error("tile {tile} has {found} samples, expected {expected}")]
    SampleTypeMismatch {
        tile: usize,
        found: &'static str,
        expected: &'static str,
    },
    #[error("tile {tile} pixel size {found:?} differs from {expected:?}")]
    ResolutionMismatch {
        tile: usize,
        found: (f64, f64),
        expected: (f64, f64),
    },
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// What a successful merge produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub tiles: usize,
    pub width: u32,
    pub height: u32,
    pub bands: u16,
    pub bytes: u64,
}

/// Merge the tile files that exist into `output`, then delete them.
///
/// Paths that no longer exist are ignored; if none remain nothing is written.
pub fn merge_tiles(tiles: &[PathBuf], output: &Path) -> Result<MergeSummary, MosaicError> {
    let present: Vec<&PathBuf> = tiles.iter().filter(|p| p.exists()).collect();
    if present.is_empty() {
        return Err(MosaicError::NoTiles);
    }

    info!("Merging {} tiles into {}", present.len(), output.display());
    let rasters = present
        .iter()
        .map(|p| read_geotiff(p))
        .collect::<Result<Vec<_>, _>>()?;

    let merged = merge_rasters(&rasters)?;
    write_geotiff(output, &merged)?;
    drop(rasters);

    for path in &present {
        if let Err(err) = fs::remove_file(path) {
            warn!("failed to remove tile {}: {err}", path.display());
        }
    }

    let bytes = fs::metadata(output)
        .map_err(|source| RasterError::Io {
            path: output.to_path_buf(),
            source,
        })?
        .len();

    Ok(MergeSummary {
        output: output.to_path_buf(),
        tiles: present.len(),
        width: merged.width,
        height: merged.height,
        bands: merged.bands,
        bytes,
    })
}

/// Merge in-memory rasters. The first raster defines resolution, bands,
/// sample type, GeoKeys and nodata.
pub fn merge_rasters(rasters: &[Raster]) -> Result<Raster, MosaicError> {
    let first = rasters.first().ok_or(MosaicError::NoTiles)?;
    let res = (first.transform.pixel_width, first.transform.pixel_height);

    let (mut left, mut bottom, mut right, mut top) = first.bounds();
    for (idx, r) in rasters.iter().enumerate().skip(1) {
        let tile = idx + 1;
        if r.bands != first.bands {
            return Err(MosaicError::BandMismatch {
                tile,
                found: r.bands,
                expected: first.bands,
            });
        }
        if r.samples.type_name() != first.samples.type_name() {
            return Err(MosaicError::SampleTypeMismatch {
                tile,
                found: r.samples.type_name(),
                expected: first.samples.type_name(),
            });
        }
        let found = (r.transform.pixel_width, r.transform.pixel_height);
        if !close(found.0, res.0) || !close(found.1, res.1) {
            return Err(MosaicError::ResolutionMismatch {
                tile,
                found,
                expected: res,
            });
        }
        let (l, b, rt, t) = r.bounds();
        left = left.min(l);
        bottom = bottom.min(b);
        right = right.max(rt);
        top = top.max(t);
    }

    let width = (((right - left) / res.0).round() as u32).max(1);
    let height = (((top - bottom) / res.1).round() as u32).max(1);
    let offsets: Vec<(i64, i64)> = rasters
        .iter()
        .map(|r| {
            let col = ((r.transform.origin_x - left) / res.0).round() as i64;
            let row = ((top - r.transform.origin_y) / res.1).round() as i64;
            (col, row)
        })
        .collect();
    debug!(width, height, tiles = rasters.len(), "mosaic grid");

    let layout = Layout {
        width,
        height,
        bands: first.bands as usize,
        nodata: first.nodata,
    };
    let samples = match &first.samples {
        Samples::U8(_) => paste::<u8>(rasters, &offsets, &layout),
        Samples::U16(_) => paste::<u16>(rasters, &offsets, &layout),
        Samples::F32(_) => paste::<f32>(rasters, &offsets, &layout),
        Samples::F64(_) => paste::<f64>(rasters, &offsets, &layout),
    };

    Ok(Raster {
        width,
        height,
        bands: first.bands,
        samples,
        transform: GeoTransform {
            origin_x: left,
            origin_y: top,
            pixel_width: res.0,
            pixel_height: res.1,
        },
        geo_keys: first.geo_keys.clone(),
        nodata: first.nodata,
    })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= RESOLUTION_RTOL * a.abs().max(b.abs())
}

struct Layout {
    width: u32,
    height: u32,
    bands: usize,
    nodata: Option<f64>,
}

trait Sample: Copy + Into<f64> {
    fn from_f64(v: f64) -> Self;
    fn slice(samples: &Samples) -> Option<&[Self]>;
    fn wrap(data: Vec<Self>) -> Samples;
}

macro_rules! impl_sample {
    ($ty:ty, $variant:ident) => {
        impl Sample for $ty {
            fn from_f64(v: f64) -> Self {
                v as $ty
            }
            fn slice(samples: &Samples) -> Option<&[Self]> {
                match samples {
                    Samples::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }
            fn wrap(data: Vec<Self>) -> Samples {
                Samples::$variant(data)
            }
        }
    };
}

impl_sample!(u8, U8);
impl_sample!(u16, U16);
impl_sample!(f32, F32);
impl_sample!(f64, F64);

fn paste<T: Sample>(rasters: &[Raster], offsets: &[(i64, i64)], layout: &Layout) -> Samples {
    let bands = layout.bands;
    let (w, h) = (layout.width as i64, layout.height as i64);
    let fill = T::from_f64(layout.nodata.unwrap_or(0.0));
    let mut out = vec![fill; (w * h) as usize * bands];
    let mut filled = vec![false; out.len()];

    for (raster, &(col_off, row_off)) in rasters.iter().zip(offsets) {
        let Some(src) = T::slice(&raster.samples) else {
            continue;
        };
        let src_w = raster.width as i64;
        for row in 0..raster.height as i64 {
            let dst_row = row + row_off;
            if !(0..h).contains(&dst_row) {
                continue;
            }
            for col in 0..src_w {
                let dst_col = col + col_off;
                if !(0..w).contains(&dst_col) {
                    continue;
                }
                let di = (dst_row * w + dst_col) as usize * bands;
                let si = (row * src_w + col) as usize * bands;
                for band in 0..bands {
                    let value = src[si + band];
                    if filled[di + band] || is_nodata(value.into(), layout.nodata) {
                        continue;
                    }
                    out[di + band] = value;
                    filled[di + band] = true;
                }
            }
        }
    }

    T::wrap(out)
}

fn is_nodata(v: f64, nodata: Option<f64>) -> bool {
    match nodata {
        Some(nd) if nd.is_nan() => v.is_nan(),
        Some(nd) => v == nd,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::geotiff::GeoKeys;

    fn tile(origin_x: f64, origin_y: f64, width: u32, height: u32, values: Vec<u8>) -> Raster {
        Raster {
            width,
            height,
            bands: 1,
            samples: Samples::U8(values),
            transform: GeoTransform {
                origin_x,
                origin_y,
                pixel_width: 1.0,
                pixel_height: 1.0,
            },
            geo_keys: GeoKeys::wgs84(),
            nodata: Some(0.0),
        }
    }

    #[test]
    fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sentinel.tif");

        assert!(matches!(merge_tiles(&[], &out), Err(MosaicError::NoTiles)));
        let missing = vec![dir.path().join("sentinel_1.tif")];
        assert!(matches!(merge_tiles(&missing, &out), Err(MosaicError::NoTiles)));
        assert!(!out.exists());
    }

    #[test]
    fn single_tile_merge_reproduces_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("labels_1.tif");
        let out = dir.path().join("labels.tif");
        let original = tile(29.0, -1.0, 2, 2, vec![10, 20, 30, 40]);
        write_geotiff(&input, &original).unwrap();

        let summary = merge_tiles(&[input.clone()], &out).unwrap();
        assert_eq!(summary.tiles, 1);
        assert_eq!((summary.width, summary.height), (2, 2));
        assert!(summary.bytes > 0);
        assert!(!input.exists(), "inputs are deleted after merge");

        let merged = read_geotiff(&out).unwrap();
        assert_eq!(merged.samples, original.samples);
        assert_eq!(merged.transform, original.transform);
    }

    #[test]
    fn adjacent_tiles_are_placed_by_georeference() {
        // Left tile covers x 0..2, right tile x 2..4; both span y 1..0.
        let left = tile(0.0, 1.0, 2, 1, vec![1, 2]);
        let right = tile(2.0, 1.0, 2, 1, vec![3, 4]);

        let merged = merge_rasters(&[right, left]).unwrap();
        assert_eq!((merged.width, merged.height), (4, 1));
        assert_eq!(merged.samples, Samples::U8(vec![1, 2, 3, 4]));
        assert_eq!(merged.transform.origin_x, 0.0);
    }

    #[test]
    fn gaps_keep_nodata_and_first_valid_pixel_wins() {
        let a = tile(0.0, 2.0, 2, 1, vec![5, 0]);
        let b = tile(0.0, 2.0, 2, 1, vec![7, 8]);
        let c = tile(0.0, 1.0, 1, 1, vec![0]);

        let merged = merge_rasters(&[a, b, c]).unwrap();
        assert_eq!((merged.width, merged.height), (2, 2));
        // Row 0: a wins at col 0, b fills a's nodata at col 1. Row 1 stays empty.
        assert_eq!(merged.samples, Samples::U8(vec![5, 8, 0, 0]));
    }

    #[test]
    fn each_band_is_filled_independently() {
        let mut a = tile(0.0, 1.0, 1, 1, vec![]);
        a.bands = 3;
        a.samples = Samples::U8(vec![9, 0, 0]);
        let mut b = a.clone();
        b.samples = Samples::U8(vec![1, 2, 0]);
        let mut c = a.clone();
        c.samples = Samples::U8(vec![3, 4, 5]);

        let merged = merge_rasters(&[a, b, c]).unwrap();
        // Band 0 from a, band 1 from b, band 2 only c has.
        assert_eq!(merged.samples, Samples::U8(vec![9, 2, 5]));
    }

    #[test]
    fn mismatched_tiles_are_rejected() {
        let a = tile(0.0, 1.0, 1, 1, vec![1]);
        let mut b = tile(1.0, 1.0, 1, 1, vec![1]);
        b.transform.pixel_width = 2.0;
        assert!(matches!(
            merge_rasters(&[a.clone(), b]),
            Err(MosaicError::ResolutionMismatch { tile: 2, .. })
        ));

        let mut c = tile(1.0, 1.0, 1, 1, vec![]);
        c.samples = Samples::U16(vec![1]);
        assert!(matches!(
            merge_rasters(&[a, c]),
            Err(MosaicError::SampleTypeMismatch { tile: 2, .. })
        ));
    }
}
