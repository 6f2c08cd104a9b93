//! The tiled download workflow:
//! initialize -> grid -> fetch every cell per source -> merge per source.
//!
//! Fetching is sequential with a fixed pause between requests. A tile that
//! fails is recorded and skipped; a source whose merge fails makes the whole
//! run unsuccessful, but the other source is still merged.

use std::collections::BTreeSet;
use std::fs;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::data::RasterService;
use crate::domain::{DownloadConfig, RasterSource, TileRecord};
use crate::error::AppError;
use crate::raster::{MergeSummary, MosaicError, merge_tiles};
use crate::tiling::{TileFetcher, TileTransport, build_grid};

/// Tiles and merge result for one source.
#[derive(Debug)]
pub struct SourceReport {
    pub source: RasterSource,
    pub tiles: Vec<TileRecord>,
    pub merge: Result<MergeSummary, MosaicError>,
}

impl SourceReport {
    pub fn downloaded(&self) -> usize {
        self.tiles.iter().filter(|t| !t.is_skipped()).count()
    }

    pub fn skipped_cells(&self) -> BTreeSet<usize> {
        self.tiles
            .iter()
            .filter(|t| t.is_skipped())
            .map(|t| t.cell.index)
            .collect()
    }
}

/// All outputs of one `download` run.
#[derive(Debug)]
pub struct DownloadReport {
    pub cells: usize,
    pub sources: Vec<SourceReport>,
    /// Cells present in some sources but not others.
    pub misaligned: BTreeSet<usize>,
}

impl DownloadReport {
    pub fn is_success(&self) -> bool {
        self.sources.iter().all(|s| s.merge.is_ok())
    }

    /// Turn failed merges into one application error naming every failed source.
    pub fn ensure_merged(&self) -> Result<(), AppError> {
        if self.is_success() {
            return Ok(());
        }
        let failed: Vec<String> = self
            .sources
            .iter()
            .filter_map(|s| s.merge.as_ref().err().map(|err| format!("{}: {err}", s.source.label)))
            .collect();
        Err(AppError::failure(format!("Merge failed for {}", failed.join("; "))))
    }
}

/// Run the download for every configured source.
///
/// Only initialization and work-directory failures abort early; everything
/// else is reported in the returned `DownloadReport`.
pub fn run_download<S, T>(config: &DownloadConfig, service: &S, transport: &T) -> Result<DownloadReport, AppError>
where
    S: RasterService,
    T: TileTransport,
{
    run_download_with(config, service, transport, thread::sleep)
}

/// `run_download` with the pause between requests supplied by the caller.
pub fn run_download_with<S, T, P>(
    config: &DownloadConfig,
    service: &S,
    transport: &T,
    mut pause: P,
) -> Result<DownloadReport, AppError>
where
    S: RasterService,
    T: TileTransport,
    P: FnMut(Duration),
{
    info!("Initializing Earth Engine session");
    service.initialize()?;

    fs::create_dir_all(&config.work_dir).map_err(|e| {
        AppError::failure(format!(
            "Failed to create work directory '{}': {e}",
            config.work_dir.display()
        ))
    })?;

    let cells = build_grid(&config.bounds, config.grid);
    info!(
        "Split {} into {}x{} = {} tiles",
        config.bounds,
        config.grid.nx(),
        config.grid.ny(),
        cells.len()
    );

    let fetcher = TileFetcher {
        service,
        transport,
        params: config.params(),
        max_bytes: config.max_tile_bytes,
    };

    let mut requests = 0usize;
    let mut fetched = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        info!("Downloading {} tiles", source.label);
        let mut tiles = Vec::with_capacity(cells.len());
        for cell in &cells {
            if requests > 0 && !config.request_delay.is_zero() {
                pause(config.request_delay);
            }
            requests += 1;

            let label = format!("{} {}/{}", source.label, cell.index, cells.len());
            let path = source.tile_path(&config.work_dir, cell);
            tiles.push(fetcher.fetch(&source.query, cell, &path, &label));
        }
        fetched.push((source, tiles));
    }

    let mut sources = Vec::with_capacity(fetched.len());
    for (source, tiles) in fetched {
        let paths: Vec<_> = tiles.iter().filter_map(|t| t.path().map(|p| p.to_path_buf())).collect();
        let merge = merge_tiles(&paths, &source.output);
        match &merge {
            Ok(summary) => info!(
                "{} merged: {} tiles -> {} ({}x{}, {:.1}MB)",
                source.label,
                summary.tiles,
                summary.output.display(),
                summary.width,
                summary.height,
                summary.bytes as f64 / crate::domain::MIB as f64
            ),
            Err(err) => warn!("{} merge failed: {err}", source.label),
        }
        sources.push(SourceReport {
            source: source.clone(),
            tiles,
            merge,
        });
    }

    let misaligned = misaligned_cells(&sources);
    if !misaligned.is_empty() {
        warn!(
            cells = ?misaligned,
            "sources dropped different cells; imagery and labels do not cover the same area"
        );
    }

    if let Err(err) = fs::remove_dir(&config.work_dir) {
        debug!("keeping work directory {}: {err}", config.work_dir.display());
    }

    Ok(DownloadReport {
        cells: cells.len(),
        sources,
        misaligned,
    })
}

/// Cells skipped by at least one source but not by all of them.
fn misaligned_cells(sources: &[SourceReport]) -> BTreeSet<usize> {
    let skipped: Vec<BTreeSet<usize>> = sources.iter().map(SourceReport::skipped_cells).collect();
    let Some(first) = skipped.first() else {
        return BTreeSet::new();
    };
    let union: BTreeSet<usize> = skipped.iter().flatten().copied().collect();
    let common: BTreeSet<usize> = skipped
        .iter()
        .skip(1)
        .fold(first.clone(), |acc, s| acc.intersection(s).copied().collect());
    union.difference(&common).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;

    use crate::data::ServiceError;
    use crate::domain::{BoundingBox, DownloadParams, GridSpec, ImageQuery, SourceKind};
    use crate::raster::{GeoKeys, GeoTransform, Raster, Samples, encode_geotiff, read_geotiff};
    use crate::tiling::fakes::{FakeService, FakeTransport};

    fn source(kind: SourceKind, prefix: &str, output: &Path) -> RasterSource {
        RasterSource {
            kind,
            label: prefix.to_string(),
            tile_prefix: prefix.to_string(),
            query: ImageQuery::Asset {
                asset_id: format!("test/{prefix}"),
                bands: vec!["b".to_string()],
                clip: None,
            },
            output: output.to_path_buf(),
        }
    }

    fn config(dir: &Path) -> DownloadConfig {
        DownloadConfig {
            bounds: BoundingBox::new(0.0, 0.0, 2.0, 2.0).unwrap(),
            grid: GridSpec::new(2, 2).unwrap(),
            max_tile_bytes: 1024 * 1024,
            request_delay: Duration::ZERO,
            scale_m: 10.0,
            work_dir: dir.join("temp_tiles"),
            sources: vec![
                source(SourceKind::Imagery, "sentinel", &dir.join("sentinel.tif")),
                source(SourceKind::Labels, "labels", &dir.join("labels.tif")),
            ],
        }
    }

    /// A 2x2 GeoTIFF covering `bounds`, keyed by the URL the fake service hands out.
    fn tile_body(bounds: [f64; 4], value: u8) -> (String, (Option<u64>, Vec<u8>)) {
        let raster = Raster {
            width: 2,
            height: 2,
            bands: 1,
            samples: Samples::U8(vec![value; 4]),
            transform: GeoTransform {
                origin_x: bounds[0],
                origin_y: bounds[3],
                pixel_width: (bounds[2] - bounds[0]) / 2.0,
                pixel_height: (bounds[3] - bounds[1]) / 2.0,
            },
            geo_keys: GeoKeys::wgs84(),
            nodata: Some(0.0),
        };
        let mut buf = Cursor::new(Vec::new());
        encode_geotiff(&mut buf, &raster).unwrap();
        let bytes = buf.into_inner();
        let url = format!("mem://{}", bounds.map(|v| v.to_string()).join(","));
        (url, (Some(bytes.len() as u64), bytes))
    }

    fn transport_for(cfg: &DownloadConfig) -> FakeTransport {
        let bodies = build_grid(&cfg.bounds, cfg.grid)
            .iter()
            .map(|c| tile_body(c.bounds.to_array(), c.index as u8))
            .collect();
        FakeTransport {
            bodies,
            default_body: None,
        }
    }

    #[test]
    fn downloads_and_merges_both_sources() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let service = FakeService::default();

        let report = run_download(&cfg, &service, &transport_for(&cfg)).unwrap();

        assert!(report.is_success());
        assert!(report.ensure_merged().is_ok());
        assert_eq!(report.cells, 4);
        assert!(report.misaligned.is_empty());
        assert_eq!(*service.calls.borrow(), 8);
        for s in &report.sources {
            assert_eq!(s.downloaded(), 4);
            let summary = s.merge.as_ref().unwrap();
            assert_eq!((summary.width, summary.height), (4, 4));
        }

        let merged = read_geotiff(&dir.path().join("sentinel.tif")).unwrap();
        assert_eq!(merged.bounds(), (0.0, 0.0, 2.0, 2.0));
        // Cell order is column-major over longitude: cell 1 is bottom-left.
        let Samples::U8(px) = merged.samples else {
            panic!("expected u8 samples");
        };
        assert_eq!(px[12], 1);
        assert_eq!(px[0], 2);
        assert_eq!(px[3], 4);

        assert!(!cfg.work_dir.exists(), "empty work directory is removed");
    }

    #[test]
    fn requests_are_spaced_by_the_configured_delay() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.request_delay = Duration::from_millis(250);
        let service = FakeService::default();

        // Requests already issued when each pause happens.
        let mut pauses = Vec::new();
        let report = run_download_with(&cfg, &service, &transport_for(&cfg), |d| {
            pauses.push((d, *service.calls.borrow()))
        })
        .unwrap();

        assert!(report.is_success());
        assert_eq!(*service.calls.borrow(), 8);
        let expected: Vec<_> = (1..8).map(|n| (Duration::from_millis(250), n)).collect();
        assert_eq!(pauses, expected);
    }

    #[test]
    fn zero_delay_never_pauses() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let mut pauses = 0;
        run_download_with(&cfg, &FakeService::default(), &transport_for(&cfg), |_| pauses += 1).unwrap();
        assert_eq!(pauses, 0);
    }

    #[test]
    fn source_without_tiles_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.sources[1].query = ImageQuery::Asset {
            asset_id: "test/broken".to_string(),
            bands: vec![],
            clip: None,
        };

        struct LabelsRefused(FakeService);
        impl RasterService for LabelsRefused {
            fn initialize(&self) -> Result<(), ServiceError> {
                self.0.initialize()
            }
            fn download_url(
                &self,
                query: &ImageQuery,
                region: &BoundingBox,
                params: &DownloadParams,
            ) -> Result<String, ServiceError> {
                match query {
                    ImageQuery::Asset { asset_id, .. } if asset_id == "test/broken" => Err(ServiceError::Status {
                        status: 400,
                        body: "Image.load: asset not found".to_string(),
                    }),
                    _ => self.0.download_url(query, region, params),
                }
            }
        }

        let report = run_download(&cfg, &LabelsRefused(FakeService::default()), &transport_for(&cfg)).unwrap();

        assert!(!report.is_success());
        assert!(report.sources[0].merge.is_ok());
        assert!(matches!(report.sources[1].merge, Err(MosaicError::NoTiles)));
        assert!(!dir.path().join("labels.tif").exists());
        assert_eq!(report.misaligned, BTreeSet::from([1, 2, 3, 4]));

        let err = report.ensure_merged().unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_FAILURE);
        assert!(err.to_string().starts_with("Merge failed for labels: "), "{err}");
    }

    #[test]
    fn cell_skipped_by_every_source_is_not_misaligned() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let service = FakeService {
            fail_regions: vec![[1.0, 1.0, 2.0, 2.0]],
            ..FakeService::default()
        };

        let report = run_download(&cfg, &service, &transport_for(&cfg)).unwrap();
        assert!(report.is_success());
        assert!(report.misaligned.is_empty());
        for s in &report.sources {
            assert_eq!(s.skipped_cells(), BTreeSet::from([4]));
            assert_eq!(s.merge.as_ref().unwrap().tiles, 3);
        }
    }

    #[test]
    fn misaligned_cells_are_the_symmetric_difference() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let cells = build_grid(&cfg.bounds, cfg.grid);
        let record = |idx: usize, skipped: bool| TileRecord {
            cell: cells[idx - 1],
            outcome: if skipped {
                crate::domain::TileOutcome::Skipped(crate::domain::SkipReason::Network("timeout".into()))
            } else {
                crate::domain::TileOutcome::Downloaded {
                    path: dir.path().join(format!("t{idx}.tif")),
                    bytes: 1,
                }
            },
        };
        let sources = vec![
            SourceReport {
                source: cfg.sources[0].clone(),
                tiles: vec![record(1, true), record(2, true), record(3, false)],
                merge: Err(MosaicError::NoTiles),
            },
            SourceReport {
                source: cfg.sources[1].clone(),
                tiles: vec![record(1, true), record(2, false), record(3, true)],
                merge: Err(MosaicError::NoTiles),
            },
        ];
        assert_eq!(misaligned_cells(&sources), BTreeSet::from([2, 3]));
    }

    #[test]
    fn initialization_failure_is_fatal() {
        struct Offline;
        impl RasterService for Offline {
            fn initialize(&self) -> Result<(), ServiceError> {
                Err(ServiceError::Auth("token expired".to_string()))
            }
            fn download_url(&self, _: &ImageQuery, _: &BoundingBox, _: &DownloadParams) -> Result<String, ServiceError> {
                unreachable!("no downloads after a failed initialize")
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let err = run_download(&cfg, &Offline, &FakeTransport::default()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(!cfg.work_dir.exists());
    }
}
