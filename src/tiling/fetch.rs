//! Single-tile download.
//!
//! A tile is either written completely or not at all: oversize payloads and
//! every transport/service failure become a [`SkipReason`] instead of an error,
//! so one bad cell never aborts the run.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use reqwest::blocking::Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::data::RasterService;
use crate::domain::{DownloadParams, GridCell, ImageQuery, MIB, SkipReason, TileOutcome, TileRecord};

/// Transport-level failure while opening a download.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status} from download URL")]
    Status { status: u16 },
}

/// An open streaming response.
pub struct TileResponse {
    /// Value of the `content-length` header, if the server sent one.
    pub content_length: Option<u64>,
    pub body: Box<dyn Read>,
}

/// Streaming HTTP GET, injectable for tests.
pub trait TileTransport {
    fn get(&self, url: &str) -> Result<TileResponse, FetchError>;
}

/// Blocking `reqwest` transport with the client's default timeout.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TileTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<TileResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status().as_u16(),
            });
        }

        Ok(TileResponse {
            content_length: resp.content_length(),
            body: Box::new(resp),
        })
    }
}

/// Everything needed to fetch one tile besides the cell itself.
pub struct TileFetcher<'a, S: RasterService, T: TileTransport> {
    pub service: &'a S,
    pub transport: &'a T,
    pub params: DownloadParams,
    pub max_bytes: u64,
}

impl<S: RasterService, T: TileTransport> TileFetcher<'_, S, T> {
    /// Download `cell` of `query` into `output`.
    ///
    /// `label` is only used for log lines (e.g. `Sentinel 3`).
    pub fn fetch(&self, query: &ImageQuery, cell: &GridCell, output: &Path, label: &str) -> TileRecord {
        let outcome = match self.try_fetch(query, cell, output) {
            Ok(bytes) => {
                info!("{label}: {:.1}MB", bytes as f64 / MIB as f64);
                TileOutcome::Downloaded {
                    path: output.to_path_buf(),
                    bytes,
                }
            }
            Err(reason) => {
                warn!(tile = cell.index, bounds = %cell.bounds, "{label} skipped: {reason}");
                TileOutcome::Skipped(reason)
            }
        };
        TileRecord { cell: *cell, outcome }
    }

    fn try_fetch(&self, query: &ImageQuery, cell: &GridCell, output: &Path) -> Result<u64, SkipReason> {
        let url = self
            .service
            .download_url(query, &cell.bounds, &self.params)
            .map_err(|e| SkipReason::Service(e.to_string()))?;

        let resp = self
            .transport
            .get(&url)
            .map_err(|e| SkipReason::Network(e.to_string()))?;

        let advertised = resp.content_length.unwrap_or(0);
        if advertised > self.max_bytes {
            return Err(SkipReason::Oversize {
                advertised,
                ceiling: self.max_bytes,
            });
        }

        match write_capped(resp.body, output, self.max_bytes) {
            Ok(written) if written > self.max_bytes => {
                let _ = fs::remove_file(output);
                Err(SkipReason::OversizeBody {
                    ceiling: self.max_bytes,
                })
            }
            Ok(written) => Ok(written),
            Err(err) => {
                let _ = fs::remove_file(output);
                Err(classify_write_error(err))
            }
        }
    }
}

/// Copy at most `max_bytes + 1` bytes so an understated length is still caught.
fn write_capped(body: Box<dyn Read>, output: &Path, max_bytes: u64) -> io::Result<u64> {
    let mut writer = BufWriter::new(File::create(output)?);
    let written = io::copy(&mut body.take(max_bytes.saturating_add(1)), &mut writer)?;
    writer.flush()?;
    Ok(written)
}

fn classify_write_error(err: io::Error) -> SkipReason {
    // Errors surfaced by the body reader come from the connection, not the disk.
    match err.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::TimedOut
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::Other => SkipReason::Network(err.to_string()),
        _ => SkipReason::Io(err.to_string()),
    }
}
