//! Remote raster service integration.
//!
//! The download pipeline only needs two capabilities from the remote side:
//! check that the session is usable, and turn a query plus a region into a
//! short-lived download URL. Both sit behind [`RasterService`] so the
//! orchestrator can be exercised in tests without network access.

pub mod earth_engine;

use thiserror::Error;

use crate::domain::{BoundingBox, DownloadParams, ImageQuery};

pub use earth_engine::EarthEngineClient;

/// Failures reported by the remote raster service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("not authenticated: {0}")]
    Auth(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Produces signed download URLs for clipped raster exports.
pub trait RasterService {
    /// Verify credentials before any tile is requested.
    fn initialize(&self) -> Result<(), ServiceError>;

    /// Signed, time-limited URL for `query` clipped to `region`.
    fn download_url(
        &self,
        query: &ImageQuery,
        region: &BoundingBox,
        params: &DownloadParams,
    ) -> Result<String, ServiceError>;
}
