//! In-memory stand-ins for the remote service and the HTTP transport.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;

use crate::data::{RasterService, ServiceError};
use crate::domain::{BoundingBox, DownloadParams, ImageQuery};
use crate::tiling::{FetchError, TileResponse, TileTransport};

/// Hands out `mem://<n>` URLs and optionally fails for some cells.
#[derive(Default)]
pub struct FakeService {
    pub fail_regions: Vec<[f64; 4]>,
    pub calls: RefCell<usize>,
}

impl RasterService for FakeService {
    fn initialize(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    fn download_url(
        &self,
        _query: &ImageQuery,
        region: &BoundingBox,
        _params: &DownloadParams,
    ) -> Result<String, ServiceError> {
        *self.calls.borrow_mut() += 1;
        if self.fail_regions.contains(&region.to_array()) {
            return Err(ServiceError::Status {
                status: 400,
                body: "Total request size must be less than or equal to 50331648 bytes".to_string(),
            });
        }
        Ok(format!("mem://{}", region.to_array().map(|v| v.to_string()).join(",")))
    }
}

/// Serves canned bodies per URL; unknown URLs fail like a dropped connection.
#[derive(Default)]
pub struct FakeTransport {
    pub bodies: HashMap<String, (Option<u64>, Vec<u8>)>,
    pub default_body: Option<(Option<u64>, Vec<u8>)>,
}

impl TileTransport for FakeTransport {
    fn get(&self, url: &str) -> Result<TileResponse, FetchError> {
        let (len, body) = self
            .bodies
            .get(url)
            .or(self.default_body.as_ref())
            .cloned()
            .ok_or_else(|| FetchError::Request(format!("connection refused: {url}")))?;
        Ok(TileResponse {
            content_length: len,
            body: Box::new(Cursor::new(body)),
        })
    }
}
