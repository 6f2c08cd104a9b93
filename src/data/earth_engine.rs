//! Earth Engine REST API integration.
//!
//! Queries are sent as expression graphs to the `thumbnails` endpoint, which
//! answers with a resource name; the pixels are then downloadable, without
//! credentials, from `{base}/v1/{name}:getPixels` until the resource expires.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{RasterService, ServiceError};
use crate::domain::{AdminBoundary, BoundingBox, DownloadParams, ImageQuery};

const DEFAULT_BASE_URL: &str = "https://earthengine.googleapis.com";

const ENV_PROJECT: &str = "EE_PROJECT";
const ENV_TOKEN: &str = "EE_ACCESS_TOKEN";
const ENV_BASE_URL: &str = "EE_API_URL";

/// Reprojection target for every tile; `scale` is applied in metres on top.
const TILE_CRS: &str = "EPSG:4326";

pub struct EarthEngineClient {
    client: Client,
    base_url: String,
    project: String,
    access_token: String,
}

impl EarthEngineClient {
    /// Build a client from `EE_PROJECT` / `EE_ACCESS_TOKEN` (`.env` is honoured).
    pub fn from_env() -> Result<Self, ServiceError> {
        dotenvy::dotenv().ok();
        let project = std::env::var(ENV_PROJECT)
            .map_err(|_| ServiceError::Auth(format!("missing {ENV_PROJECT} in environment (.env)")))?;
        let access_token = std::env::var(ENV_TOKEN).map_err(|_| {
            ServiceError::Auth(format!(
                "missing {ENV_TOKEN} in environment (.env); create one with `gcloud auth print-access-token`"
            ))
        })?;
        let base_url = std::env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(base_url, project, access_token))
    }

    pub fn new(base_url: impl Into<String>, project: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project: project.into(),
            access_token: access_token.into(),
        }
    }

    fn project_url(&self, suffix: &str) -> String {
        format!("{}/v1/projects/{}{}", self.base_url, self.project, suffix)
    }
}

impl RasterService for EarthEngineClient {
    fn initialize(&self) -> Result<(), ServiceError> {
        let resp = self
            .client
            .get(self.project_url(":listAssets"))
            .query(&[("pageSize", "1")])
            .bearer_auth(&self.access_token)
            .send()
            .map_err(|e| ServiceError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp.text().unwrap_or_default();
        session_status(status, body, &self.project)
    }

    fn download_url(
        &self,
        query: &ImageQuery,
        region: &BoundingBox,
        params: &DownloadParams,
    ) -> Result<String, ServiceError> {
        let body = json!({
            "expression": tile_expression(query, region, params),
            "fileFormat": params.format.as_str(),
        });
        debug!(region = %region, "requesting download id");

        let resp = self
            .client
            .post(self.project_url("/thumbnails"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .map_err(|e| ServiceError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .map_err(|e| ServiceError::Request(format!("failed to read thumbnail response: {e}")))?;
        let name = thumbnail_name(status, &text)?;
        Ok(pixels_url(&self.base_url, &name))
    }
}

/// Map the `listAssets` answer onto a usable session or the reason it is not.
fn session_status(status: u16, body: String, project: &str) -> Result<(), ServiceError> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(ServiceError::Auth(format!(
            "credentials rejected for project '{project}' (HTTP {status})"
        ))),
        status => Err(ServiceError::Status { status, body }),
    }
}

/// Resource name from a `thumbnails` answer.
fn thumbnail_name(status: u16, body: &str) -> Result<String, ServiceError> {
    if !(200..=299).contains(&status) {
        return Err(ServiceError::Status {
            status,
            body: body.to_string(),
        });
    }
    let created: ThumbnailResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::InvalidResponse(format!("failed to parse thumbnail response: {e}")))?;
    if created.name.is_empty() {
        return Err(ServiceError::InvalidResponse("thumbnail response has no name".to_string()));
    }
    Ok(created.name)
}

fn pixels_url(base_url: &str, name: &str) -> String {
    format!("{base_url}/v1/{name}:getPixels")
}

#[derive(Debug, Deserialize)]
struct ThumbnailResponse {
    name: String,
}

/// Full request expression: the query clipped to `region` at `params.scale_m`.
pub fn tile_expression(query: &ImageQuery, region: &BoundingBox, params: &DownloadParams) -> Value {
    let clipped = call(
        "Image.clip",
        [("input", image_node(query)), ("geometry", rectangle(region))],
    );
    let root = call(
        "Image.reproject",
        [
            ("image", clipped),
            ("crs", call("Projection", [("crs", constant(TILE_CRS))])),
            ("scale", constant(params.scale_m)),
        ],
    );
    json!({ "result": "0", "values": { "0": root } })
}

fn image_node(query: &ImageQuery) -> Value {
    let (image, bands, clip) = match query {
        ImageQuery::MedianComposite {
            collection,
            start,
            end,
            cloud_property,
            max_cloud_percent,
            bands,
            clip,
        } => {
            let mut coll = call("ImageCollection.load", [("id", constant(collection))]);
            if let Some(boundary) = clip {
                coll = filter(
                    coll,
                    call(
                        "Filter.intersects",
                        [("leftField", constant(".all")), ("rightValue", boundary_node(boundary))],
                    ),
                );
            }
            coll = filter(
                coll,
                call(
                    "Filter.dateRangeContains",
                    [
                        (
                            "leftValue",
                            call(
                                "DateRange",
                                [
                                    ("start", constant(start.format("%Y-%m-%d").to_string())),
                                    ("end", constant(end.format("%Y-%m-%d").to_string())),
                                ],
                            ),
                        ),
                        ("rightField", constant("system:time_start")),
                    ],
                ),
            );
            coll = filter(
                coll,
                call(
                    "Filter.lessThan",
                    [("leftField", constant(cloud_property)), ("rightValue", constant(max_cloud_percent))],
                ),
            );
            (call("reduce.median", [("collection", coll)]), bands, clip)
        }
        ImageQuery::Asset { asset_id, bands, clip } => {
            (call("Image.load", [("id", constant(asset_id))]), bands, clip)
        }
    };

    let mut image = call(
        "Image.select",
        [("input", image), ("bandSelectors", constant(bands))],
    );
    if let Some(boundary) = clip {
        image = call(
            "Image.clipToCollection",
            [("input", image), ("collection", boundary_node(boundary))],
        );
    }
    image
}

fn boundary_node(boundary: &AdminBoundary) -> Value {
    filter(
        call("Collection.loadTable", [("tableId", constant(&boundary.table_id))]),
        call(
            "Filter.equals",
            [("leftField", constant(&boundary.field)), ("rightValue", constant(&boundary.value))],
        ),
    )
}

fn rectangle(region: &BoundingBox) -> Value {
    call(
        "GeometryConstructors.Rectangle",
        [
            ("coordinates", constant(region)),
            ("geodesic", constant(false)),
        ],
    )
}

fn filter(collection: Value, predicate: Value) -> Value {
    call("Collection.filter", [("collection", collection), ("filter", predicate)])
}

fn call<const N: usize>(name: &str, args: [(&str, Value); N]) -> Value {
    let arguments: Map<String, Value> = args.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    json!({ "functionInvocationValue": { "functionName": name, "arguments": arguments } })
}

fn constant(value: impl serde::Serialize) -> Value {
    json!({ "constantValue": value })
}
