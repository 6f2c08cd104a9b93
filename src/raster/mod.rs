//! GeoTIFF I/O and mosaicking.

pub mod geotiff;
pub mod mosaic;

pub use geotiff::{
    GeoKeys, GeoTransform, Raster, RasterError, Samples, decode_geotiff, encode_geotiff, read_geotiff, write_geotiff,
};
pub use mosaic::{MergeSummary, MosaicError, merge_rasters, merge_tiles};
