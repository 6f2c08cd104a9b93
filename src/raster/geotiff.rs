//! Minimal GeoTIFF reader/writer.
//!
//! Supports north-up rasters of u8, u16, f32 or f64 samples with any number of
//! bands, stored pixel-interleaved or band-sequential (planar), in strips or
//! tiles. In memory, samples are always pixel-interleaved. Georeferencing is
//! read from either `ModelPixelScale` + `ModelTiepoint` or
//! `ModelTransformation`, and always written as the former. GeoKey tags and the
//! GDAL nodata tag are carried through unchanged.
//!
//! Multi-band rasters are written band-sequential as MinIsBlack, with every
//! band after the first listed in `ExtraSamples` so readers never take one for
//! alpha.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tiff::TiffError;
use tiff::decoder::{ChunkType, Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{Compression, DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::Tag;

/// Uncompressed bytes per strip the writer aims for.
const STRIP_BYTES: u64 = 1_000_000;

/// `PlanarConfiguration` value for band-sequential storage.
const PLANAR: u16 = 2;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),
    #[error("missing georeferencing (need ModelPixelScale + ModelTiepoint or ModelTransformation)")]
    MissingGeoreference,
    #[error("rotated or sheared rasters are not supported")]
    Rotated,
    #[error("unsupported raster layout: {0}")]
    Unsupported(String),
}

/// North-up affine transform: pixel `(col, row)` has its top-left corner at
/// `(origin_x + col * pixel_width, origin_y - row * pixel_height)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

/// Sample storage, pixel-interleaved (`[p0b0, p0b1, .., p1b0, ..]`).
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::U16(v) => v.len(),
            Samples::F32(v) => v.len(),
            Samples::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Samples::U8(_) => "u8",
            Samples::U16(_) => "u16",
            Samples::F32(_) => "f32",
            Samples::F64(_) => "f64",
        }
    }

    /// Zeroed storage of the same sample type.
    fn zeroed(&self, len: usize) -> Samples {
        match self {
            Samples::U8(_) => Samples::U8(vec![0; len]),
            Samples::U16(_) => Samples::U16(vec![0; len]),
            Samples::F32(_) => Samples::F32(vec![0.0; len]),
            Samples::F64(_) => Samples::F64(vec![0.0; len]),
        }
    }
}

impl TryFrom<DecodingResult> for Samples {
    type Error = RasterError;

    fn try_from(result: DecodingResult) -> Result<Self, Self::Error> {
        match result {
            DecodingResult::U8(v) => Ok(Samples::U8(v)),
            DecodingResult::U16(v) => Ok(Samples::U16(v)),
            DecodingResult::F32(v) => Ok(Samples::F32(v)),
            DecodingResult::F64(v) => Ok(Samples::F64(v)),
            _ => Err(RasterError::Unsupported(
                "sample type other than u8/u16/f32/f64".to_string(),
            )),
        }
    }
}

/// GeoTIFF metadata tags copied verbatim between files.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoKeys {
    pub directory: Option<Vec<u16>>,
    pub doubles: Option<Vec<f64>>,
    pub ascii: Option<String>,
}

impl GeoKeys {
    /// Geographic WGS 84, pixel-is-area.
    pub fn wgs84() -> Self {
        Self {
            directory: Some(vec![
                1, 1, 0, 3, //
                1024, 0, 1, 2, // GTModelType = geographic
                1025, 0, 1, 1, // GTRasterType = pixel is area
                2048, 0, 1, 4326, // GeographicType = WGS 84
            ]),
            doubles: None,
            ascii: None,
        }
    }
}

/// A georeferenced raster held fully in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub bands: u16,
    pub samples: Samples,
    pub transform: GeoTransform,
    pub geo_keys: GeoKeys,
    pub nodata: Option<f64>,
}

impl Raster {
    /// `(left, bottom, right, top)` in map units.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let t = &self.transform;
        let right = t.origin_x + self.width as f64 * t.pixel_width;
        let bottom = t.origin_y - self.height as f64 * t.pixel_height;
        (t.origin_x, bottom, right, t.origin_y)
    }
}

pub fn read_geotiff(path: &Path) -> Result<Raster, RasterError> {
    let file = File::open(path).map_err(|source| RasterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_geotiff(BufReader::new(file))
}

pub fn decode_geotiff<R: Read + Seek>(reader: R) -> Result<Raster, RasterError> {
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());
    let (width, height) = decoder.dimensions()?;

    let transform = read_transform(&mut decoder)?;
    let geo_keys = GeoKeys {
        directory: decoder
            .find_tag(Tag::GeoKeyDirectoryTag)?
            .map(|v| v.into_u16_vec())
            .transpose()?,
        doubles: decoder
            .find_tag(Tag::GeoDoubleParamsTag)?
            .map(|v| v.into_f64_vec())
            .transpose()?,
        ascii: decoder
            .find_tag(Tag::GeoAsciiParamsTag)?
            .map(|v| v.into_string())
            .transpose()?,
    };
    let nodata = decoder
        .find_tag(Tag::GdalNodata)?
        .map(|v| v.into_string())
        .transpose()?
        .and_then(|s| parse_nodata(&s));

    let planar = decoder.find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?.unwrap_or(1) == PLANAR;
    let samples = if planar {
        let bands = decoder.find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?.unwrap_or(1);
        read_planes(&mut decoder, width, height, bands)?
    } else {
        Samples::try_from(decoder.read_image()?)?
    };

    let pixels = width as usize * height as usize;
    if pixels == 0 || samples.len() % pixels != 0 {
        return Err(RasterError::Unsupported(format!(
            "{} samples for a {width}x{height} image",
            samples.len()
        )));
    }
    let bands = u16::try_from(samples.len() / pixels)
        .map_err(|_| RasterError::Unsupported("too many bands".to_string()))?;

    Ok(Raster {
        width,
        height,
        bands,
        samples,
        transform,
        geo_keys,
        nodata,
    })
}

/// Read every plane of a band-sequential image and interleave it.
///
/// Chunks are numbered plane by plane, so chunk `k` of band `b` is stored at
/// index `b * chunks_per_plane + k`.
fn read_planes<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    width: u32,
    height: u32,
    bands: u16,
) -> Result<Samples, RasterError> {
    let chunks = match decoder.get_chunk_type() {
        ChunkType::Strip => decoder.strip_count()?,
        ChunkType::Tile => decoder.tile_count()?,
    };
    let per_plane = chunks / u32::from(bands.max(1));
    let (chunk_width, chunk_height) = decoder.chunk_dimensions();
    let across = width.div_ceil(chunk_width.max(1));

    let mut out: Option<Samples> = None;
    for band in 0..bands {
        for chunk in 0..per_plane {
            let (data_width, _) = decoder.chunk_data_dimensions(chunk);
            let data = Samples::try_from(decoder.read_chunk(u32::from(band) * per_plane + chunk)?)?;
            let out = out.get_or_insert_with(|| data.zeroed(width as usize * height as usize * usize::from(bands)));
            let block = Block {
                width: width as usize,
                height: height as usize,
                bands: usize::from(bands),
                band: usize::from(band),
                x0: ((chunk % across) * chunk_width) as usize,
                y0: ((chunk / across) * chunk_height) as usize,
                chunk_width: data_width as usize,
            };
            block.scatter(out, &data)?;
        }
    }
    out.ok_or_else(|| RasterError::Unsupported("planar image without chunks".to_string()))
}

/// Where one decoded chunk of one band lands in the interleaved output.
struct Block {
    width: usize,
    height: usize,
    bands: usize,
    band: usize,
    x0: usize,
    y0: usize,
    chunk_width: usize,
}

impl Block {
    fn scatter(&self, dst: &mut Samples, src: &Samples) -> Result<(), RasterError> {
        match (dst, src) {
            (Samples::U8(d), Samples::U8(s)) => self.copy(d, s),
            (Samples::U16(d), Samples::U16(s)) => self.copy(d, s),
            (Samples::F32(d), Samples::F32(s)) => self.copy(d, s),
            (Samples::F64(d), Samples::F64(s)) => self.copy(d, s),
            _ => return Err(RasterError::Unsupported("sample type differs between planes".to_string())),
        }
        Ok(())
    }

    // Tiles on the right and bottom edges are padded; the padding is dropped.
    fn copy<T: Copy>(&self, dst: &mut [T], src: &[T]) {
        for (r, row) in src.chunks(self.chunk_width.max(1)).enumerate() {
            let y = self.y0 + r;
            if y >= self.height {
                break;
            }
            for (c, &value) in row.iter().enumerate() {
                let x = self.x0 + c;
                if x >= self.width {
                    break;
                }
                dst[(y * self.width + x) * self.bands + self.band] = value;
            }
        }
    }
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform, RasterError> {
    let transform = if let Some(scale) = decoder.find_tag(Tag::ModelPixelScaleTag)? {
        let scale = scale.into_f64_vec()?;
        let tie = decoder
            .find_tag(Tag::ModelTiepointTag)?
            .ok_or(RasterError::MissingGeoreference)?
            .into_f64_vec()?;
        if scale.len() < 2 || tie.len() < 6 {
            return Err(RasterError::MissingGeoreference);
        }
        // Tiepoint maps raster (i, j) to model (x, y).
        GeoTransform {
            origin_x: tie[3] - tie[0] * scale[0],
            origin_y: tie[4] + tie[1] * scale[1],
            pixel_width: scale[0],
            pixel_height: scale[1],
        }
    } else if let Some(matrix) = decoder.find_tag(Tag::ModelTransformationTag)? {
        let m = matrix.into_f64_vec()?;
        if m.len() < 16 {
            return Err(RasterError::MissingGeoreference);
        }
        if m[1] != 0.0 || m[4] != 0.0 {
            return Err(RasterError::Rotated);
        }
        GeoTransform {
            origin_x: m[3],
            origin_y: m[7],
            pixel_width: m[0],
            pixel_height: -m[5],
        }
    } else {
        return Err(RasterError::MissingGeoreference);
    };

    if !(transform.pixel_width > 0.0 && transform.pixel_height > 0.0) {
        return Err(RasterError::Rotated);
    }
    Ok(transform)
}

fn parse_nodata(raw: &str) -> Option<f64> {
    raw.trim_matches(char::from(0)).trim().parse::<f64>().ok()
}

/// Write `raster` as an LZW-compressed GeoTIFF.
pub fn write_geotiff(path: &Path, raster: &Raster) -> Result<(), RasterError> {
    let io_err = |source| RasterError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    encode_geotiff(&mut writer, raster)?;
    writer.flush().map_err(io_err)
}

pub fn encode_geotiff<W: Write + Seek>(writer: W, raster: &Raster) -> Result<(), RasterError> {
    let expected = raster.width as usize * raster.height as usize * usize::from(raster.bands);
    if raster.samples.is_empty() || raster.samples.len() != expected {
        return Err(RasterError::Unsupported(format!(
            "{} samples for a {}x{}x{} raster",
            raster.samples.len(),
            raster.width,
            raster.height,
            raster.bands
        )));
    }

    let mut encoder = TiffEncoder::new(writer)?.with_compression(Compression::Lzw);
    match &raster.samples {
        Samples::U8(d) => encode_image::<_, colortype::Gray8>(&mut encoder, raster, d),
        Samples::U16(d) => encode_image::<_, colortype::Gray16>(&mut encoder, raster, d),
        Samples::F32(d) => encode_image::<_, colortype::Gray32Float>(&mut encoder, raster, d),
        Samples::F64(d) => encode_image::<_, colortype::Gray64Float>(&mut encoder, raster, d),
    }
}

/// Single-band rasters are written as plain grayscale. With more bands the
/// encoder is handed all planes stacked as one tall grayscale image, and the
/// directory is then rewritten to describe `bands` planes of `height` rows.
/// Strips never straddle two planes.
fn encode_image<W, C>(encoder: &mut TiffEncoder<W>, raster: &Raster, data: &[C::Inner]) -> Result<(), RasterError>
where
    W: Write + Seek,
    C: ColorType,
    C::Inner: Copy,
    [C::Inner]: TiffValue,
{
    if raster.bands == 1 {
        let mut image = encoder.new_image::<C>(raster.width, raster.height)?;
        write_geo_tags(image.encoder(), raster)?;
        image.write_data(data)?;
        return Ok(());
    }

    let bands = usize::from(raster.bands);
    let stacked = raster
        .height
        .checked_mul(u32::from(raster.bands))
        .ok_or_else(|| RasterError::Unsupported(format!("{} bands of {} rows", raster.bands, raster.height)))?;
    let bits = C::BITS_PER_SAMPLE[0];
    let row_bytes = u64::from(raster.width) * u64::from(bits).div_ceil(8);

    let mut image = encoder.new_image::<C>(raster.width, stacked)?;
    image.rows_per_strip(plane_rows_per_strip(raster.height, row_bytes))?;

    let sample_format = vec![C::SAMPLE_FORMAT[0].to_u16(); bands];
    let dir = image.encoder();
    dir.write_tag(Tag::ImageLength, raster.height)?;
    dir.write_tag(Tag::SamplesPerPixel, raster.bands)?;
    dir.write_tag(Tag::BitsPerSample, &vec![bits; bands][..])?;
    dir.write_tag(Tag::SampleFormat, &sample_format[..])?;
    dir.write_tag(Tag::PlanarConfiguration, PLANAR)?;
    // 0 = unspecified data, not alpha.
    dir.write_tag(Tag::ExtraSamples, &vec![0u16; bands - 1][..])?;
    write_geo_tags(dir, raster)?;

    image.write_data(&band_sequential(data, bands))?;
    Ok(())
}

fn write_geo_tags<W, K>(dir: &mut DirectoryEncoder<'_, W, K>, raster: &Raster) -> Result<(), RasterError>
where
    W: Write + Seek,
    K: TiffKind,
{
    let t = &raster.transform;
    let scale = [t.pixel_width, t.pixel_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0];
    let directory = match &raster.geo_keys.directory {
        Some(dir) => dir.clone(),
        None => GeoKeys::wgs84().directory.unwrap_or_default(),
    };

    dir.write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
    dir.write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;
    dir.write_tag(Tag::GeoKeyDirectoryTag, &directory[..])?;
    if let Some(doubles) = &raster.geo_keys.doubles {
        dir.write_tag(Tag::GeoDoubleParamsTag, &doubles[..])?;
    }
    if let Some(ascii) = &raster.geo_keys.ascii {
        dir.write_tag(Tag::GeoAsciiParamsTag, ascii.as_str())?;
    }
    if let Some(nodata) = raster.nodata {
        dir.write_tag(Tag::GdalNodata, nodata.to_string().as_str())?;
    }
    Ok(())
}

/// Largest divisor of `height` that keeps a strip near [`STRIP_BYTES`].
fn plane_rows_per_strip(height: u32, row_bytes: u64) -> u32 {
    let target = u32::try_from(STRIP_BYTES.div_ceil(row_bytes.max(1)))
        .unwrap_or(u32::MAX)
        .clamp(1, height.max(1));
    (1..=target).rev().find(|rows| height % rows == 0).unwrap_or(1)
}

/// `[p0b0, p0b1, p1b0, p1b1]` -> `[p0b0, p1b0, p0b1, p1b1]`.
fn band_sequential<T: Copy>(data: &[T], bands: usize) -> Vec<T> {
    (0..bands)
        .flat_map(|band| data.iter().skip(band).step_by(bands).copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tiff::tags::{PhotometricInterpretation, SampleFormat};

    fn sample_raster() -> Raster {
        Raster {
            width: 3,
            height: 2,
            bands: 1,
            samples: Samples::U16(vec![1, 2, 3, 4, 5, 6]),
            transform: GeoTransform {
                origin_x: 29.0,
                origin_y: -1.5,
                pixel_width: 0.5,
                pixel_height: 0.25,
            },
            geo_keys: GeoKeys::wgs84(),
            nodata: Some(0.0),
        }
    }

    fn encode(raster: &Raster) -> Cursor<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        encode_geotiff(&mut buf, raster).unwrap();
        buf.set_position(0);
        buf
    }

    /// Four u16 samples per pixel, MinIsBlack, pixel-interleaved: the layout
    /// Earth Engine uses for a B4/B3/B2/B8 stack.
    struct Stack4x16;

    impl ColorType for Stack4x16 {
        type Inner = u16;
        const TIFF_VALUE: PhotometricInterpretation = PhotometricInterpretation::BlackIsZero;
        const BITS_PER_SAMPLE: &'static [u16] = &[16, 16, 16, 16];
        const SAMPLE_FORMAT: &'static [SampleFormat] =
            &[SampleFormat::Uint, SampleFormat::Uint, SampleFormat::Uint, SampleFormat::Uint];

        fn horizontal_predict(row: &[u16], result: &mut Vec<u16>) {
            result.extend_from_slice(row);
        }
    }

    fn interleaved_stack(path: &Path, origin_x: f64, values: &[u16]) {
        let raster = Raster {
            width: 1,
            height: 1,
            bands: 4,
            samples: Samples::U16(values.to_vec()),
            transform: GeoTransform {
                origin_x,
                origin_y: 1.0,
                pixel_width: 1.0,
                pixel_height: 1.0,
            },
            ..sample_raster()
        };
        let mut buf = Cursor::new(Vec::new());
        let mut encoder = TiffEncoder::new(&mut buf).unwrap();
        let mut image = encoder.new_image::<Stack4x16>(1, 1).unwrap();
        image.encoder().write_tag(Tag::ExtraSamples, &[0u16, 0, 0][..]).unwrap();
        write_geo_tags(image.encoder(), &raster).unwrap();
        image.write_data(values).unwrap();
        drop(encoder);
        std::fs::write(path, buf.into_inner()).unwrap();
    }

    #[test]
    fn encode_then_decode_preserves_pixels_and_georeference() {
        let raster = sample_raster();
        let back = decode_geotiff(encode(&raster)).unwrap();
        assert_eq!(back.width, 3);
        assert_eq!(back.height, 2);
        assert_eq!(back.bands, 1);
        assert_eq!(back.samples, raster.samples);
        assert_eq!(back.transform, raster.transform);
        assert_eq!(back.nodata, Some(0.0));
        assert_eq!(back.geo_keys.directory, GeoKeys::wgs84().directory);
    }

    #[test]
    fn multiband_float_is_interleaved() {
        let raster = Raster {
            bands: 4,
            width: 1,
            height: 1,
            samples: Samples::F32(vec![0.1, 0.2, 0.3, 0.4]),
            nodata: None,
            ..sample_raster()
        };
        let back = decode_geotiff(encode(&raster)).unwrap();
        assert_eq!(back.bands, 4);
        assert_eq!(back.samples, raster.samples);
        assert_eq!(back.nodata, None);
    }

    #[test]
    fn any_band_count_is_written_as_planar_extra_samples() {
        for bands in [2u16, 3, 5] {
            let pixels = 3 * 2;
            let values: Vec<u8> = (0..pixels * bands as usize).map(|v| v as u8).collect();
            let raster = Raster {
                bands,
                samples: Samples::U8(values),
                ..sample_raster()
            };

            let mut decoder = Decoder::new(encode(&raster)).unwrap();
            assert_eq!(decoder.find_tag_unsigned::<u16>(Tag::PlanarConfiguration).unwrap(), Some(PLANAR));
            assert_eq!(decoder.find_tag_unsigned::<u16>(Tag::PhotometricInterpretation).unwrap(), Some(1));
            let extra = decoder.find_tag(Tag::ExtraSamples).unwrap().unwrap().into_u16_vec().unwrap();
            assert_eq!(extra, vec![0; bands as usize - 1]);

            let back = decode_geotiff(encode(&raster)).unwrap();
            assert_eq!(back.bands, bands);
            assert_eq!(back.samples, raster.samples);
            assert_eq!(back.transform, raster.transform);
        }
    }

    #[test]
    fn tall_planes_split_into_strips_within_each_band() {
        assert_eq!(plane_rows_per_strip(7, 1), 7);
        assert_eq!(plane_rows_per_strip(6, STRIP_BYTES / 2), 2);
        assert_eq!(plane_rows_per_strip(7, STRIP_BYTES / 2), 1);

        let (width, height, bands) = (1000u32, 600u32, 3u16);
        let values: Vec<u16> = (0..width * height * u32::from(bands)).map(|v| (v % 65_521) as u16).collect();
        let raster = Raster {
            width,
            height,
            bands,
            samples: Samples::U16(values),
            ..sample_raster()
        };
        let back = decode_geotiff(encode(&raster)).unwrap();
        assert_eq!(back.samples, raster.samples);
    }

    #[test]
    fn sample_count_must_match_dimensions() {
        let short = Raster {
            bands: 2,
            samples: Samples::U8(vec![1, 2]),
            ..sample_raster()
        };
        let err = encode_geotiff(Cursor::new(Vec::new()), &short).unwrap_err();
        assert!(matches!(err, RasterError::Unsupported(_)));

        let empty = Raster {
            width: 0,
            height: 0,
            samples: Samples::U16(Vec::new()),
            ..sample_raster()
        };
        assert!(matches!(
            encode_geotiff(Cursor::new(Vec::new()), &empty),
            Err(RasterError::Unsupported(_))
        ));
    }

    #[test]
    fn four_band_min_is_black_tiles_decode_and_merge() {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("sentinel_1.tif");
        let right = dir.path().join("sentinel_2.tif");
        interleaved_stack(&left, 0.0, &[1, 2, 3, 4]);
        interleaved_stack(&right, 1.0, &[5, 6, 7, 8]);

        let tile = read_geotiff(&left).unwrap();
        assert_eq!(tile.bands, 4);
        assert_eq!(tile.samples, Samples::U16(vec![1, 2, 3, 4]));

        let out = dir.path().join("sentinel.tif");
        let summary = crate::raster::merge_tiles(&[left, right], &out).unwrap();
        assert_eq!((summary.width, summary.height, summary.bands), (2, 1, 4));

        let merged = read_geotiff(&out).unwrap();
        assert_eq!(merged.samples, Samples::U16(vec![1, 2, 3, 4, 5, 6, 7, 8]));
    }

    #[test]
    fn bounds_follow_transform() {
        let (left, bottom, right, top) = sample_raster().bounds();
        assert_eq!((left, bottom, right, top), (29.0, -2.0, 30.5, -1.5));
    }

    #[test]
    fn nodata_parsing_tolerates_padding() {
        assert_eq!(parse_nodata("255\0"), Some(255.0));
        assert!(parse_nodata("nan").unwrap().is_nan());
        assert_eq!(parse_nodata("none"), None);
    }
}
