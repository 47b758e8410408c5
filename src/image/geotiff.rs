//! Geospatial raster decoder.
//!
//! Decodes strip-organized, uncompressed 8-bit GeoTIFF rasters and surfaces
//! their georeferencing (CRS, pixel scale) as metadata. Registered ahead of
//! the general-purpose decoder so `.tif`/`.tiff` sources get their geospatial
//! metadata preserved instead of being treated as plain images.

use bytes::Bytes;
use serde_json::json;
use tracing::debug;

use crate::decode::{DecodedPayload, Decoder, Metadata};
use crate::error::BoxError;

use super::tiff::{GeoKeyDirectory, Ifd, RasterError, TiffHeader, TiffTag};
use super::PixelBuffer;

/// Compression tag value for uncompressed data.
const COMPRESSION_NONE: u64 = 1;

/// PlanarConfiguration tag value for interleaved (chunky) samples.
const PLANAR_CHUNKY: u64 = 1;

// =============================================================================
// GeoTiffDecoder
// =============================================================================

/// Decoder plugin for GeoTIFF rasters.
pub struct GeoTiffDecoder;

impl GeoTiffDecoder {
    /// Parse the raster into a pixel buffer plus geospatial metadata.
    fn parse(&self, file: &[u8]) -> Result<DecodedPayload<PixelBuffer>, RasterError> {
        let header = TiffHeader::parse(file)?;
        let ifd = Ifd::parse(file, &header)?;

        // Image structure.
        let width = ifd.require(TiffTag::ImageWidth)?.read_u64(file, &header)? as usize;
        let height = ifd.require(TiffTag::ImageLength)?.read_u64(file, &header)? as usize;

        let samples_per_pixel = match ifd.entry(TiffTag::SamplesPerPixel) {
            Some(entry) => entry.read_u64(file, &header)? as usize,
            None => 1,
        };

        self.check_layout(file, &header, &ifd, samples_per_pixel)?;

        // Dimensions are file-declared; reject products that wrap.
        let expected_len = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(samples_per_pixel))
            .ok_or_else(|| RasterError::InvalidTagValue {
                tag: "ImageWidth",
                message: format!(
                    "dimensions {width}x{height}x{samples_per_pixel} overflow the addressable size"
                ),
            })?;

        // Pixel data from strips.
        let data = self.read_strips(file, &header, &ifd, expected_len)?;

        // 1-band rasters stay 2-D here; the entity gate appends the unit
        // band axis during invariant validation.
        let shape = if samples_per_pixel == 1 {
            vec![height, width]
        } else {
            vec![height, width, samples_per_pixel]
        };

        let mut metadata = Metadata::new();
        metadata.insert("format".to_string(), json!("GeoTIFF"));
        metadata.insert("width".to_string(), json!(width));
        metadata.insert("height".to_string(), json!(height));
        metadata.insert("samples_per_pixel".to_string(), json!(samples_per_pixel));
        self.read_geo_metadata(file, &header, &ifd, &mut metadata)?;

        Ok(DecodedPayload {
            content: PixelBuffer::new(data, shape),
            metadata,
        })
    }

    /// Reject layouts this decoder does not handle.
    fn check_layout(
        &self,
        file: &[u8],
        header: &TiffHeader,
        ifd: &Ifd,
        samples_per_pixel: usize,
    ) -> Result<(), RasterError> {
        if let Some(entry) = ifd.entry(TiffTag::Compression) {
            let compression = entry.read_u64(file, header)?;
            if compression != COMPRESSION_NONE {
                return Err(RasterError::UnsupportedCompression(compression));
            }
        }

        if let Some(entry) = ifd.entry(TiffTag::BitsPerSample) {
            let bits = entry.read_u64_array(file, header)?;
            if bits.iter().any(|&b| b != 8) {
                return Err(RasterError::UnsupportedLayout(format!(
                    "bits per sample {bits:?} (only 8-bit samples are supported)"
                )));
            }
        }

        if samples_per_pixel > 1 {
            if let Some(entry) = ifd.entry(TiffTag::PlanarConfiguration) {
                let planar = entry.read_u64(file, header)?;
                if planar != PLANAR_CHUNKY {
                    return Err(RasterError::UnsupportedLayout(format!(
                        "planar configuration {planar} (only interleaved samples are supported)"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Concatenate the raster's strips into one row-major buffer.
    fn read_strips(
        &self,
        file: &[u8],
        header: &TiffHeader,
        ifd: &Ifd,
        expected_len: usize,
    ) -> Result<Vec<u8>, RasterError> {
        let offsets = ifd
            .require(TiffTag::StripOffsets)?
            .read_u64_array(file, header)?;
        let byte_counts = ifd
            .require(TiffTag::StripByteCounts)?
            .read_u64_array(file, header)?;

        if offsets.len() != byte_counts.len() {
            return Err(RasterError::InvalidTagValue {
                tag: "StripByteCounts",
                message: format!(
                    "{} strip offsets but {} byte counts",
                    offsets.len(),
                    byte_counts.len()
                ),
            });
        }

        // Strips cannot hold more than the file itself; do not let a
        // file-declared size drive the allocation.
        let mut data = Vec::with_capacity(expected_len.min(file.len()));
        for (&offset, &count) in offsets.iter().zip(&byte_counts) {
            let start = offset as usize;
            let end = start
                .checked_add(count as usize)
                .filter(|&end| end <= file.len())
                .ok_or_else(|| RasterError::InvalidTagValue {
                    tag: "StripOffsets",
                    message: format!("strip {start}..+{count} exceeds file bounds"),
                })?;
            data.extend_from_slice(&file[start..end]);
        }

        if data.len() != expected_len {
            return Err(RasterError::InvalidTagValue {
                tag: "StripByteCounts",
                message: format!(
                    "strips hold {} bytes, image dimensions require {expected_len}",
                    data.len()
                ),
            });
        }

        Ok(data)
    }

    /// Surface the GeoTIFF georeferencing tags as metadata.
    fn read_geo_metadata(
        &self,
        file: &[u8],
        header: &TiffHeader,
        ifd: &Ifd,
        metadata: &mut Metadata,
    ) -> Result<(), RasterError> {
        if let Some(entry) = ifd.entry(TiffTag::GeoKeyDirectory) {
            let shorts = entry.read_u16_array(file, header)?;
            let directory = GeoKeyDirectory::parse(&shorts)?;
            if let Some(crs) = directory.crs() {
                debug!(crs = %crs, "raster declares a coordinate reference system");
                metadata.insert("crs".to_string(), json!(crs));
            }
        }

        if let Some(entry) = ifd.entry(TiffTag::ModelPixelScale) {
            let scale = entry.read_f64_array(file, header)?;
            metadata.insert("pixel_scale".to_string(), json!(scale));
        }

        if let Some(entry) = ifd.entry(TiffTag::GeoAsciiParams) {
            let params = entry.read_ascii(file, header)?;
            if !params.is_empty() {
                metadata.insert("geo_ascii_params".to_string(), json!(params));
            }
        }

        Ok(())
    }
}

impl Decoder<PixelBuffer> for GeoTiffDecoder {
    fn name(&self) -> &'static str {
        "geotiff"
    }

    fn capabilities(&self) -> &[&'static str] {
        &[".tif", ".tiff"]
    }

    fn decode(&self, bytes: &Bytes) -> Result<DecodedPayload<PixelBuffer>, BoxError> {
        self.parse(bytes).map_err(BoxError::from)
    }
}

// =============================================================================
// Tests
// =============================================================================
