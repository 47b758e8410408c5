//! General-purpose raster decoder.
//!
//! Backed by the `image` crate, this decoder handles the common interchange
//! formats (JPEG, PNG, plain TIFF). Color images are normalized to 8-bit RGB
//! and grayscale images to 8-bit luma, so the pixel buffer is always a
//! row-major byte array.

use bytes::Bytes;
use image::DynamicImage;
use serde_json::json;
use tracing::debug;

use crate::decode::{DecodedPayload, Decoder, Metadata};
use crate::error::BoxError;

use super::PixelBuffer;

// =============================================================================
// StandardImageDecoder
// =============================================================================

/// Decoder plugin for common raster interchange formats.
pub struct StandardImageDecoder;

impl Decoder<PixelBuffer> for StandardImageDecoder {
    fn name(&self) -> &'static str {
        "standard-image"
    }

    fn capabilities(&self) -> &[&'static str] {
        &[".jpg", ".jpeg", ".png", ".tif", ".tiff"]
    }

    fn decode(&self, bytes: &Bytes) -> Result<DecodedPayload<PixelBuffer>, BoxError> {
        let format = image::guess_format(bytes)?;
        let decoded = image::load_from_memory_with_format(bytes, format)?;

        let width = decoded.width() as usize;
        let height = decoded.height() as usize;
        debug!(
            format = ?format,
            width = width,
            height = height,
            "decoded raster"
        );

        // Grayscale stays single-band; everything else flattens to RGB.
        let (data, shape, mode) = match decoded {
            DynamicImage::ImageLuma8(luma) => {
                (luma.into_raw(), vec![height, width], "L")
            }
            other => {
                let rgb = other.to_rgb8();
                (rgb.into_raw(), vec![height, width, 3], "RGB")
            }
        };

        let mut metadata = Metadata::new();
        metadata.insert(
            "format".to_string(),
            json!(format!("{format:?}").to_lowercase()),
        );
        metadata.insert("mode".to_string(), json!(mode));
        metadata.insert("width".to_string(), json!(width));
        metadata.insert("height".to_string(), json!(height));

        Ok(DecodedPayload {
            content: PixelBuffer::new(data, shape),
            metadata,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
