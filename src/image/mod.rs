//! Raster image resolution.
//!
//! An [`Image`] is a validated raster entity: a row-major [`PixelBuffer`]
//! plus the resolution and band count derived from its shape, built by
//! resolving a [`Source`] through an [`ImageRegistry`].
//!
//! Shape convention is (rows, columns, bands). The entity gate normalizes
//! single-band 2-D buffers by appending a trailing unit axis, so a validated
//! image always has exactly three axes.

mod codec;
mod geotiff;
pub mod tiff;

pub use codec::StandardImageDecoder;
pub use geotiff::GeoTiffDecoder;

use tracing::debug;

use crate::decode::{DecoderRegistry, Metadata};
use crate::error::{DecodeError, FieldViolation, SchemaError};
use crate::schema::SchemaEntity;
use crate::source::Source;

/// Decoder registry producing pixel buffers.
pub type ImageRegistry = DecoderRegistry<PixelBuffer>;

/// Registry with the built-in raster decoders.
///
/// The geospatial decoder is registered first so `.tif`/`.tiff` sources keep
/// their georeferencing metadata; the general-purpose decoder picks up
/// everything else it claims.
pub fn default_image_registry() -> ImageRegistry {
    let mut registry = ImageRegistry::new();
    registry.register(Box::new(GeoTiffDecoder));
    registry.register(Box::new(StandardImageDecoder));
    registry
}

// =============================================================================
// PixelBuffer
// =============================================================================

/// A dense row-major byte buffer with an explicit shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    shape: Vec<usize>,
}

impl PixelBuffer {
    /// Wrap raw data with its shape. Consistency between the two is enforced
    /// later, by the entity gate.
    pub fn new(data: Vec<u8>, shape: Vec<usize>) -> Self {
        PixelBuffer { data, shape }
    }

    /// Raw bytes in row-major order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shape as (rows, columns[, bands]).
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements the shape implies.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the buffer holds no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append a trailing unit axis (e.g. `[h, w]` becomes `[h, w, 1]`).
    fn expand_trailing_axis(&mut self) {
        self.shape.push(1);
    }
}

// =============================================================================
// Image
// =============================================================================

/// A validated raster entity.
///
/// Construction goes through the two-phase gate: the structural phase checks
/// that the buffer length matches its shape, the invariant phase normalizes
/// the shape to three axes and derives `resolution` and `bands` from it.
#[derive(Debug)]
pub struct Image {
    source: Source,
    content: PixelBuffer,
    resolution: (usize, usize),
    bands: usize,
    metadata: Metadata,
}

impl Image {
    /// Resolve a source into a validated image through the given registry.
    ///
    /// # Errors
    /// Registry errors propagate as-is ([`DecodeError::NoHandler`], source
    /// errors, plugin failures); a payload that fails entity validation is
    /// reported as [`DecodeError::Failed`] with the schema error as cause.
    pub fn resolve(registry: &ImageRegistry, source: Source) -> Result<Self, DecodeError> {
        let payload = registry.decode(&source)?;
        let location = source.location().to_string();

        let image = Image {
            source,
            content: payload.content,
            resolution: (0, 0),
            bands: 0,
            metadata: payload.metadata,
        }
        .validated()
        .map_err(|cause| DecodeError::failed(location, cause))?;

        debug!(
            location = %image.source.location(),
            rows = image.resolution.0,
            cols = image.resolution.1,
            bands = image.bands,
            "resolved image"
        );
        Ok(image)
    }

    /// The source this image was resolved from.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// The pixel buffer, always three axes after validation.
    pub fn content(&self) -> &PixelBuffer {
        &self.content
    }

    /// Resolution as (rows, columns).
    pub fn resolution(&self) -> (usize, usize) {
        self.resolution
    }

    /// Number of bands (channels).
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Decoder-reported metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl SchemaEntity for Image {
    const ENTITY: &'static str = "Image";

    fn check_fields(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if self.content.data().len() != self.content.element_count() {
            violations.push(FieldViolation {
                field: "content",
                actual: format!(
                    "{} bytes for shape {:?}",
                    self.content.data().len(),
                    self.content.shape()
                ),
                expected: format!("{} bytes", self.content.element_count()),
            });
        }
        violations
    }

    fn check_invariants(&mut self) -> Result<(), SchemaError> {
        if self.content.is_empty() {
            return Err(Self::invariant_error("the image is empty"));
        }

        match self.content.ndim() {
            2 => self.content.expand_trailing_axis(),
            3 => {}
            ndim => {
                return Err(Self::invariant_error(format!(
                    "invalid image dimensions: expected 2 or 3 axes, got {ndim}"
                )));
            }
        }

        let shape = self.content.shape();
        self.resolution = (shape[0], shape[1]);
        self.bands = shape[2];

        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(Self::invariant_error(format!(
                "invalid image resolution: {:?}",
                self.resolution
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
