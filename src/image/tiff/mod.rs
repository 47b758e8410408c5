//! Slice-based TIFF/GeoTIFF structure parsing.
//!
//! Supports classic TIFF and BigTIFF in either byte order, restricted to
//! what the geospatial raster decoder needs: baseline strip-organized,
//! uncompressed 8-bit rasters plus the GeoTIFF georeferencing tags.

mod geokeys;
mod ifd;
mod parser;
mod tags;

pub use geokeys::{GeoKey, GeoKeyDirectory};
pub use ifd::{Ifd, IfdEntry};
pub use parser::{ByteOrder, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use tags::{FieldType, TiffTag};

use thiserror::Error;

/// Errors raised while parsing a TIFF-structured raster.
///
/// These are plugin-internal: the decoder registry wraps them into its
/// normalized decode-failure error, preserving them as the cause.
#[derive(Debug, Clone, Error)]
pub enum RasterError {
    /// Invalid TIFF magic bytes (not II or MM)
    #[error("invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain the claimed structure
    #[error("file too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// IFD offset points outside the file
    #[error("invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// Required tag is missing from the IFD
    #[error("missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has an unexpected type, count or value
    #[error("invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unsupported compression scheme
    #[error("unsupported compression: {0} (only uncompressed rasters are supported)")]
    UnsupportedCompression(u64),

    /// Unsupported sample layout
    #[error("unsupported sample layout: {0}")]
    UnsupportedLayout(String),

    /// Unknown field type in an IFD entry
    #[error("unknown field type: {0}")]
    UnknownFieldType(u16),
}
