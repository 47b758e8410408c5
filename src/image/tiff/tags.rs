//! TIFF tag and field type vocabulary.
//!
//! Only the tags needed for baseline strip-organized rasters and the GeoTIFF
//! georeferencing extension are defined; everything else is ignored during
//! parsing.

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
///
/// Each type has a fixed per-element size, which drives both array reads and
/// the inline-vs-offset storage decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Undefined byte data (1 byte per element)
    Undefined = 7,

    /// IEEE 754 double (8 bytes) - used by GeoTIFF parameter tags
    Double = 12,

    /// Unsigned 64-bit integer (8 bytes) - BigTIFF only
    Long8 = 16,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte => 1,
            FieldType::Ascii => 1,
            FieldType::Short => 2,
            FieldType::Long => 4,
            FieldType::Undefined => 1,
            FieldType::Double => 8,
            FieldType::Long8 => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unsupported or unknown type values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            7 => Some(FieldType::Undefined),
            12 => Some(FieldType::Double),
            16 => Some(FieldType::Long8),
            _ => None,
        }
    }

    /// Check if a value with this type and count is stored inline in the
    /// entry's value/offset field.
    #[inline]
    pub fn fits_inline(self, count: u64, is_bigtiff: bool) -> bool {
        let threshold = if is_bigtiff { 8 } else { 4 };
        // Counts are file-declared; a product that wraps u64 never fits.
        match (self.size_in_bytes() as u64).checked_mul(count) {
            Some(total_size) => total_size <= threshold,
            None => false,
        }
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF tag IDs relevant to raster decoding.
///
/// Covers basic image structure, strip access, and the GeoTIFF
/// georeferencing tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    // -------------------------------------------------------------------------
    // Basic Image Structure
    // -------------------------------------------------------------------------
    /// Image width in pixels
    ImageWidth = 256,

    /// Image height (length) in pixels
    ImageLength = 257,

    /// Bits per sample (8 for baseline byte rasters)
    BitsPerSample = 258,

    /// Compression scheme (1 = uncompressed)
    Compression = 259,

    /// Photometric interpretation
    PhotometricInterpretation = 262,

    // -------------------------------------------------------------------------
    // Strip Organization
    // -------------------------------------------------------------------------
    /// Byte offset of each strip
    StripOffsets = 273,

    /// Number of components per pixel
    SamplesPerPixel = 277,

    /// Number of rows in each strip
    RowsPerStrip = 278,

    /// Byte count of each strip
    StripByteCounts = 279,

    /// Component storage layout (1 = chunky)
    PlanarConfiguration = 284,

    // -------------------------------------------------------------------------
    // GeoTIFF Georeferencing
    // -------------------------------------------------------------------------
    /// Pixel size in model space (x, y, z doubles)
    ModelPixelScale = 33550,

    /// Raster-to-model tie points
    ModelTiepoint = 33922,

    /// GeoKey directory (array of SHORTs, see geokeys module)
    GeoKeyDirectory = 34735,

    /// Double-valued GeoKey parameters
    GeoDoubleParams = 34736,

    /// ASCII-valued GeoKey parameters
    GeoAsciiParams = 34737,
}

impl TiffTag {
    /// Create a TiffTag from its numeric ID.
    ///
    /// Returns `None` for tags this parser does not track.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            256 => Some(TiffTag::ImageWidth),
            257 => Some(TiffTag::ImageLength),
            258 => Some(TiffTag::BitsPerSample),
            259 => Some(TiffTag::Compression),
            262 => Some(TiffTag::PhotometricInterpretation),
            273 => Some(TiffTag::StripOffsets),
            277 => Some(TiffTag::SamplesPerPixel),
            278 => Some(TiffTag::RowsPerStrip),
            279 => Some(TiffTag::StripByteCounts),
            284 => Some(TiffTag::PlanarConfiguration),
            33550 => Some(TiffTag::ModelPixelScale),
            33922 => Some(TiffTag::ModelTiepoint),
            34735 => Some(TiffTag::GeoKeyDirectory),
            34736 => Some(TiffTag::GeoDoubleParams),
            34737 => Some(TiffTag::GeoAsciiParams),
            _ => None,
        }
    }

    /// Human-readable tag name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            TiffTag::ImageWidth => "ImageWidth",
            TiffTag::ImageLength => "ImageLength",
            TiffTag::BitsPerSample => "BitsPerSample",
            TiffTag::Compression => "Compression",
            TiffTag::PhotometricInterpretation => "PhotometricInterpretation",
            TiffTag::StripOffsets => "StripOffsets",
            TiffTag::SamplesPerPixel => "SamplesPerPixel",
            TiffTag::RowsPerStrip => "RowsPerStrip",
            TiffTag::StripByteCounts => "StripByteCounts",
            TiffTag::PlanarConfiguration => "PlanarConfiguration",
            TiffTag::ModelPixelScale => "ModelPixelScale",
            TiffTag::ModelTiepoint => "ModelTiepoint",
            TiffTag::GeoKeyDirectory => "GeoKeyDirectory",
            TiffTag::GeoDoubleParams => "GeoDoubleParams",
            TiffTag::GeoAsciiParams => "GeoAsciiParams",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_sizes() {
        assert_eq!(FieldType::Byte.size_in_bytes(), 1);
        assert_eq!(FieldType::Ascii.size_in_bytes(), 1);
        assert_eq!(FieldType::Short.size_in_bytes(), 2);
        assert_eq!(FieldType::Long.size_in_bytes(), 4);
        assert_eq!(FieldType::Double.size_in_bytes(), 8);
        assert_eq!(FieldType::Long8.size_in_bytes(), 8);
    }

    #[test]
    fn test_field_type_round_trip() {
        for value in [1u16, 2, 3, 4, 7, 12, 16] {
            let field_type = FieldType::from_u16(value).unwrap();
            assert_eq!(field_type as u16, value);
        }
        assert!(FieldType::from_u16(5).is_none());
        assert!(FieldType::from_u16(99).is_none());
    }

    #[test]
    fn test_fits_inline_classic() {
        // 1 Long (4 bytes) fits, 2 Longs do not.
        assert!(FieldType::Long.fits_inline(1, false));
        assert!(!FieldType::Long.fits_inline(2, false));
        // 2 Shorts fit exactly.
        assert!(FieldType::Short.fits_inline(2, false));
        assert!(!FieldType::Short.fits_inline(3, false));
        // A Double never fits inline in classic TIFF.
        assert!(!FieldType::Double.fits_inline(1, false));
    }

    #[test]
    fn test_fits_inline_bigtiff() {
        assert!(FieldType::Long.fits_inline(2, true));
        assert!(FieldType::Double.fits_inline(1, true));
        assert!(!FieldType::Double.fits_inline(2, true));
    }

    #[test]
    fn test_fits_inline_wrapping_count_never_fits() {
        // 8 * (u64::MAX / 8 + 1) wraps to 0, which would look inline.
        assert!(!FieldType::Long8.fits_inline(u64::MAX / 8 + 1, false));
        assert!(!FieldType::Long8.fits_inline(u64::MAX, true));
    }

    #[test]
    fn test_tag_round_trip() {
        for value in [256u16, 257, 258, 259, 262, 273, 277, 278, 279, 284, 33550, 34735, 34737] {
            let tag = TiffTag::from_u16(value).unwrap();
            assert_eq!(tag as u16, value);
        }
        assert!(TiffTag::from_u16(324).is_none(), "tile tags are not tracked");
    }

    #[test]
    fn test_tag_names() {
        assert_eq!(TiffTag::GeoKeyDirectory.name(), "GeoKeyDirectory");
        assert_eq!(TiffTag::StripOffsets.name(), "StripOffsets");
    }
}
