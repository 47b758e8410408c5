//! TIFF header parsing over an in-memory byte slice.
//!
//! # TIFF Header Structure
//!
//! ## Classic TIFF (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```
//!
//! ## BigTIFF (16 bytes)
//! ```text
//! Bytes 0-1: Byte order
//! Bytes 2-3: Version (43 = 0x002B)
//! Bytes 4-5: Offset byte size (must be 8)
//! Bytes 6-7: Reserved
//! Bytes 8-15: Offset to first IFD (8 bytes)
//! ```

use super::RasterError;

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
const VERSION_TIFF: u16 = 42;

/// Version number for BigTIFF
const VERSION_BIGTIFF: u16 = 43;

/// Size of classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of BigTIFF header in bytes
pub const BIGTIFF_HEADER_SIZE: usize = 16;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF file.
///
/// Declared in the first two bytes of the header; every multi-byte value in
/// the file must be read respecting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from a byte slice using this byte order.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 2 bytes.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes([bytes[0], bytes[1]]),
            ByteOrder::BigEndian => u16::from_be_bytes([bytes[0], bytes[1]]),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 4 bytes.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            }
            ByteOrder::BigEndian => u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }

    /// Read a u64 from a byte slice using this byte order.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 8 bytes.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        let array = [
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ];
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(array),
            ByteOrder::BigEndian => u64::from_be_bytes(array),
        }
    }

    /// Read an f64 from a byte slice using this byte order.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 8 bytes.
    #[inline]
    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        f64::from_bits(self.read_u64(bytes))
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header.
///
/// Carries everything needed to start walking IFDs: the byte order, whether
/// the file is BigTIFF (wider counts and offsets), and where the first IFD
/// lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Whether this is a BigTIFF file (64-bit offsets)
    pub is_bigtiff: bool,

    /// Offset to the first IFD in the file
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Parse a TIFF header from the start of a file held in memory.
    ///
    /// # Errors
    /// - `InvalidMagic` if byte order bytes are not II or MM
    /// - `InvalidVersion` if version is not 42 or 43
    /// - `InvalidBigTiffOffsetSize` if the BigTIFF offset size is not 8
    /// - `FileTooSmall` if the slice cannot hold the header
    /// - `InvalidIfdOffset` if the first IFD offset points outside the file
    pub fn parse(file: &[u8]) -> Result<Self, RasterError> {
        if file.len() < TIFF_HEADER_SIZE {
            return Err(RasterError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: file.len() as u64,
            });
        }

        // Byte order bytes are a fixed pattern; read them order-independent.
        let magic = u16::from_le_bytes([file[0], file[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(RasterError::InvalidMagic(magic)),
        };

        let version = byte_order.read_u16(&file[2..4]);
        match version {
            VERSION_TIFF => {
                let first_ifd_offset = byte_order.read_u32(&file[4..8]) as u64;
                if first_ifd_offset >= file.len() as u64 {
                    return Err(RasterError::InvalidIfdOffset(first_ifd_offset));
                }

                Ok(TiffHeader {
                    byte_order,
                    is_bigtiff: false,
                    first_ifd_offset,
                })
            }
            VERSION_BIGTIFF => {
                if file.len() < BIGTIFF_HEADER_SIZE {
                    return Err(RasterError::FileTooSmall {
                        required: BIGTIFF_HEADER_SIZE as u64,
                        actual: file.len() as u64,
                    });
                }

                let offset_size = byte_order.read_u16(&file[4..6]);
                if offset_size != 8 {
                    return Err(RasterError::InvalidBigTiffOffsetSize(offset_size));
                }

                let first_ifd_offset = byte_order.read_u64(&file[8..16]);
                if first_ifd_offset >= file.len() as u64 {
                    return Err(RasterError::InvalidIfdOffset(first_ifd_offset));
                }

                Ok(TiffHeader {
                    byte_order,
                    is_bigtiff: true,
                    first_ifd_offset,
                })
            }
            _ => Err(RasterError::InvalidVersion(version)),
        }
    }

    /// Size of an IFD entry in bytes.
    ///
    /// Classic TIFF: 12 bytes (2 tag + 2 type + 4 count + 4 value/offset)
    /// BigTIFF: 20 bytes (2 tag + 2 type + 8 count + 8 value/offset)
    #[inline]
    pub const fn ifd_entry_size(&self) -> usize {
        if self.is_bigtiff {
            20
        } else {
            12
        }
    }

    /// Size of the entry count field at the start of an IFD.
    #[inline]
    pub const fn ifd_count_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            2
        }
    }

    /// Size of the value/offset field in an IFD entry.
    ///
    /// This is also the inline value threshold.
    #[inline]
    pub const fn value_offset_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // ByteOrder Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_byte_order_read_u16() {
        let bytes = [0x01, 0x02];
        assert_eq!(ByteOrder::LittleEndian.read_u16(&bytes), 0x0201);
        assert_eq!(ByteOrder::BigEndian.read_u16(&bytes), 0x0102);
    }

    #[test]
    fn test_byte_order_read_u32() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(ByteOrder::LittleEndian.read_u32(&bytes), 0x04030201);
        assert_eq!(ByteOrder::BigEndian.read_u32(&bytes), 0x01020304);
    }

    #[test]
    fn test_byte_order_read_f64() {
        let bytes = 2.5f64.to_le_bytes();
        assert_eq!(ByteOrder::LittleEndian.read_f64(&bytes), 2.5);
        let bytes = 2.5f64.to_be_bytes();
        assert_eq!(ByteOrder::BigEndian.read_f64(&bytes), 2.5);
    }

    // -------------------------------------------------------------------------
    // TiffHeader Parsing Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_tiff_little_endian() {
        let mut file = vec![
            0x49, 0x49, // II
            0x2A, 0x00, // Version 42
            0x08, 0x00, 0x00, 0x00, // First IFD offset = 8
        ];
        file.resize(64, 0);

        let header = TiffHeader::parse(&file).unwrap();
        assert_eq!(header.byte_order, ByteOrder::LittleEndian);
        assert!(!header.is_bigtiff);
        assert_eq!(header.first_ifd_offset, 8);
        assert_eq!(header.ifd_entry_size(), 12);
        assert_eq!(header.ifd_count_size(), 2);
        assert_eq!(header.value_offset_size(), 4);
    }

    #[test]
    fn test_parse_tiff_big_endian() {
        let mut file = vec![
            0x4D, 0x4D, // MM
            0x00, 0x2A, // Version 42
            0x00, 0x00, 0x00, 0x08, // First IFD offset = 8
        ];
        file.resize(64, 0);

        let header = TiffHeader::parse(&file).unwrap();
        assert_eq!(header.byte_order, ByteOrder::BigEndian);
        assert!(!header.is_bigtiff);
        assert_eq!(header.first_ifd_offset, 8);
    }

    #[test]
    fn test_parse_bigtiff() {
        let mut file = vec![
            0x49, 0x49, // II
            0x2B, 0x00, // Version 43 (BigTIFF)
            0x08, 0x00, // Offset size = 8
            0x00, 0x00, // Reserved
            0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // First IFD offset = 16
        ];
        file.resize(64, 0);

        let header = TiffHeader::parse(&file).unwrap();
        assert!(header.is_bigtiff);
        assert_eq!(header.first_ifd_offset, 16);
        assert_eq!(header.ifd_entry_size(), 20);
        assert_eq!(header.ifd_count_size(), 8);
        assert_eq!(header.value_offset_size(), 8);
    }

    #[test]
    fn test_parse_invalid_magic() {
        let file = [0x00, 0x00, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        assert!(matches!(
            TiffHeader::parse(&file),
            Err(RasterError::InvalidMagic(0x0000))
        ));
    }

    #[test]
    fn test_parse_invalid_version() {
        let file = [0x49, 0x49, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00];
        assert!(matches!(
            TiffHeader::parse(&file),
            Err(RasterError::InvalidVersion(0))
        ));
    }

    #[test]
    fn test_parse_bigtiff_invalid_offset_size() {
        let file = [
            0x49, 0x49, 0x2B, 0x00, // BigTIFF
            0x04, 0x00, // Invalid offset size = 4
            0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert!(matches!(
            TiffHeader::parse(&file),
            Err(RasterError::InvalidBigTiffOffsetSize(4))
        ));
    }

    #[test]
    fn test_parse_file_too_small() {
        let file = [0x49, 0x49, 0x2A, 0x00];
        assert!(matches!(
            TiffHeader::parse(&file),
            Err(RasterError::FileTooSmall {
                required: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_parse_ifd_offset_out_of_bounds() {
        let file = [
            0x49, 0x49, 0x2A, 0x00, // TIFF
            0xE8, 0x03, 0x00, 0x00, // First IFD offset = 1000, file is 8 bytes
        ];
        assert!(matches!(
            TiffHeader::parse(&file),
            Err(RasterError::InvalidIfdOffset(1000))
        ));
    }
}
