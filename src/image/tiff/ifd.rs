//! IFD parsing and tag value reading over an in-memory byte slice.
//!
//! Values can be stored either inline in the IFD entry (when they fit in the
//! value/offset field) or at an offset elsewhere in the file. The readers
//! here hide that distinction and respect the file's byte order.

use super::parser::{ByteOrder, TiffHeader};
use super::tags::{FieldType, TiffTag};
use super::RasterError;

// =============================================================================
// IfdEntry
// =============================================================================

/// A single parsed IFD entry.
///
/// Raw tag and type values are preserved alongside their decoded forms so
/// unknown tags can be skipped without losing diagnostics.
#[derive(Debug, Clone)]
pub struct IfdEntry {
    /// Raw tag ID
    pub tag_raw: u16,

    /// Decoded tag, if tracked by this parser
    pub tag: Option<TiffTag>,

    /// Raw field type value
    pub field_type_raw: u16,

    /// Decoded field type, if supported
    pub field_type: Option<FieldType>,

    /// Number of values
    pub count: u64,

    /// Raw bytes of the value/offset field (4 bytes classic, 8 BigTIFF)
    value_offset_bytes: [u8; 8],

    /// Whether the value is stored inline rather than at an offset
    pub is_inline: bool,
}

impl IfdEntry {
    /// Parse one entry from its raw bytes.
    fn parse(bytes: &[u8], header: &TiffHeader) -> Self {
        let byte_order = header.byte_order;
        let tag_raw = byte_order.read_u16(&bytes[0..2]);
        let field_type_raw = byte_order.read_u16(&bytes[2..4]);

        let (count, value_start) = if header.is_bigtiff {
            (byte_order.read_u64(&bytes[4..12]), 12)
        } else {
            (byte_order.read_u32(&bytes[4..8]) as u64, 8)
        };

        let mut value_offset_bytes = [0u8; 8];
        let value_len = header.value_offset_size();
        value_offset_bytes[..value_len].copy_from_slice(&bytes[value_start..value_start + value_len]);

        let field_type = FieldType::from_u16(field_type_raw);
        let is_inline = field_type
            .map(|ft| ft.fits_inline(count, header.is_bigtiff))
            .unwrap_or(false);

        IfdEntry {
            tag_raw,
            tag: TiffTag::from_u16(tag_raw),
            field_type_raw,
            field_type,
            count,
            value_offset_bytes,
            is_inline,
        }
    }

    /// Name of this entry's tag for error messages.
    fn tag_name(&self) -> &'static str {
        self.tag.map(|t| t.name()).unwrap_or("unknown")
    }

    /// The offset where this entry's value is stored (non-inline entries).
    fn value_offset(&self, header: &TiffHeader) -> u64 {
        if header.is_bigtiff {
            header.byte_order.read_u64(&self.value_offset_bytes)
        } else {
            header.byte_order.read_u32(&self.value_offset_bytes[..4]) as u64
        }
    }

    /// Decoded field type, or an error naming the raw value.
    fn require_field_type(&self) -> Result<FieldType, RasterError> {
        self.field_type
            .ok_or(RasterError::UnknownFieldType(self.field_type_raw))
    }

    /// Total byte size of this entry's value.
    fn value_byte_size(&self) -> Result<u64, RasterError> {
        let element_size = self.require_field_type()?.size_in_bytes() as u64;
        element_size
            .checked_mul(self.count)
            .ok_or_else(|| RasterError::InvalidTagValue {
                tag: self.tag_name(),
                message: format!("value count {} overflows the addressable size", self.count),
            })
    }

    /// Raw bytes of this entry's value, inline or fetched from the file.
    pub fn value_bytes(&self, file: &[u8], header: &TiffHeader) -> Result<Vec<u8>, RasterError> {
        let size = self.value_byte_size()? as usize;

        if self.is_inline {
            return Ok(self.value_offset_bytes[..size].to_vec());
        }

        let offset = self.value_offset(header) as usize;
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= file.len())
            .ok_or_else(|| RasterError::InvalidTagValue {
                tag: self.tag_name(),
                message: format!("value range {offset}..+{size} exceeds file bounds"),
            })?;

        Ok(file[offset..end].to_vec())
    }

    /// Read a single unsigned integer value (Short, Long or Long8).
    pub fn read_u64(&self, file: &[u8], header: &TiffHeader) -> Result<u64, RasterError> {
        if self.count != 1 {
            return Err(RasterError::InvalidTagValue {
                tag: self.tag_name(),
                message: format!("expected count 1, got {}", self.count),
            });
        }
        let values = self.read_u64_array(file, header)?;
        Ok(values[0])
    }

    /// Read an array of unsigned integer values (Short, Long or Long8).
    pub fn read_u64_array(
        &self,
        file: &[u8],
        header: &TiffHeader,
    ) -> Result<Vec<u64>, RasterError> {
        let field_type = self.require_field_type()?;
        let bytes = self.value_bytes(file, header)?;
        let byte_order = header.byte_order;

        let values = match field_type {
            FieldType::Short => bytes
                .chunks_exact(2)
                .map(|chunk| byte_order.read_u16(chunk) as u64)
                .collect(),
            FieldType::Long => bytes
                .chunks_exact(4)
                .map(|chunk| byte_order.read_u32(chunk) as u64)
                .collect(),
            FieldType::Long8 => bytes
                .chunks_exact(8)
                .map(|chunk| byte_order.read_u64(chunk))
                .collect(),
            other => {
                return Err(RasterError::InvalidTagValue {
                    tag: self.tag_name(),
                    message: format!("expected Short, Long or Long8, got {other:?}"),
                })
            }
        };

        Ok(values)
    }

    /// Read an array of u16 values (Short only, e.g. the GeoKey directory).
    pub fn read_u16_array(
        &self,
        file: &[u8],
        header: &TiffHeader,
    ) -> Result<Vec<u16>, RasterError> {
        if self.require_field_type()? != FieldType::Short {
            return Err(RasterError::InvalidTagValue {
                tag: self.tag_name(),
                message: format!("expected Short, got {:?}", self.field_type),
            });
        }

        let bytes = self.value_bytes(file, header)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|chunk| header.byte_order.read_u16(chunk))
            .collect())
    }

    /// Read an array of f64 values (Double only, e.g. ModelPixelScale).
    pub fn read_f64_array(
        &self,
        file: &[u8],
        header: &TiffHeader,
    ) -> Result<Vec<f64>, RasterError> {
        if self.require_field_type()? != FieldType::Double {
            return Err(RasterError::InvalidTagValue {
                tag: self.tag_name(),
                message: format!("expected Double, got {:?}", self.field_type),
            });
        }

        let bytes = self.value_bytes(file, header)?;
        Ok(bytes
            .chunks_exact(8)
            .map(|chunk| header.byte_order.read_f64(chunk))
            .collect())
    }

    /// Read an ASCII value, trimming the trailing NUL terminator.
    pub fn read_ascii(&self, file: &[u8], header: &TiffHeader) -> Result<String, RasterError> {
        if self.require_field_type()? != FieldType::Ascii {
            return Err(RasterError::InvalidTagValue {
                tag: self.tag_name(),
                message: format!("expected Ascii, got {:?}", self.field_type),
            });
        }

        let bytes = self.value_bytes(file, header)?;
        let text = bytes
            .split(|&b| b == 0)
            .next()
            .unwrap_or(&[])
            .iter()
            .map(|&b| b as char)
            .collect();
        Ok(text)
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed Image File Directory.
#[derive(Debug, Clone)]
pub struct Ifd {
    /// Entries in file order
    pub entries: Vec<IfdEntry>,
}

impl Ifd {
    /// Parse the IFD at `header.first_ifd_offset`.
    ///
    /// # Errors
    /// `FileTooSmall` if the directory extends past the end of the file.
    pub fn parse(file: &[u8], header: &TiffHeader) -> Result<Self, RasterError> {
        let byte_order = header.byte_order;
        let offset = header.first_ifd_offset as usize;
        let count_size = header.ifd_count_size();

        let count_end = offset + count_size;
        if count_end > file.len() {
            return Err(RasterError::FileTooSmall {
                required: count_end as u64,
                actual: file.len() as u64,
            });
        }

        let entry_count = if header.is_bigtiff {
            byte_order.read_u64(&file[offset..count_end])
        } else {
            byte_order.read_u16(&file[offset..count_end]) as u64
        };

        // The entry count is file-declared; size the directory in saturating
        // u64 so a hostile count fails the bounds check instead of wrapping.
        let entry_size = header.ifd_entry_size();
        let required = entry_count
            .saturating_mul(entry_size as u64)
            .saturating_add(count_end as u64);
        if required > file.len() as u64 {
            return Err(RasterError::FileTooSmall {
                required,
                actual: file.len() as u64,
            });
        }

        let entries = (0..entry_count as usize)
            .map(|i| {
                let start = count_end + i * entry_size;
                IfdEntry::parse(&file[start..start + entry_size], header)
            })
            .collect();

        Ok(Ifd { entries })
    }

    /// Find an entry by tag.
    pub fn entry(&self, tag: TiffTag) -> Option<&IfdEntry> {
        self.entries.iter().find(|entry| entry.tag == Some(tag))
    }

    /// Find an entry by tag or fail with `MissingTag`.
    pub fn require(&self, tag: TiffTag) -> Result<&IfdEntry, RasterError> {
        self.entry(tag).ok_or(RasterError::MissingTag(tag.name()))
    }
}

// =============================================================================
// Tests
// =============================================================================
