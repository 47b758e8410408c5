//! GeoKey directory parsing.
//!
//! GeoTIFF stores its georeferencing keys in the GeoKeyDirectory tag as a
//! flat array of SHORTs:
//!
//! ```text
//! [KeyDirectoryVersion, KeyRevision, MinorRevision, NumberOfKeys,
//!  KeyID, TagLocation, Count, ValueOffset,   <- key 1
//!  KeyID, TagLocation, Count, ValueOffset,   <- key 2
//!  ...]
//! ```
//!
//! A `TagLocation` of 0 means the value is the `ValueOffset` SHORT itself;
//! otherwise it indexes into one of the parameter tags (GeoDoubleParams,
//! GeoAsciiParams). Only the directly stored values are needed to surface
//! the coordinate reference system.

use super::RasterError;

/// GeoKey ID for the geographic (2D geodetic) CRS code.
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;

/// GeoKey ID for the projected CRS code.
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

/// Key value meaning "user-defined" - carries no EPSG code.
const USER_DEFINED: u16 = 32767;

// =============================================================================
// GeoKeyDirectory
// =============================================================================

/// A single GeoKey entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKey {
    /// Key ID (e.g. 3072 = ProjectedCSTypeGeoKey)
    pub id: u16,

    /// Tag holding the value (0 = stored directly in `value`)
    pub tag_location: u16,

    /// Number of values
    pub count: u16,

    /// Directly stored value, or offset into the location tag
    pub value: u16,
}

/// Parsed GeoKey directory.
#[derive(Debug, Clone)]
pub struct GeoKeyDirectory {
    keys: Vec<GeoKey>,
}

impl GeoKeyDirectory {
    /// Parse the directory from the GeoKeyDirectory tag's SHORT array.
    ///
    /// # Errors
    /// `InvalidTagValue` if the header is truncated or the declared key
    /// count does not fit the array.
    pub fn parse(shorts: &[u16]) -> Result<Self, RasterError> {
        if shorts.len() < 4 {
            return Err(RasterError::InvalidTagValue {
                tag: "GeoKeyDirectory",
                message: format!("directory header needs 4 SHORTs, got {}", shorts.len()),
            });
        }

        let key_count = shorts[3] as usize;
        let required = 4 + key_count * 4;
        if shorts.len() < required {
            return Err(RasterError::InvalidTagValue {
                tag: "GeoKeyDirectory",
                message: format!(
                    "directory declares {key_count} keys ({required} SHORTs) but holds {}",
                    shorts.len()
                ),
            });
        }

        let keys = (0..key_count)
            .map(|i| {
                let base = 4 + i * 4;
                GeoKey {
                    id: shorts[base],
                    tag_location: shorts[base + 1],
                    count: shorts[base + 2],
                    value: shorts[base + 3],
                }
            })
            .collect();

        Ok(GeoKeyDirectory { keys })
    }

    /// Find a key by ID.
    pub fn key(&self, id: u16) -> Option<&GeoKey> {
        self.keys.iter().find(|key| key.id == id)
    }

    /// Directly stored value of a key, skipping user-defined and unset codes.
    fn direct_code(&self, id: u16) -> Option<u32> {
        self.key(id)
            .filter(|key| key.tag_location == 0)
            .map(|key| key.value)
            .filter(|&value| value != 0 && value != USER_DEFINED)
            .map(u32::from)
    }

    /// EPSG code of the raster's CRS, if declared.
    ///
    /// A projected CRS takes precedence over a geographic one, matching how
    /// the codes are layered in practice.
    pub fn epsg_code(&self) -> Option<u32> {
        self.direct_code(PROJECTED_CS_TYPE_GEO_KEY)
            .or_else(|| self.direct_code(GEOGRAPHIC_TYPE_GEO_KEY))
    }

    /// CRS in authority notation (e.g. `EPSG:32631`), if declared.
    pub fn crs(&self) -> Option<String> {
        self.epsg_code().map(|code| format!("EPSG:{code}"))
    }
}

// =============================================================================
// Tests
// =============================================================================
