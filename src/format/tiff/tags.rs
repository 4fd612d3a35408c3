//! TIFF tag and field type definitions.
//!
//! This module defines the vocabulary for TIFF parsing:
//! - Field types that determine how values are encoded
//! - Tag IDs that identify the fields slide anonymization touches
//!
//! The directory engine itself treats tags as opaque numbers; the ids here are
//! consumed by the vendor handlers.

use crate::error::TiffError;

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
///
/// Each field type has an element width in bytes, which decides whether a
/// value fits inline in a directory entry and how arrays are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer
    Byte = 1,
    /// 8-bit ASCII character
    Ascii = 2,
    /// Unsigned 16-bit integer
    Short = 3,
    /// Unsigned 32-bit integer
    Long = 4,
    /// Two LONGs: numerator and denominator
    Rational = 5,
    /// Signed 8-bit integer
    SByte = 6,
    /// Undefined byte data
    Undefined = 7,
    /// Signed 16-bit integer
    SShort = 8,
    /// Signed 32-bit integer
    SLong = 9,
    /// Two SLONGs: numerator and denominator
    SRational = 10,
    /// IEEE single precision float
    Float = 11,
    /// IEEE double precision float
    Double = 12,
    /// 32-bit directory offset
    Ifd = 13,
    /// Unsigned 64-bit integer (BigTIFF)
    Long8 = 16,
    /// Signed 64-bit integer (BigTIFF)
    SLong8 = 17,
    /// 64-bit directory offset (BigTIFF)
    Ifd8 = 18,
}

impl FieldType {
    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unknown type values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            6 => Some(FieldType::SByte),
            7 => Some(FieldType::Undefined),
            8 => Some(FieldType::SShort),
            9 => Some(FieldType::SLong),
            10 => Some(FieldType::SRational),
            11 => Some(FieldType::Float),
            12 => Some(FieldType::Double),
            13 => Some(FieldType::Ifd),
            16 => Some(FieldType::Long8),
            17 => Some(FieldType::SLong8),
            18 => Some(FieldType::Ifd8),
            _ => None,
        }
    }

    /// Width of a single scalar element of this type in bytes.
    ///
    /// Rationals are decoded as two 4-byte scalars, so their element width
    /// is 4 and their count is doubled (see [`FieldType::count_multiplier`]).
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long
            | FieldType::SLong
            | FieldType::Float
            | FieldType::Ifd
            | FieldType::Rational
            | FieldType::SRational => 4,
            FieldType::Double | FieldType::Long8 | FieldType::SLong8 | FieldType::Ifd8 => 8,
        }
    }

    /// Factor applied to the declared element count when decoding.
    #[inline]
    pub const fn count_multiplier(self) -> u64 {
        match self {
            FieldType::Rational | FieldType::SRational => 2,
            _ => 1,
        }
    }
}

/// Resolve a raw type code to `(element width, count multiplier)`.
///
/// # Errors
/// `UnsupportedType` for codes outside the TIFF 6.0 / BigTIFF catalog.
pub fn size_of(type_code: u16) -> Result<(usize, u64), TiffError> {
    let field_type = FieldType::from_u16(type_code).ok_or(TiffError::UnsupportedType(type_code))?;
    Ok((field_type.size_in_bytes(), field_type.count_multiplier()))
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF tag IDs used by slide anonymization.
///
/// Tags not listed here are carried through parsing untouched and can still
/// be addressed by their numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    /// Compression scheme used
    Compression = 259,

    /// Description string (slide metadata in SVS, Ventana and Philips files)
    ImageDescription = 270,

    /// Byte offsets of strips
    StripOffsets = 273,

    /// Byte counts of strips
    StripByteCounts = 279,

    /// Name of the acquisition software
    Software = 305,

    /// Acquisition date and time
    DateTime = 306,

    /// Byte offsets of each tile in the file
    TileOffsets = 324,

    /// Byte counts of each tile
    TileByteCounts = 325,

    /// XMP packet (Ventana scan metadata)
    Xmp = 700,

    /// Hamamatsu NDPI source lens magnification (-1 for the macro image)
    NdpiSourceLens = 65421,
}

impl TiffTag {
    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

// =============================================================================
// Compression Values
// =============================================================================

/// TIFF compression scheme identifiers written by the anonymizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Compression {
    /// LZW compression
    Lzw = 5,
}

impl Compression {
    /// Get the numeric compression code.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

// =============================================================================
// Tests
// =============================================================================
