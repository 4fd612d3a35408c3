//! TIFF header parsing and container layout.
//!
//! This module validates the file header and describes the field widths that
//! every later stage (directory walk, value access, unlinking) depends on.
//!
//! # TIFF Header Structure
//!
//! ## Classic TIFF (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD (4 bytes, 8 bytes in NDPI files)
//! ```
//!
//! ## BigTIFF (16 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (43 = 0x002B)
//! Bytes 4-5: Offset byte size (must be 8)
//! Bytes 6-7: Reserved (must be 0)
//! Bytes 8-15: Offset to first IFD (8 bytes)
//! ```

use crate::error::{IoError, TiffError};
use crate::io::{read_u16_be, read_u16_le, ByteStore};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
pub const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
pub const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
pub const VERSION_TIFF: u16 = 42;

/// Version number for BigTIFF
pub const VERSION_BIGTIFF: u16 = 43;

/// Number of header bytes needed to classify a file (magic, version and,
/// for BigTIFF, offset size and padding).
pub const HEADER_PREFIX_SIZE: usize = 8;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF file.
///
/// TIFF files declare their byte order in the first two bytes of the header.
/// All multi-byte values in the file must be read respecting this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the machine we are running on.
    #[inline]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    /// Whether values in this order must be byte-swapped on this machine.
    #[inline]
    pub fn needs_swap(self) -> bool {
        self != Self::native()
    }

    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    /// Decode an unsigned integer whose width is the length of `bytes`.
    ///
    /// The raw bytes are taken in native order and swapped only when the
    /// file order differs from the native one.
    ///
    /// # Errors
    /// `IoError::InvalidWidth` unless `bytes.len()` is 1, 2, 4 or 8.
    pub fn decode_uint(self, bytes: &[u8]) -> Result<u64, IoError> {
        let swap = self.needs_swap();
        let value = match bytes.len() {
            1 => bytes[0] as u64,
            2 => {
                let v = u16::from_ne_bytes([bytes[0], bytes[1]]);
                (if swap { v.swap_bytes() } else { v }) as u64
            }
            4 => {
                let v = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                (if swap { v.swap_bytes() } else { v }) as u64
            }
            8 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                let v = u64::from_ne_bytes(raw);
                if swap {
                    v.swap_bytes()
                } else {
                    v
                }
            }
            other => return Err(IoError::InvalidWidth(other)),
        };
        Ok(value)
    }

    /// Encode `value` as an unsigned integer of `width` bytes.
    ///
    /// Values wider than `width` are truncated to their low-order bytes.
    ///
    /// # Errors
    /// `IoError::InvalidWidth` unless `width` is 1, 2, 4 or 8.
    pub fn encode_uint(self, width: usize, value: u64) -> Result<Vec<u8>, IoError> {
        let swap = self.needs_swap();
        let bytes = match width {
            1 => vec![value as u8],
            2 => {
                let v = value as u16;
                (if swap { v.swap_bytes() } else { v }).to_ne_bytes().to_vec()
            }
            4 => {
                let v = value as u32;
                (if swap { v.swap_bytes() } else { v }).to_ne_bytes().to_vec()
            }
            8 => (if swap { value.swap_bytes() } else { value })
                .to_ne_bytes()
                .to_vec(),
            other => return Err(IoError::InvalidWidth(other)),
        };
        Ok(bytes)
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header.
///
/// The header only fixes the byte order and the container variant. Where the
/// first-directory pointer lives, and how wide it is, depends on whether the
/// file is read in NDPI mode; see [`TiffLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Whether this is a BigTIFF file (64-bit offsets)
    pub is_bigtiff: bool,
}

impl TiffHeader {
    /// Parse a TIFF header from its first [`HEADER_PREFIX_SIZE`] bytes.
    ///
    /// # Errors
    /// - `InvalidMagic` if byte order bytes are not II or MM
    /// - `InvalidVersion` if version is not 42 or 43
    /// - `InvalidBigTiffOffsetSize` if BigTIFF offset size is not 8
    /// - `InvalidBigTiffPadding` if the BigTIFF reserved field is not 0
    /// - `Io` if fewer than 8 bytes are supplied
    pub fn parse(bytes: &[u8]) -> Result<Self, TiffError> {
        if bytes.len() < HEADER_PREFIX_SIZE {
            return Err(TiffError::Io(IoError::RangeOutOfBounds {
                offset: 0,
                requested: HEADER_PREFIX_SIZE as u64,
                size: bytes.len() as u64,
            }));
        }

        // Checked against fixed byte patterns, so the order used here is irrelevant
        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(TiffError::InvalidMagic(magic)),
        };

        let version = byte_order.read_u16(&bytes[2..4]);
        match version {
            VERSION_TIFF => Ok(TiffHeader {
                byte_order,
                is_bigtiff: false,
            }),
            VERSION_BIGTIFF => {
                let offset_size = byte_order.read_u16(&bytes[4..6]);
                if offset_size != 8 {
                    return Err(TiffError::InvalidBigTiffOffsetSize(offset_size));
                }

                let padding = byte_order.read_u16(&bytes[6..8]);
                if padding != 0 {
                    return Err(TiffError::InvalidBigTiffPadding(padding));
                }

                Ok(TiffHeader {
                    byte_order,
                    is_bigtiff: true,
                })
            }
            _ => Err(TiffError::InvalidVersion(version)),
        }
    }

    /// Read and validate the header at the start of a store.
    pub fn read<S: ByteStore + ?Sized>(store: &mut S) -> Result<Self, TiffError> {
        let bytes = store.read_exact_at(0, HEADER_PREFIX_SIZE)?;
        Self::parse(&bytes)
    }
}

// =============================================================================
// TiffLayout
// =============================================================================

/// Field widths of a container, derived from its variant and the NDPI mode.
///
/// | field                       | classic | NDPI | BigTIFF |
/// |-----------------------------|---------|------|---------|
/// | directory entry count       | 2       | 2    | 8       |
/// | entry element count         | 4       | 4    | 8       |
/// | entry value slot            | 4       | 4    | 8       |
/// | next-directory pointer      | 4       | 8    | 8       |
/// | first-directory pointer     | 4 @ 4   | 8 @ 4| 8 @ 8   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffLayout {
    /// BigTIFF container
    pub is_bigtiff: bool,

    /// Hamamatsu NDPI offset encoding
    pub ndpi: bool,
}

impl TiffLayout {
    /// Layout for a header, optionally in NDPI mode.
    pub const fn new(header: &TiffHeader, ndpi: bool) -> Self {
        Self {
            is_bigtiff: header.is_bigtiff,
            ndpi,
        }
    }

    /// Width of the entry count field at the start of a directory.
    #[inline]
    pub const fn entry_count_width(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            2
        }
    }

    /// Width of the element count field inside an entry.
    #[inline]
    pub const fn count_width(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }

    /// Width of the value/offset slot inside an entry.
    ///
    /// This is also the inline value threshold.
    #[inline]
    pub const fn slot_width(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }

    /// Size of one directory entry record.
    ///
    /// Classic TIFF: 12 bytes (2 tag + 2 type + 4 count + 4 value/offset)
    /// BigTIFF: 20 bytes (2 tag + 2 type + 8 count + 8 value/offset)
    #[inline]
    pub const fn entry_size(&self) -> usize {
        4 + self.count_width() + self.slot_width()
    }

    /// Width of every directory pointer: the header's first-directory field
    /// and each directory's trailing next-directory field.
    #[inline]
    pub const fn pointer_width(&self) -> usize {
        if self.is_bigtiff || self.ndpi {
            8
        } else {
            4
        }
    }

    /// File offset of the header's first-directory pointer.
    #[inline]
    pub const fn first_pointer_offset(&self) -> u64 {
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
