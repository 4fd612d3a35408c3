use bytes::Bytes;

use crate::error::IoError;

/// Random-access byte store holding a slide file.
///
/// This abstraction lets the TIFF engine read and patch a file without
/// knowing whether it lives on the local filesystem or in memory. A store is
/// exclusively owned for the duration of a run, so every call takes `&mut self`
/// and completes before returning.
pub trait ByteStore {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Overwrite `data.len()` bytes starting at `offset`.
    ///
    /// Stores are never extended: writing past the current end is an error.
    fn write_all_at(&mut self, offset: u64, data: &[u8]) -> Result<(), IoError>;

    /// Get the total size of the store in bytes.
    fn size(&self) -> u64;

    /// Get a unique identifier for this store (for logging).
    fn identifier(&self) -> &str;
}

/// Check that `[offset, offset + len)` lies inside a store of `size` bytes.
#[inline]
pub(crate) fn check_range(offset: u64, len: usize, size: u64) -> Result<(), IoError> {
    match offset.checked_add(len as u64) {
        Some(end) if end <= size => Ok(()),
        _ => Err(IoError::RangeOutOfBounds {
            offset,
            requested: len as u64,
            size,
        }),
    }
}

// =============================================================================
// Endian Helper Functions
// =============================================================================
//
// TIFF files can be either little-endian or big-endian, determined by the
// magic bytes at the start of the file. These helpers are used by the
// TIFF codec for both reading and patching values.

/// Read a little-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Read a big-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_be(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}
