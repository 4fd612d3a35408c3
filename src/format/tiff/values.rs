//! TIFF tag value access.
//!
//! Values can be stored either inline in the entry's value slot (for small
//! values) or at an offset in the file (for larger values like arrays). The
//! directory reader records both interpretations; this module resolves which
//! one applies from the entry's type and count.
//!
//! Nothing is cached: every call goes back to the store, so values written by
//! an earlier step are always observed.

use bytes::Bytes;

use super::directory::{TiffDirectory, TiffEntry, TiffFile};
use super::parser::ByteOrder;
use super::tags::size_of;
use crate::error::{IoError, TiffError};
use crate::io::ByteStore;

// =============================================================================
// ValueReader
// =============================================================================

/// Reads and patches tag values of a parsed file.
///
/// Combines the store with the parsed [`TiffFile`] so values are decoded with
/// the file's byte order and layout.
pub struct ValueReader<'a, S: ByteStore + ?Sized> {
    store: &'a mut S,
    file: &'a TiffFile,
}

impl<'a, S: ByteStore + ?Sized> ValueReader<'a, S> {
    /// Create a new ValueReader.
    pub fn new(store: &'a mut S, file: &'a TiffFile) -> Self {
        Self { store, file }
    }

    /// Get the byte order of the file.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.file.byte_order()
    }

    /// Size of the payload in bytes, validating the entry's type.
    fn payload_len(&self, entry: &TiffEntry) -> Result<usize, TiffError> {
        let (width, _) = size_of(entry.field_type)?;
        (width as u64)
            .checked_mul(entry.count)
            .and_then(|len| usize::try_from(len).ok())
            .ok_or(TiffError::Io(IoError::RangeOutOfBounds {
                offset: entry.value_or_offset,
                requested: u64::MAX,
                size: self.store.size(),
            }))
    }

    /// Absolute offset where an entry's payload lives.
    fn payload_offset(&self, entry: &TiffEntry) -> u64 {
        if entry.is_inline(&self.file.layout) {
            entry.slot_offset(&self.file.layout)
        } else {
            entry.value_or_offset
        }
    }

    /// Read the raw payload bytes of an entry.
    ///
    /// Inline payloads are taken from the recorded slot without I/O.
    pub fn read_bytes(&mut self, entry: &TiffEntry) -> Result<Bytes, TiffError> {
        let len = self.payload_len(entry)?;

        if entry.is_inline(&self.file.layout) {
            return Ok(Bytes::copy_from_slice(&entry.slot[..len]));
        }

        Ok(self.store.read_exact_at(entry.value_or_offset, len)?)
    }

    /// Read every scalar element of an entry as unsigned integers.
    ///
    /// Rational entries yield numerator and denominator as separate
    /// elements. Signed and floating point types are returned as their raw
    /// bit patterns.
    pub fn read_values(&mut self, entry: &TiffEntry) -> Result<Vec<u64>, TiffError> {
        let (width, _) = size_of(entry.field_type)?;
        let bytes = self.read_bytes(entry)?;
        let byte_order = self.byte_order();

        bytes
            .chunks_exact(width)
            .map(|chunk| byte_order.decode_uint(chunk).map_err(TiffError::from))
            .collect()
    }

    /// Read the values of the first entry with `tag` in a directory.
    ///
    /// # Errors
    /// `MissingTag` if the directory has no such entry.
    pub fn read_tag_values(
        &mut self,
        directory: &TiffDirectory,
        tag: u16,
    ) -> Result<Vec<u64>, TiffError> {
        let entry = directory.find_entry(tag).ok_or(TiffError::MissingTag(tag))?;
        self.read_values(entry)
    }

    /// Read a single FLOAT value.
    pub fn read_f32(&mut self, entry: &TiffEntry) -> Result<Option<f32>, TiffError> {
        let values = self.read_values(entry)?;
        Ok(values.first().map(|&bits| f32::from_bits(bits as u32)))
    }

    /// Read an ASCII payload as a string.
    ///
    /// Trailing NUL terminators are dropped and invalid UTF-8 is replaced.
    pub fn read_string(&mut self, entry: &TiffEntry) -> Result<String, TiffError> {
        let bytes = self.read_bytes(entry)?;
        let end = bytes
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Overwrite an entry's payload in place.
    ///
    /// # Errors
    /// `PayloadLength` unless `data` has exactly the payload's length.
    pub fn write_payload(&mut self, entry: &TiffEntry, data: &[u8]) -> Result<(), TiffError> {
        let len = self.payload_len(entry)?;
        if data.len() != len {
            return Err(TiffError::PayloadLength {
                expected: len,
                actual: data.len(),
            });
        }

        let offset = self.payload_offset(entry);
        self.store.write_all_at(offset, data)?;
        Ok(())
    }

    /// Patch the first element of an inline value.
    ///
    /// Used to rewrite small scalar tags such as Compression.
    pub fn write_inline_value(&mut self, entry: &TiffEntry, value: u64) -> Result<(), TiffError> {
        let (width, _) = size_of(entry.field_type)?;
        let bytes = self.byte_order().encode_uint(width, value)?;
        let offset = entry.slot_offset(&self.file.layout);
        self.store.write_all_at(offset, &bytes)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
