//! Positioned integer codec over a [`ByteStore`].
//!
//! The cursor models the seek/tell/read/write primitives of a stream on top
//! of the positioned store API. Every read or write advances the position by
//! the number of bytes transferred.

use bytes::Bytes;

use super::parser::ByteOrder;
use crate::error::IoError;
use crate::io::ByteStore;

/// A read/write position inside a store, bound to a file byte order.
pub struct TiffCursor<'a, S: ByteStore + ?Sized> {
    store: &'a mut S,
    byte_order: ByteOrder,
    position: u64,
}

impl<'a, S: ByteStore + ?Sized> TiffCursor<'a, S> {
    /// Create a cursor at offset 0.
    pub fn new(store: &'a mut S, byte_order: ByteOrder) -> Self {
        Self {
            store,
            byte_order,
            position: 0,
        }
    }

    /// Move to an absolute offset.
    #[inline]
    pub fn seek(&mut self, offset: u64) {
        self.position = offset;
    }

    /// Current absolute offset.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Byte order used for integer conversion.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Read an unsigned integer of `width` bytes (1, 2, 4 or 8).
    pub fn read_uint(&mut self, width: usize) -> Result<u64, IoError> {
        if !matches!(width, 1 | 2 | 4 | 8) {
            return Err(IoError::InvalidWidth(width));
        }
        let bytes = self.read_bytes(width)?;
        self.byte_order.decode_uint(&bytes)
    }

    /// Write an unsigned integer of `width` bytes (1, 2, 4 or 8).
    pub fn write_uint(&mut self, width: usize, value: u64) -> Result<(), IoError> {
        let bytes = self.byte_order.encode_uint(width, value)?;
        self.write_bytes(&bytes)
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, IoError> {
        let bytes = self.store.read_exact_at(self.position, len)?;
        self.position += len as u64;
        Ok(bytes)
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), IoError> {
        self.store.write_all_at(self.position, data)?;
        self.position += data.len() as u64;
        Ok(())
    }
}
