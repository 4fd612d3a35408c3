//! TIFF directory engine for Whole Slide Images.
//!
//! This module parses TIFF and BigTIFF containers and mutates them in place,
//! which is all the vendor formats built on TIFF need for anonymization.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian, MM = big-endian)
//!   in the header. All multi-byte values must be read respecting this order.
//!
//! - **Classic TIFF vs BigTIFF**: Classic TIFF uses 32-bit offsets (max 4GB files),
//!   while BigTIFF uses 64-bit offsets. The parser handles both transparently.
//!
//! - **Directory chain**: each directory ends with a pointer to the next one. The parsed
//!   model remembers where every pointer lives, so a directory can be removed from the
//!   chain by rewriting a single pointer.
//!
//! - **Inline vs offset values**: Small values are stored inline in the entry,
//!   larger values are stored at an offset pointed to by the entry. The directory
//!   reader keeps both; [`ValueReader`] decides which applies.
//!
//! - **NDPI**: Hamamatsu files are classic TIFF files larger than 4GB. Offsets are
//!   reconstructed from their low 32 bits and the offset of the directory holding them.
//!
//! The parsed [`TiffFile`] is never updated after construction. Every mutation goes
//! straight to the [`ByteStore`](crate::io::ByteStore) at offsets recorded while parsing.

mod codec;
mod directory;
mod parser;
mod redact;
mod tags;
mod unlink;
mod values;
mod wipe;

pub use codec::TiffCursor;
pub use directory::{fix_ndpi_offset, read_tiff_file, TiffDirectory, TiffEntry, TiffFile};
pub use parser::{
    ByteOrder, TiffHeader, TiffLayout, BYTE_ORDER_BIG_ENDIAN, BYTE_ORDER_LITTLE_ENDIAN,
    HEADER_PREFIX_SIZE, VERSION_BIGTIFF, VERSION_TIFF,
};
pub use redact::{
    delimited_values, find_directory, mask_delimited, redact_tags, replace_delimited, MaskText,
    PayloadRedactor, TagTable,
};
pub(crate) use redact::{find_from, rfind_before};
pub use tags::{size_of, Compression, FieldType, TiffTag};
pub use unlink::{terminate_chain, unlink_directories, unlink_directory};
pub use values::ValueReader;
pub use wipe::{
    image_regions, wipe_directory, wipe_region, wipe_regions, Filler, WipeSummary, JPEG_EOI,
    JPEG_SOI, LZW_CLEAR_CODE,
};
