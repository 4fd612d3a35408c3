//! Directory chain reader.
//!
//! Walks the chain of image file directories (IFDs) from the header's
//! first-directory pointer until a zero pointer, decoding every entry
//! structurally. Values are not interpreted here: whether an entry's slot
//! holds the payload itself or a pointer to it is decided later by the value
//! accessor, which knows the entry's type and count.
//!
//! Besides its entries, every directory remembers two pointer slots:
//!
//! ```text
//!  header / previous IFD            this IFD                      next IFD
//! +--------------------+     +-----------------------------+     +--------
//! | ... [ptr to this] -+---->| count | entries | [ptr next] -+---->| ...
//! +--------------------+     +-----------------------------+     +--------
//!         ^ in_pointer_offset                  ^ out_pointer_offset
//! ```
//!
//! These two offsets are all the unlinker needs to splice a directory out of
//! the chain by rewriting a single pointer.

use std::collections::HashSet;

use tracing::debug;

use super::codec::TiffCursor;
use super::parser::{ByteOrder, TiffHeader, TiffLayout};
use super::tags::size_of;
use crate::error::{IoError, TiffError};
use crate::io::ByteStore;

// =============================================================================
// NDPI Offset Fix-up
// =============================================================================

const LOW_32_BITS: u64 = 0xFFFF_FFFF;
const FOUR_GIB: u64 = 1 << 32;

/// Reconstruct a 64-bit payload offset from a 32-bit NDPI slot value.
///
/// NDPI files are classic TIFFs larger than 4 GiB: payload offsets are stored
/// truncated to 32 bits. The high bits are borrowed from the offset of the
/// directory holding the entry, and since payloads are written before their
/// directory, a result at or after the directory is moved back by 4 GiB.
pub fn fix_ndpi_offset(directory_offset: u64, raw: u64) -> u64 {
    let offset = (directory_offset & !LOW_32_BITS) | (raw & LOW_32_BITS);
    if offset >= directory_offset {
        offset.checked_sub(FOUR_GIB).unwrap_or(offset)
    } else {
        offset
    }
}

// =============================================================================
// TiffEntry
// =============================================================================

/// One decoded directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiffEntry {
    /// Tag id
    pub tag: u16,

    /// Raw field type code
    pub field_type: u16,

    /// Number of scalar elements (already doubled for rational types)
    pub count: u64,

    /// Width of one scalar element in bytes (0 for unknown types)
    pub width: usize,

    /// Absolute offset of this entry's record
    pub start: u64,

    /// Raw value slot bytes as stored on disk (only the first
    /// `slot_width` bytes are meaningful)
    pub slot: [u8; 8],

    /// The slot decoded as an unsigned integer, NDPI fix-up applied.
    ///
    /// This is the payload offset for entries whose payload does not fit the
    /// slot, and meaningless otherwise.
    pub value_or_offset: u64,
}

impl TiffEntry {
    /// Total payload size in bytes, or `None` for unknown types.
    pub fn payload_len(&self) -> Option<u64> {
        if self.width == 0 {
            return None;
        }
        (self.width as u64).checked_mul(self.count)
    }

    /// Whether the payload is stored in the value slot itself.
    ///
    /// Entries of unknown type are treated as inline since their slot cannot
    /// be interpreted as an offset.
    pub fn is_inline(&self, layout: &TiffLayout) -> bool {
        match self.payload_len() {
            Some(len) => len <= layout.slot_width() as u64,
            None => true,
        }
    }

    /// Absolute offset of the value slot inside this entry's record.
    #[inline]
    pub fn slot_offset(&self, layout: &TiffLayout) -> u64 {
        self.start + 4 + layout.count_width() as u64
    }
}

// =============================================================================
// TiffDirectory
// =============================================================================

/// One directory of the chain, with the pointer bookkeeping needed to
/// splice it out later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiffDirectory {
    /// Absolute offset of the directory (its entry count field)
    pub offset: u64,

    /// Entries in disk order
    pub entries: Vec<TiffEntry>,

    /// Offset of the slot that pointed at this directory when it was parsed:
    /// the header's first-directory field or the previous directory's
    /// next-directory field
    pub in_pointer_offset: u64,

    /// Offset of this directory's own next-directory field
    pub out_pointer_offset: u64,

    /// Value of the next-directory field when it was parsed
    pub next_offset: u64,
}

impl TiffDirectory {
    /// Find the first entry with the given tag.
    pub fn find_entry(&self, tag: u16) -> Option<&TiffEntry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    /// Check whether the directory contains a tag.
    pub fn has_tag(&self, tag: u16) -> bool {
        self.find_entry(tag).is_some()
    }
}

// =============================================================================
// TiffFile
// =============================================================================

/// A parsed container: header, layout and every directory of the chain.
///
/// The model is never mutated after parsing. All changes go straight to the
/// store, addressed by the offsets recorded here, so a file must be parsed
/// again to observe them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiffFile {
    /// Validated header
    pub header: TiffHeader,

    /// Field widths used while parsing
    pub layout: TiffLayout,

    /// Directories in chain order
    pub directories: Vec<TiffDirectory>,
}

impl TiffFile {
    /// Parse a container from a store.
    ///
    /// In NDPI mode all directory pointers are 8 bytes wide and payload
    /// offsets are reconstructed with [`fix_ndpi_offset`].
    pub fn read<S: ByteStore + ?Sized>(store: &mut S, ndpi: bool) -> Result<Self, TiffError> {
        read_tiff_file(store, ndpi)
    }

    /// Byte order of the file.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Whether the file is a BigTIFF.
    #[inline]
    pub fn is_bigtiff(&self) -> bool {
        self.header.is_bigtiff
    }

    /// Whether the file was parsed in NDPI mode.
    #[inline]
    pub fn is_ndpi(&self) -> bool {
        self.layout.ndpi
    }

    /// Number of directories in the chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.directories.len()
    }

    /// Whether the chain is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    /// Get a directory by chain index.
    pub fn directory(&self, index: usize) -> Result<&TiffDirectory, TiffError> {
        self.directories
            .get(index)
            .ok_or(TiffError::DirectoryOutOfRange {
                index,
                count: self.directories.len(),
            })
    }
}

// =============================================================================
// DirectoryReader
// =============================================================================

/// Validate the header and walk the whole directory chain.
///
/// # Errors
/// - Header errors (`InvalidMagic`, `InvalidVersion`, ...) for a bad header
/// - `DirectoryRead` for any short read while walking the chain
/// - `DirectoryLoop` if the chain revisits a directory
///
/// No partial file is returned on error.
pub fn read_tiff_file<S: ByteStore + ?Sized>(
    store: &mut S,
    ndpi: bool,
) -> Result<TiffFile, TiffError> {
    let header = TiffHeader::read(store)?;
    let layout = TiffLayout::new(&header, ndpi);
    let file_size = store.size();

    let mut cursor = TiffCursor::new(store, header.byte_order);

    let first_pointer_offset = layout.first_pointer_offset();
    cursor.seek(first_pointer_offset);
    let mut next_offset = cursor
        .read_uint(layout.pointer_width())
        .map_err(|source| TiffError::DirectoryRead {
            offset: first_pointer_offset,
            source,
        })?;
    let mut in_pointer_offset = first_pointer_offset;

    let mut directories: Vec<TiffDirectory> = Vec::new();
    let mut visited = HashSet::new();

    while next_offset != 0 {
        if !visited.insert(next_offset) {
            return Err(TiffError::DirectoryLoop(next_offset));
        }

        let directory = read_directory(
            &mut cursor,
            &layout,
            file_size,
            next_offset,
            in_pointer_offset,
            directories.first(),
        )?;

        debug!(
            index = directories.len(),
            offset = directory.offset,
            entries = directory.entries.len(),
            next = directory.next_offset,
            "Parsed directory"
        );

        next_offset = directory.next_offset;
        in_pointer_offset = directory.out_pointer_offset;
        directories.push(directory);
    }

    Ok(TiffFile {
        header,
        layout,
        directories,
    })
}

/// Read one directory at `offset`.
fn read_directory<S: ByteStore + ?Sized>(
    cursor: &mut TiffCursor<'_, S>,
    layout: &TiffLayout,
    file_size: u64,
    offset: u64,
    in_pointer_offset: u64,
    first_directory: Option<&TiffDirectory>,
) -> Result<TiffDirectory, TiffError> {
    let read_error = |source: IoError| TiffError::DirectoryRead { offset, source };

    cursor.seek(offset);
    let entry_count = cursor
        .read_uint(layout.entry_count_width())
        .map_err(read_error)?;

    // Reject counts that cannot fit in the file before allocating for them
    let directory_size = entry_count
        .checked_mul(layout.entry_size() as u64)
        .and_then(|size| size.checked_add((layout.entry_count_width() + layout.pointer_width()) as u64));
    match directory_size.and_then(|size| offset.checked_add(size)) {
        Some(end) if end <= file_size => {}
        _ => {
            return Err(read_error(IoError::RangeOutOfBounds {
                offset,
                requested: directory_size.unwrap_or(u64::MAX),
                size: file_size,
            }))
        }
    }

    let mut entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        let entry = read_entry(cursor, layout, offset, first_directory).map_err(read_error)?;
        entries.push(entry);
    }

    let out_pointer_offset = cursor.position();
    let next_offset = cursor
        .read_uint(layout.pointer_width())
        .map_err(read_error)?;

    Ok(TiffDirectory {
        offset,
        entries,
        in_pointer_offset,
        out_pointer_offset,
        next_offset,
    })
}

/// Read one entry record at the cursor position.
fn read_entry<S: ByteStore + ?Sized>(
    cursor: &mut TiffCursor<'_, S>,
    layout: &TiffLayout,
    directory_offset: u64,
    first_directory: Option<&TiffDirectory>,
) -> Result<TiffEntry, IoError> {
    let start = cursor.position();
    let tag = cursor.read_uint(2)? as u16;
    let field_type = cursor.read_uint(2)? as u16;
    let declared_count = cursor.read_uint(layout.count_width())?;

    let slot_width = layout.slot_width();
    let raw_slot = cursor.read_bytes(slot_width)?;
    let mut slot = [0u8; 8];
    slot[..slot_width].copy_from_slice(&raw_slot);
    let raw_value = cursor.byte_order().decode_uint(&raw_slot)?;

    // Unknown types are kept so the chain can still be walked; reading
    // their values reports UnsupportedType
    let (width, count) = match size_of(field_type) {
        Ok((width, multiplier)) => (width, declared_count.saturating_mul(multiplier)),
        Err(_) => {
            debug!(tag, field_type, start, "Entry with unsupported field type");
            (0, declared_count)
        }
    };

    let mut entry = TiffEntry {
        tag,
        field_type,
        count,
        width,
        start,
        slot,
        value_or_offset: raw_value,
    };

    if layout.ndpi && !entry.is_inline(layout) {
        let recorded = first_directory
            .and_then(|dir| dir.find_entry(tag))
            .map(|e| e.value_or_offset);
        if recorded != Some(raw_value) {
            entry.value_or_offset = fix_ndpi_offset(directory_offset, raw_value);
        }
    }

    Ok(entry)
}

// =============================================================================
// Tests
// =============================================================================
