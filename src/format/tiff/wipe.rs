//! In-place overwriting of image data regions.
//!
//! A wipe replaces the bytes of a strip or tile with filler of exactly the
//! same length, so no offset anywhere in the file changes. An optional
//! prefix check guards against overwriting bytes that are not the expected
//! image data.

use bytes::Bytes;
use tracing::debug;

use super::directory::TiffFile;
use super::tags::TiffTag;
use super::values::ValueReader;
use crate::error::TiffError;
use crate::io::ByteStore;

// =============================================================================
// Constants
// =============================================================================

/// JPEG start-of-image marker
pub const JPEG_SOI: &[u8] = &[0xFF, 0xD8];

/// JPEG end-of-image marker
pub const JPEG_EOI: &[u8] = &[0xFF, 0xD9];

/// First byte of an LZW stream starting with a clear code
pub const LZW_CLEAR_CODE: &[u8] = &[0x80];

/// Largest buffer written in one call
const WRITE_CHUNK_SIZE: usize = 1024 * 1024;

// =============================================================================
// Filler
// =============================================================================

/// Content written over a wiped region.
///
/// The region is filled with `fill`, then `prefix` and `suffix` are
/// substituted at its start and end. Both are skipped when they do not fit
/// the region together, so the written length always equals the region
/// length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filler {
    /// Repeated fill byte
    pub fill: u8,
    /// Bytes placed at the start of the region
    pub prefix: Bytes,
    /// Bytes placed at the end of the region
    pub suffix: Bytes,
}

impl Filler {
    /// Filler of a single repeated byte.
    pub fn new(fill: u8) -> Self {
        Self {
            fill,
            prefix: Bytes::new(),
            suffix: Bytes::new(),
        }
    }

    /// Zero filler.
    pub fn zeros() -> Self {
        Self::new(0)
    }

    /// Set the literal prefix.
    pub fn with_prefix(mut self, prefix: &'static [u8]) -> Self {
        self.prefix = Bytes::from_static(prefix);
        self
    }

    /// Set the literal suffix.
    pub fn with_suffix(mut self, suffix: &'static [u8]) -> Self {
        self.suffix = Bytes::from_static(suffix);
        self
    }

    /// Whether prefix and suffix are written for a region of `len` bytes.
    fn wraps(&self, len: u64) -> bool {
        (self.prefix.len() + self.suffix.len()) as u64 <= len
    }

    /// Render the filler for the window `[start, start + buf.len())` of a
    /// region of `len` bytes.
    fn render_window(&self, len: u64, start: u64, buf: &mut [u8]) {
        buf.fill(self.fill);
        if !self.wraps(len) {
            return;
        }

        overlay(buf, start, 0, &self.prefix);
        overlay(buf, start, len - self.suffix.len() as u64, &self.suffix);
    }

    /// Render the whole filler for a region of `len` bytes.
    pub fn render(&self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        self.render_window(len as u64, 0, &mut buf);
        buf
    }
}

/// Copy the part of `bytes` (placed at region offset `at`) that falls into
/// the window starting at region offset `start`.
fn overlay(buf: &mut [u8], start: u64, at: u64, bytes: &[u8]) {
    let end = start + buf.len() as u64;
    let from = at.max(start);
    let to = (at + bytes.len() as u64).min(end);
    if from < to {
        buf[(from - start) as usize..(to - start) as usize]
            .copy_from_slice(&bytes[(from - at) as usize..(to - at) as usize]);
    }
}

impl Default for Filler {
    fn default() -> Self {
        Self::zeros()
    }
}

// =============================================================================
// Region Wiping
// =============================================================================

/// Result of wiping a set of regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WipeSummary {
    /// Number of regions overwritten
    pub regions: usize,
    /// Total bytes overwritten
    pub bytes: u64,
}

/// Overwrite one region with filler.
///
/// If `required_prefix` is given, the region must start with those bytes;
/// otherwise `PrefixMismatch` is returned and nothing is written.
pub fn wipe_region<S: ByteStore + ?Sized>(
    store: &mut S,
    offset: u64,
    len: u64,
    filler: &Filler,
    required_prefix: Option<&[u8]>,
) -> Result<(), TiffError> {
    if let Some(prefix) = required_prefix {
        if len < prefix.len() as u64 {
            return Err(TiffError::PrefixMismatch { offset });
        }
        let head = store.read_exact_at(offset, prefix.len())?;
        if head.as_ref() != prefix {
            return Err(TiffError::PrefixMismatch { offset });
        }
    }

    debug!(offset, len, "Wiping region");

    let mut buf = vec![0u8; (len as usize).min(WRITE_CHUNK_SIZE)];
    let mut written = 0u64;
    while written < len {
        let chunk = ((len - written) as usize).min(buf.len());
        let window = &mut buf[..chunk];
        filler.render_window(len, written, window);
        store.write_all_at(offset + written, window)?;
        written += chunk as u64;
    }

    Ok(())
}

/// Overwrite several `(offset, length)` regions in order.
///
/// Stops at the first failure. Regions wiped before the failure stay
/// wiped.
pub fn wipe_regions<S: ByteStore + ?Sized>(
    store: &mut S,
    regions: &[(u64, u64)],
    filler: &Filler,
    required_prefix: Option<&[u8]>,
) -> Result<WipeSummary, TiffError> {
    let mut summary = WipeSummary::default();
    for &(offset, len) in regions {
        if len == 0 {
            continue;
        }
        wipe_region(store, offset, len, filler, required_prefix)?;
        summary.regions += 1;
        summary.bytes += len;
    }
    Ok(summary)
}

/// Resolve the image data regions of a directory.
///
/// Strips are used when the directory has StripOffsets, tiles otherwise.
///
/// # Errors
/// - `MissingTag` if the offsets or byte counts tag is absent
/// - `StripMismatch` if both arrays differ in length
pub fn image_regions<S: ByteStore + ?Sized>(
    store: &mut S,
    file: &TiffFile,
    index: usize,
) -> Result<Vec<(u64, u64)>, TiffError> {
    let directory = file.directory(index)?;

    let (offsets_tag, counts_tag) = if directory.has_tag(TiffTag::StripOffsets.as_u16()) {
        (TiffTag::StripOffsets, TiffTag::StripByteCounts)
    } else {
        (TiffTag::TileOffsets, TiffTag::TileByteCounts)
    };

    let mut reader = ValueReader::new(store, file);
    let offsets = reader.read_tag_values(directory, offsets_tag.as_u16())?;
    let lengths = reader.read_tag_values(directory, counts_tag.as_u16())?;

    if offsets.len() != lengths.len() {
        return Err(TiffError::StripMismatch {
            offsets: offsets.len(),
            lengths: lengths.len(),
        });
    }

    Ok(offsets.into_iter().zip(lengths).collect())
}

/// Overwrite every strip or tile of directory `index`.
pub fn wipe_directory<S: ByteStore + ?Sized>(
    store: &mut S,
    file: &TiffFile,
    index: usize,
    filler: &Filler,
    required_prefix: Option<&[u8]>,
) -> Result<WipeSummary, TiffError> {
    let regions = image_regions(store, file, index)?;
    let summary = wipe_regions(store, &regions, filler, required_prefix)?;

    debug!(
        directory = index,
        regions = summary.regions,
        bytes = summary.bytes,
        "Wiped directory image data"
    );

    Ok(summary)
}

// =============================================================================
// Tests
// =============================================================================
