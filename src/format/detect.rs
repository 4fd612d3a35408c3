//! Vendor detection for Whole Slide Image files.
//!
//! Detection looks at the file extension first and only then at the file
//! content, so unrelated files are rejected without being read:
//!
//! - **Aperio**: `.svs` or `.tif`, ImageDescription contains "Aperio"
//! - **Hamamatsu**: `.ndpi` with a valid TIFF header
//! - **Ventana**: `.bif` or `.tif`, BigTIFF, XMP contains "iScan"
//! - **Philips TIFF**: `.tiff`, Software contains "Philips"
//!
//! Files that match none of these are reported as unknown.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::TiffError;
use crate::io::ByteStore;

use super::tiff::{find_directory, TiffFile, TiffHeader, TiffTag};

// =============================================================================
// Vendor
// =============================================================================

/// Slide vendors the anonymizer can handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Vendor {
    /// Aperio SVS (also Leica GT450 and KFBIO flavours)
    Aperio,

    /// Hamamatsu NDPI
    Hamamatsu,

    /// Ventana / Roche BIF
    Ventana,

    /// Philips TIFF export
    PhilipsTiff,
}

impl Vendor {
    /// Get a human-readable name for the vendor format.
    pub const fn name(&self) -> &'static str {
        match self {
            Vendor::Aperio => "Aperio SVS",
            Vendor::Hamamatsu => "Hamamatsu NDPI",
            Vendor::Ventana => "Ventana BIF",
            Vendor::PhilipsTiff => "Philips TIFF",
        }
    }

    /// Whether directories of this vendor are parsed with NDPI offsets.
    pub const fn is_ndpi(&self) -> bool {
        matches!(self, Vendor::Hamamatsu)
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Aperio marker in ImageDescription.
const APERIO_MARKER: &str = "Aperio";

/// Ventana marker in the XMP packet.
const VENTANA_MARKER: &str = "iScan";

/// Philips marker in Software.
const PHILIPS_MARKER: &str = "Philips";

/// Lowercase extension of a path, empty if it has none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Detect the vendor of a slide.
///
/// The store is only read. Returns `Ok(None)` for files that are not a
/// supported slide, including files whose TIFF header is invalid.
///
/// # Errors
/// Errors other than header validation, e.g. a broken directory chain in a
/// file that looks like a slide.
pub fn detect_vendor<S: ByteStore + ?Sized>(
    path: &Path,
    store: &mut S,
) -> Result<Option<Vendor>, TiffError> {
    let ext = extension_of(path);
    let candidates = candidates_for(&ext);
    if candidates.is_empty() {
        debug!(path = %path.display(), "No vendor uses this extension");
        return Ok(None);
    }

    let header = match TiffHeader::read(store) {
        Ok(header) => header,
        Err(e) if e.is_header_error() || matches!(e, TiffError::Io(_)) => {
            debug!(path = %path.display(), error = %e, "Not a TIFF file");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    for vendor in candidates {
        if matches_content(*vendor, &header, store)? {
            debug!(path = %path.display(), vendor = vendor.name(), "Detected vendor");
            return Ok(Some(*vendor));
        }
    }

    Ok(None)
}

/// Vendors to probe for an extension, in probing order.
fn candidates_for(ext: &str) -> &'static [Vendor] {
    match ext {
        "svs" => &[Vendor::Aperio],
        "tif" => &[Vendor::Aperio, Vendor::Ventana],
        "ndpi" => &[Vendor::Hamamatsu],
        "bif" => &[Vendor::Ventana],
        "tiff" => &[Vendor::PhilipsTiff],
        _ => &[],
    }
}

fn matches_content<S: ByteStore + ?Sized>(
    vendor: Vendor,
    header: &TiffHeader,
    store: &mut S,
) -> Result<bool, TiffError> {
    let (tag, marker) = match vendor {
        Vendor::Hamamatsu => return Ok(true),
        Vendor::Aperio => (TiffTag::ImageDescription, APERIO_MARKER),
        Vendor::Ventana if !header.is_bigtiff => return Ok(false),
        Vendor::Ventana => (TiffTag::Xmp, VENTANA_MARKER),
        Vendor::PhilipsTiff => (TiffTag::Software, PHILIPS_MARKER),
    };

    let file = TiffFile::read(store, false)?;
    let found = find_directory(store, &file, tag.as_u16(), |text| text.contains(marker))?;
    Ok(found.is_some())
}

// =============================================================================
// Tests
// =============================================================================
