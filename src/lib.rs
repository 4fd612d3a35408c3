//! # WSI Anonymizer
//!
//! Removes label images and identifying metadata from Whole Slide Images.
//!
//! Slides from most scanners are TIFF containers (classic TIFF, BigTIFF or
//! the NDPI variant). The label image, which often shows a barcode or patient
//! name, lives in its own directory. This library patches those files in
//! place without decoding any pixels: image data is overwritten with filler,
//! directories are unlinked from the chain and identifying text tags are
//! masked with values of the same length.
//!
//! ## Features
//!
//! - **Format support**: Aperio SVS, Hamamatsu NDPI, Ventana BIF and Philips TIFF
//! - **In-place patching**: Only the bytes that identify the slide are rewritten
//! - **Byte order aware**: Little- and big-endian files, 32- and 64-bit offsets
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`io`] - Byte stores (local files and in-memory buffers)
//! - [`mod@format`] - TIFF engine and vendor detection
//! - [`vendor`] - Per-vendor anonymization handlers
//! - [`mod@anonymize`] - Anonymization runs and reports
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use wsi_anonymizer::{anonymize, AnonymizeOptions};
//!
//! let report = anonymize(Path::new("slide.svs"), &AnonymizeOptions::default())?;
//! println!("anonymized copy written to {}", report.path.display());
//! # Ok::<(), wsi_anonymizer::AnonymizeError>(())
//! ```

pub mod anonymize;
pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod vendor;

// Re-export commonly used types
pub use anonymize::{
    anonymize, detect, inspect, output_path, AnonymizeOptions, AnonymizeReport, SlideInfo,
};
pub use config::{AnonymizeConfig, CheckConfig, Cli, Command, InfoConfig};
pub use error::{AnonymizeError, IoError, TiffError};
pub use format::tiff::{
    read_tiff_file, unlink_directory, wipe_directory, wipe_region, ByteOrder, FieldType, Filler,
    TagTable, TiffDirectory, TiffEntry, TiffFile, TiffHeader, TiffTag, ValueReader,
};
pub use format::{detect_vendor, Vendor};
pub use io::{ByteStore, FileStore, MemoryStore};
pub use vendor::{handler_for, MetadataAttribute, SlideAnonymizer, VendorOutcome};
