//! Container formats of Whole Slide Image files.
//!
//! Every supported vendor format is a TIFF or BigTIFF container, so this
//! module holds the generic TIFF directory engine plus vendor detection.
//!
//! # Format Detection
//!
//! Use [`detect::detect_vendor`] to identify the vendor of a slide file.
//! Currently supported vendors:
//!
//! - **Aperio SVS**: Identified by "Aperio" marker in ImageDescription
//! - **Hamamatsu NDPI**: Identified by the `.ndpi` extension
//! - **Ventana BIF**: BigTIFF with an "iScan" XMP packet
//! - **Philips TIFF**: Identified by "Philips" in Software

pub mod detect;
pub mod tiff;

pub use detect::{detect_vendor, extension_of, Vendor};
