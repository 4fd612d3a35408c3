//! Anonymization runs.
//!
//! A run detects the vendor of a slide, copies it next to the original
//! unless asked to work in place, and lets the vendor handler mutate the
//! copy. Detection and metadata listing open files read-only.
//!
//! Runs are synchronous and own their file for the whole run. Callers that
//! process several slides at once run one blocking task per slide.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AnonymizeError, IoError};
use crate::format::{detect_vendor, Vendor};
use crate::io::{ByteStore, FileStore};
use crate::vendor::{handler_for, MetadataAttribute};

// =============================================================================
// Options
// =============================================================================

/// Default character used to mask identifying values.
pub const DEFAULT_PSEUDONYM: char = 'X';

/// Prefix of the default output file name.
pub const ANONYMIZED_PREFIX: &str = "anonymized_";

/// Options of an anonymization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymizeOptions {
    /// Output file stem; defaults to `anonymized_<stem>`
    pub new_name: Option<String>,

    /// Mutate the original file instead of a copy
    pub in_place: bool,

    /// Leave the macro image untouched where the vendor allows it
    pub keep_macro_image: bool,

    /// Wipe images but keep their directories in the chain
    pub disable_unlinking: bool,

    /// Character written over identifying metadata values
    pub pseudonym: char,
}

impl Default for AnonymizeOptions {
    fn default() -> Self {
        Self {
            new_name: None,
            in_place: false,
            keep_macro_image: false,
            disable_unlinking: false,
            pseudonym: DEFAULT_PSEUDONYM,
        }
    }
}

impl AnonymizeOptions {
    /// Validate the options before any file is touched.
    pub fn validate(&self) -> Result<(), AnonymizeError> {
        if let Some(name) = &self.new_name {
            if self.in_place {
                return Err(AnonymizeError::InvalidOptions(
                    "a new name cannot be used together with in-place anonymization".to_string(),
                ));
            }
            if name.is_empty() {
                return Err(AnonymizeError::InvalidOptions("new name is empty".to_string()));
            }
            if name.contains(['/', '\\']) {
                return Err(AnonymizeError::InvalidOptions(format!(
                    "new name '{name}' must not contain path separators"
                )));
            }
        }

        if !self.pseudonym.is_ascii_graphic() {
            return Err(AnonymizeError::InvalidOptions(format!(
                "pseudonym must be a single printable ASCII character, got {:?}",
                self.pseudonym
            )));
        }

        Ok(())
    }

    /// The pseudonym as a byte. Falls back to the default for characters
    /// rejected by [`AnonymizeOptions::validate`].
    pub fn pseudonym_byte(&self) -> u8 {
        if self.pseudonym.is_ascii_graphic() {
            self.pseudonym as u8
        } else {
            DEFAULT_PSEUDONYM as u8
        }
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Result of anonymizing one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnonymizeReport {
    /// Detected vendor
    pub vendor: Vendor,

    /// File that was mutated (the copy unless run in place)
    pub path: PathBuf,

    /// Directories whose image data was overwritten
    pub wiped_directories: Vec<usize>,

    /// Directories removed from the chain, in unlink order
    pub unlinked_directories: Vec<usize>,

    /// Tag payloads rewritten by metadata redaction
    pub redacted_entries: usize,
}

/// Vendor and identifying metadata of a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideInfo {
    /// Inspected file
    pub path: PathBuf,

    /// Detected vendor, `None` if unsupported
    pub vendor: Option<Vendor>,

    /// Identifying attributes found in the file
    pub attributes: Vec<MetadataAttribute>,
}

// =============================================================================
// Runs
// =============================================================================

/// Path of the anonymized copy of `source`.
///
/// The copy lives next to the source and keeps its extension:
/// `dir/slide.svs` becomes `dir/anonymized_slide.svs`, or `dir/<new_name>.svs`.
pub fn output_path(source: &Path, new_name: Option<&str>) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match new_name {
        Some(name) => name.to_string(),
        None => format!("{ANONYMIZED_PREFIX}{stem}"),
    };

    let file_name = match source.extension() {
        Some(ext) => format!("{name}.{}", ext.to_string_lossy()),
        None => name,
    };

    source.with_file_name(file_name)
}

fn copy_error(path: &Path, e: std::io::Error) -> IoError {
    IoError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Detect the vendor of a slide file.
pub fn detect(path: &Path) -> Result<Option<Vendor>, AnonymizeError> {
    let mut store = FileStore::open_read_only(path)?;
    Ok(detect_vendor(path, &mut store)?)
}

/// Detect the vendor of a slide and list its identifying metadata.
pub fn inspect(path: &Path) -> Result<SlideInfo, AnonymizeError> {
    let mut store = FileStore::open_read_only(path)?;
    let vendor = detect_vendor(path, &mut store)?;

    let attributes = match vendor {
        Some(vendor) => handler_for(vendor).metadata(&mut store)?,
        None => Vec::new(),
    };

    Ok(SlideInfo {
        path: path.to_path_buf(),
        vendor,
        attributes,
    })
}

/// Anonymize one slide file.
///
/// Unless `options.in_place` is set, the slide is first copied to
/// [`output_path`] and only the copy is changed.
///
/// # Errors
/// - `InvalidOptions` for rejected options
/// - `UnsupportedFormat` if no vendor is detected
/// - Any engine error raised while mutating the file. The file may then be
///   partially anonymized.
pub fn anonymize(path: &Path, options: &AnonymizeOptions) -> Result<AnonymizeReport, AnonymizeError> {
    options.validate()?;

    let vendor = detect(path)?.ok_or_else(|| AnonymizeError::UnsupportedFormat {
        reason: format!("{} is not a supported slide", path.display()),
    })?;
    info!(path = %path.display(), vendor = vendor.name(), "Anonymizing slide");

    let target = if options.in_place {
        path.to_path_buf()
    } else {
        let target = output_path(path, options.new_name.as_deref());
        if target == path {
            return Err(AnonymizeError::InvalidOptions(format!(
                "output {} would overwrite the source",
                target.display()
            )));
        }
        std::fs::copy(path, &target).map_err(|e| copy_error(&target, e))?;
        debug!(source = %path.display(), copy = %target.display(), "Copied slide");
        target
    };

    let mut store = FileStore::open(&target)?;
    let outcome = handler_for(vendor).anonymize(&mut store, options)?;
    store.sync()?;

    info!(
        path = %target.display(),
        identifier = store.identifier(),
        wiped = outcome.wiped_directories.len(),
        unlinked = outcome.unlinked_directories.len(),
        redacted = outcome.redacted_entries,
        "Slide anonymized"
    );

    Ok(AnonymizeReport {
        vendor,
        path: target,
        wiped_directories: outcome.wiped_directories,
        unlinked_directories: outcome.unlinked_directories,
        redacted_entries: outcome.redacted_entries,
    })
}

// =============================================================================
// Tests
// =============================================================================
