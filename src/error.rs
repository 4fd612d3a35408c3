use thiserror::Error;

/// I/O errors raised by a [`ByteStore`](crate::io::ByteStore).
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Requested range exceeds the store bounds (a short read or write)
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Reading from the underlying store failed
    #[error("Read failed at offset {offset}: {message}")]
    Read { offset: u64, message: String },

    /// Writing to the underlying store failed
    #[error("Write failed at offset {offset}: {message}")]
    Write { offset: u64, message: String },

    /// File does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// File exists but could not be opened or copied
    #[error("Could not open {path}: {message}")]
    Open { path: String, message: String },

    /// Integer width other than 1, 2, 4 or 8 bytes
    #[error("Unsupported integer width: {0} bytes")]
    InvalidWidth(usize),
}

/// Errors raised by the TIFF directory engine.
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error outside of the directory walk
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// Invalid BigTIFF header padding (must be 0)
    #[error("Invalid BigTIFF header padding: expected 0, got {0}")]
    InvalidBigTiffPadding(u16),

    /// Short read while walking the directory chain
    #[error("Failed to read directory at offset {offset}: {source}")]
    DirectoryRead { offset: u64, source: IoError },

    /// The directory chain points back at an already visited directory
    #[error("Directory chain loops back to offset {0}")]
    DirectoryLoop(u64),

    /// Unknown field type in a directory entry
    #[error("Unsupported field type: {0}")]
    UnsupportedType(u16),

    /// Offset and byte count arrays resolve to different lengths
    #[error("Strip mismatch: {offsets} offsets but {lengths} byte counts")]
    StripMismatch { offsets: usize, lengths: usize },

    /// On-disk bytes do not start with the expected prefix
    #[error("Expected prefix not found at offset {offset}")]
    PrefixMismatch { offset: u64 },

    /// Required tag is missing from a directory
    #[error("Missing tag: {0}")]
    MissingTag(u16),

    /// Directory index is not part of the parsed file
    #[error("Directory index {index} out of range (file has {count} directories)")]
    DirectoryOutOfRange { index: usize, count: usize },

    /// Replacement payload does not match the on-disk payload length
    #[error("Payload length mismatch: expected {expected} bytes, got {actual}")]
    PayloadLength { expected: usize, actual: usize },
}

impl TiffError {
    /// Whether this error was raised while validating the file header.
    pub fn is_header_error(&self) -> bool {
        matches!(
            self,
            TiffError::InvalidMagic(_)
                | TiffError::InvalidVersion(_)
                | TiffError::InvalidBigTiffOffsetSize(_)
                | TiffError::InvalidBigTiffPadding(_)
        )
    }
}

/// Errors raised by an anonymization run.
#[derive(Debug, Clone, Error)]
pub enum AnonymizeError {
    /// I/O error while opening or copying the slide
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// TIFF engine error
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// File format is not supported
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    /// The directory holding the label or macro image was not found
    #[error("Could not find the {kind} directory")]
    MissingDirectory { kind: &'static str },

    /// Options were rejected before touching the file
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}
