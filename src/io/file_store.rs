use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use super::byte_store::{check_range, ByteStore};
use crate::error::IoError;

/// Local filesystem implementation of [`ByteStore`].
///
/// The file size is captured once on open; since redaction never changes the
/// length of a file, it stays valid for the lifetime of the store.
pub struct FileStore {
    file: File,
    path: PathBuf,
    size: u64,
    identifier: String,
}

impl FileStore {
    /// Open a file for reading and in-place writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        Self::open_with(path.as_ref(), true)
    }

    /// Open a file for reading only (format detection, metadata listing).
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, IoError> {
        Self::open_with(path.as_ref(), false)
    }

    fn open_with(path: &Path, writable: bool) -> Result<Self, IoError> {
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .map_err(|e| open_error(path, e))?;

        let size = file.metadata().map_err(|e| open_error(path, e))?.len();

        Ok(Self {
            file,
            path: path.to_path_buf(),
            size,
            identifier: format!("file://{}", path.display()),
        })
    }

    /// Get the path this store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush pending writes to disk.
    pub fn sync(&mut self) -> Result<(), IoError> {
        self.file.sync_all().map_err(|e| IoError::Write {
            offset: self.size,
            message: e.to_string(),
        })
    }
}

fn open_error(path: &Path, err: io::Error) -> IoError {
    if err.kind() == io::ErrorKind::NotFound {
        IoError::NotFound(path.display().to_string())
    } else {
        IoError::Open {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl ByteStore for FileStore {
    fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.size)?;

        if len == 0 {
            return Ok(Bytes::new());
        }

        let read_error = |e: io::Error| IoError::Read {
            offset,
            message: e.to_string(),
        };

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(read_error)?;

        let mut buffer = vec![0u8; len];
        self.file.read_exact(&mut buffer).map_err(read_error)?;

        Ok(Bytes::from(buffer))
    }

    fn write_all_at(&mut self, offset: u64, data: &[u8]) -> Result<(), IoError> {
        check_range(offset, data.len(), self.size)?;

        if data.is_empty() {
            return Ok(());
        }

        let write_error = |e: io::Error| IoError::Write {
            offset,
            message: e.to_string(),
        };

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(write_error)?;
        self.file.write_all(data).map_err(write_error)?;

        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// In-memory implementation of [`ByteStore`].
///
/// Used for slides that are already held in memory and by the test suite.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: Vec<u8>,
    identifier: String,
}

impl MemoryStore {
    /// Wrap a byte buffer.
    pub fn new(data: Vec<u8>, identifier: impl Into<String>) -> Self {
        Self {
            data,
            identifier: identifier.into(),
        }
    }

    /// Borrow the current contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the store and return its contents.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl ByteStore for MemoryStore {
    fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.data.len() as u64)?;
        let start = offset as usize;
        Ok(Bytes::copy_from_slice(&self.data[start..start + len]))
    }

    fn write_all_at(&mut self, offset: u64, data: &[u8]) -> Result<(), IoError> {
        check_range(offset, data.len(), self.data.len() as u64)?;
        let start = offset as usize;
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
