//! Removing directories from the on-disk chain.
//!
//! A directory is unlinked by copying its own next-directory pointer into the
//! slot that points at it. No other byte moves: the directory's entries and
//! image data stay in the file, merely unreachable.
//!
//! For the last directory the copied pointer is zero, so its predecessor (or
//! the header) becomes the new end of the chain.

use tracing::debug;

use super::codec::TiffCursor;
use super::directory::TiffFile;
use crate::error::TiffError;
use crate::io::ByteStore;

/// Unlink directory `index` from the chain.
///
/// The new pointer is read from disk at call time, so unlinking several
/// directories with the same parsed model is safe as long as higher indices
/// are unlinked first (see [`unlink_directories`]).
pub fn unlink_directory<S: ByteStore + ?Sized>(
    store: &mut S,
    file: &TiffFile,
    index: usize,
) -> Result<(), TiffError> {
    let directory = file.directory(index)?;
    let width = file.layout.pointer_width();

    let mut cursor = TiffCursor::new(store, file.byte_order());
    cursor.seek(directory.out_pointer_offset);
    let next = cursor.read_uint(width)?;

    cursor.seek(directory.in_pointer_offset);
    cursor.write_uint(width, next)?;

    debug!(
        directory = index,
        offset = directory.offset,
        slot = directory.in_pointer_offset,
        next,
        "Unlinked directory"
    );

    Ok(())
}

/// Unlink several directories, highest index first.
///
/// Duplicate indices are unlinked once. Returns the indices in the order
/// they were unlinked.
pub fn unlink_directories<S: ByteStore + ?Sized>(
    store: &mut S,
    file: &TiffFile,
    indices: &[usize],
) -> Result<Vec<usize>, TiffError> {
    let mut ordered = indices.to_vec();
    ordered.sort_unstable_by(|a, b| b.cmp(a));
    ordered.dedup();

    for &index in &ordered {
        unlink_directory(store, file, index)?;
    }

    Ok(ordered)
}

/// Make directory `index` the last one of the chain by zeroing its own
/// next-directory pointer.
///
/// Every directory after `index` becomes unreachable.
pub fn terminate_chain<S: ByteStore + ?Sized>(
    store: &mut S,
    file: &TiffFile,
    index: usize,
) -> Result<(), TiffError> {
    let directory = file.directory(index)?;
    let mut cursor = TiffCursor::new(store, file.byte_order());
    cursor.seek(directory.out_pointer_offset);
    cursor.write_uint(file.layout.pointer_width(), 0)?;

    debug!(directory = index, slot = directory.out_pointer_offset, "Terminated chain");

    Ok(())
}
