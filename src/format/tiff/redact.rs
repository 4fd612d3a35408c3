//! Tag payload redaction.
//!
//! Vendors describe what to redact with a [`TagTable`]: an ordered list of
//! `(tag, rule)` pairs built at run time. The engine applies it to every
//! matching entry of every directory without knowing anything about the
//! vendor. Rules rewrite payloads in place and never change their length.

use std::fmt;

use tracing::debug;

use super::directory::TiffFile;
use super::values::ValueReader;
use crate::error::TiffError;
use crate::io::ByteStore;

// =============================================================================
// PayloadRedactor
// =============================================================================

/// A length-preserving rewrite of a tag payload.
pub trait PayloadRedactor: Send + Sync {
    /// Rewrite `payload` in place. Returns whether any byte changed.
    fn redact(&self, payload: &mut [u8]) -> bool;
}

impl<F> PayloadRedactor for F
where
    F: Fn(&mut [u8]) -> bool + Send + Sync,
{
    fn redact(&self, payload: &mut [u8]) -> bool {
        self(payload)
    }
}

/// Replace every non-NUL byte with a mask character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskText(pub u8);

impl PayloadRedactor for MaskText {
    fn redact(&self, payload: &mut [u8]) -> bool {
        let mut changed = false;
        for byte in payload.iter_mut().filter(|b| **b != 0) {
            if *byte != self.0 {
                *byte = self.0;
                changed = true;
            }
        }
        changed
    }
}

// =============================================================================
// TagTable
// =============================================================================

/// Ordered mapping from tag id to redaction rules.
///
/// A tag may appear more than once; its rules are applied in insertion
/// order.
#[derive(Default)]
pub struct TagTable {
    rules: Vec<(u16, Box<dyn PayloadRedactor>)>,
}

impl TagTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule for `tag`.
    pub fn push(&mut self, tag: u16, rule: impl PayloadRedactor + 'static) {
        self.rules.push((tag, Box::new(rule)));
    }

    /// Builder form of [`TagTable::push`].
    pub fn with_rule(mut self, tag: u16, rule: impl PayloadRedactor + 'static) -> Self {
        self.push(tag, rule);
        self
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule targets `tag`.
    pub fn contains(&self, tag: u16) -> bool {
        self.rules.iter().any(|(t, _)| *t == tag)
    }

    /// Apply every rule for `tag` to a payload.
    pub fn apply(&self, tag: u16, payload: &mut [u8]) -> bool {
        self.rules
            .iter()
            .filter(|(t, _)| *t == tag)
            .fold(false, |changed, (_, rule)| rule.redact(payload) | changed)
    }
}

impl fmt::Debug for TagTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagTable")
            .field("tags", &self.rules.iter().map(|(t, _)| *t).collect::<Vec<_>>())
            .finish()
    }
}

/// Apply a tag table to every directory of a file.
///
/// Payloads are written back only when a rule changed them. Returns the
/// number of rewritten entries.
pub fn redact_tags<S: ByteStore + ?Sized>(
    store: &mut S,
    file: &TiffFile,
    table: &TagTable,
) -> Result<usize, TiffError> {
    let mut reader = ValueReader::new(store, file);
    let mut rewritten = 0;

    for (index, directory) in file.directories.iter().enumerate() {
        for entry in directory.entries.iter().filter(|e| table.contains(e.tag)) {
            let mut payload = reader.read_bytes(entry)?.to_vec();
            if table.apply(entry.tag, &mut payload) {
                reader.write_payload(entry, &payload)?;
                rewritten += 1;
                debug!(directory = index, tag = entry.tag, "Redacted tag payload");
            }
        }
    }

    Ok(rewritten)
}

/// Find the first directory whose `tag` payload, read as text, satisfies
/// `predicate`.
pub fn find_directory<S, P>(
    store: &mut S,
    file: &TiffFile,
    tag: u16,
    predicate: P,
) -> Result<Option<usize>, TiffError>
where
    S: ByteStore + ?Sized,
    P: Fn(&str) -> bool,
{
    let mut reader = ValueReader::new(store, file);
    for (index, directory) in file.directories.iter().enumerate() {
        if let Some(entry) = directory.find_entry(tag) {
            if predicate(&reader.read_string(entry)?) {
                return Ok(Some(index));
            }
        }
    }
    Ok(None)
}

// =============================================================================
// Delimited Value Helpers
// =============================================================================

/// Position of the first `needle` at or after `from`.
pub(crate) fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

/// Position of the last `needle` ending at or before `before`.
pub(crate) fn rfind_before(haystack: &[u8], needle: &[u8], before: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack[..before.min(haystack.len())]
        .windows(needle.len())
        .rposition(|w| w == needle)
}

/// Byte ranges of the values following each occurrence of `marker`.
///
/// A value ends before the first byte in `terminators`, a NUL byte or the end
/// of the payload.
pub fn delimited_values(payload: &[u8], marker: &[u8], terminators: &[u8]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut from = 0;
    while let Some(pos) = find_from(payload, marker, from) {
        let start = pos + marker.len();
        let end = payload[start..]
            .iter()
            .position(|b| *b == 0 || terminators.contains(b))
            .map_or(payload.len(), |p| start + p);
        ranges.push((start, end));
        from = end.max(start + 1);
    }
    ranges
}

/// Mask every value following `marker` with `mask`.
pub fn mask_delimited(payload: &mut [u8], marker: &[u8], terminators: &[u8], mask: u8) -> bool {
    let mut changed = false;
    for (start, end) in delimited_values(payload, marker, terminators) {
        changed |= MaskText(mask).redact(&mut payload[start..end]);
    }
    changed
}

/// Replace every value following `marker` with `replacement`.
///
/// The replacement is truncated to the value length, or padded with `pad`
/// when shorter.
pub fn replace_delimited(
    payload: &mut [u8],
    marker: &[u8],
    terminators: &[u8],
    replacement: &[u8],
    pad: u8,
) -> bool {
    let mut changed = false;
    for (start, end) in delimited_values(payload, marker, terminators) {
        for (i, byte) in payload[start..end].iter_mut().enumerate() {
            let new = replacement.get(i).copied().unwrap_or(pad);
            if *byte != new {
                *byte = new;
                changed = true;
            }
        }
    }
    changed
}

// =============================================================================
// Tests
// =============================================================================
