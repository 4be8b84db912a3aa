//! # Name Table Builder
//!
//! Device names are interned into one flat byte buffer of NUL-terminated
//! strings. The first occurrence of a name decides its offset; later
//! occurrences reuse it. Offsets are relative to the start of the table.

use log::trace;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct NameTable {
    bytes: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl NameTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for `names` distinct names totalling roughly `bytes` bytes.
    #[must_use]
    pub fn with_capacity(names: usize, bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            offsets: HashMap::with_capacity(names),
        }
    }

    /// Offset of `name`, appending it on first sight.
    ///
    /// Returns `None` if the offset or the grown table would not fit 32 bits.
    pub fn intern(&mut self, name: &str) -> Option<u32> {
        if let Some(&off) = self.offsets.get(name) {
            trace!("name {name:?} reuses offset {off}");
            return Some(off);
        }

        let off = u32::try_from(self.bytes.len()).ok()?;
        let grown = self.bytes.len().checked_add(name.len() + 1)?;
        u32::try_from(grown).ok()?;

        self.bytes.extend_from_slice(name.as_bytes());
        self.bytes.push(0);
        self.offsets.insert(name.to_owned(), off);
        trace!("name {name:?} interned at offset {off}");
        Some(off)
    }

    /// Number of distinct names.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.offsets.len()
    }

    /// Table size in bytes, terminators included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
