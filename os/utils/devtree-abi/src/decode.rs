//! # Loader-side View
//!
//! [`DevTree::parse`] is the kernel loader contract: it checks the signature and
//! the revision before trusting any other header field, then checks that the
//! entry array and the name table lie inside the buffer. Entries are decoded
//! lazily; each one resolves its name at
//! `name_list_offset + rel_name_offset`, up to the next NUL.

use crate::{
    DEVTREE_REVISION, DEVTREE_SIGNATURE, DeviceType, ENTRY_SIZE, Entry, HEADER_SIZE, Header,
    name_list_offset,
};

/// Decode-time corruption. None of these are recoverable; the blob is rejected.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DevTreeError {
    #[error("blob is shorter than the header")]
    TooShort,
    #[error("signature mismatch")]
    BadSignature,
    #[error("unsupported revision {0}")]
    UnsupportedRevision(u32),
    #[error("blob is shorter than its {0} declared entries")]
    Truncated(u32),
    #[error("name list offset {found} does not follow the entry array (expected {expected})")]
    NameListMismatch { found: u32, expected: usize },
    #[error("name offset {0} lies outside the name table")]
    NameOutOfRange(u32),
    #[error("name at offset {0} is not NUL-terminated")]
    UnterminatedName(u32),
    #[error("name at offset {0} is not valid UTF-8")]
    Utf8(u32),
    #[error("unknown device type tag {0}")]
    UnknownDeviceType(u32),
    #[error("entry index {0} out of range")]
    IndexOutOfRange(usize),
}

/// Parsed view over an in-memory blob.
#[derive(Debug, Copy, Clone)]
pub struct DevTree<'a> {
    blob: &'a [u8],
    header: Header,
}

/// A decoded entry together with its resolved name.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Device<'a> {
    pub entry: Entry,
    pub name: &'a str,
}

impl Device<'_> {
    /// Typed device kind.
    ///
    /// # Errors
    /// [`DevTreeError::UnknownDeviceType`] if the tag is not one this revision defines.
    pub const fn device_type(&self) -> Result<DeviceType, DevTreeError> {
        match self.entry.kind() {
            Some(kind) => Ok(kind),
            None => Err(DevTreeError::UnknownDeviceType(self.entry.device_type)),
        }
    }
}

/// Iterator over all entries; yields a `Result` per entry.
pub struct Entries<'a> {
    tree: DevTree<'a>,
    idx: usize,
}

impl<'a> DevTree<'a> {
    /// Parse and validate a blob.
    ///
    /// # Errors
    /// Any [`DevTreeError`] describing why the blob cannot be trusted.
    pub fn parse(blob: &'a [u8]) -> Result<Self, DevTreeError> {
        let raw: &[u8; HEADER_SIZE] = blob
            .get(..HEADER_SIZE)
            .and_then(|s| s.try_into().ok())
            .ok_or(DevTreeError::TooShort)?;
        let header = Header::from_bytes(raw);

        if header.signature != DEVTREE_SIGNATURE {
            return Err(DevTreeError::BadSignature);
        }
        if header.revision != DEVTREE_REVISION {
            return Err(DevTreeError::UnsupportedRevision(header.revision));
        }

        // Ensure the entry table fits.
        let entries_end = name_list_offset(header.entries_count as usize)
            .ok_or(DevTreeError::Truncated(header.entries_count))?;
        if entries_end > blob.len() {
            return Err(DevTreeError::Truncated(header.entries_count));
        }

        // The name table immediately follows the entries; there is no padding.
        if header.name_list_offset as usize != entries_end {
            return Err(DevTreeError::NameListMismatch {
                found: header.name_list_offset,
                expected: entries_end,
            });
        }

        Ok(Self { blob, header })
    }

    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.header.entries_count as usize
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes of the name table.
    #[must_use]
    pub fn name_table(&self) -> &'a [u8] {
        &self.blob[self.header.name_list_offset as usize..]
    }

    /// Iterate over entries by index (0..count).
    #[must_use]
    pub const fn entries(&self) -> Entries<'a> {
        Entries {
            tree: *self,
            idx: 0,
        }
    }

    /// Decode entry `i` and resolve its name.
    ///
    /// # Errors
    /// [`DevTreeError::IndexOutOfRange`] for a bad index, otherwise any name
    /// resolution error.
    pub fn get(&self, i: usize) -> Result<Device<'a>, DevTreeError> {
        if i >= self.len() {
            return Err(DevTreeError::IndexOutOfRange(i));
        }

        // `parse` guaranteed the whole entry array is in bounds.
        let off = HEADER_SIZE + i * ENTRY_SIZE;
        let raw: &[u8; ENTRY_SIZE] = self.blob[off..off + ENTRY_SIZE]
            .try_into()
            .map_err(|_| DevTreeError::Truncated(self.header.entries_count))?;
        let entry = Entry::from_bytes(raw);
        let name = self.name_at(entry.rel_name_offset)?;
        Ok(Device { entry, name })
    }

    /// Find the first device named `needle`.
    ///
    /// Entries are scanned in blob order; the first one whose name cannot be
    /// resolved ends the search.
    ///
    /// # Errors
    /// The name resolution error of the first corrupt entry before a match.
    pub fn find(&self, needle: &str) -> Result<Option<Device<'a>>, DevTreeError> {
        for device in self.entries() {
            let device = device?;
            if device.name == needle {
                return Ok(Some(device));
            }
        }
        Ok(None)
    }

    /// Devices of the given type, in blob order.
    ///
    /// Entries whose name cannot be resolved are yielded as errors, since their
    /// type cannot be trusted either.
    pub fn of_type(
        &self,
        device_type: DeviceType,
    ) -> impl Iterator<Item = Result<Device<'a>, DevTreeError>> + use<'a> {
        self.entries().filter(move |d| match d {
            Ok(d) => d.entry.kind() == Some(device_type),
            Err(_) => true,
        })
    }

    fn name_at(&self, rel: u32) -> Result<&'a str, DevTreeError> {
        let table = self.name_table();
        let start = rel as usize;
        if start >= table.len() {
            return Err(DevTreeError::NameOutOfRange(rel));
        }

        let len = table[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(DevTreeError::UnterminatedName(rel))?;

        core::str::from_utf8(&table[start..start + len]).map_err(|_| DevTreeError::Utf8(rel))
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<Device<'a>, DevTreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.tree.len() {
            return None;
        }
        let i = self.idx;
        self.idx += 1;
        Some(self.tree.get(i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let r = self.tree.len().saturating_sub(self.idx);
        (r, Some(r))
    }
}

impl core::iter::FusedIterator for Entries<'_> {}
