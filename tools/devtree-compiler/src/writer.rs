//! # Blob Writer
//!
//! Concatenates `header || entries || name table` and persists the result.
//! Files are staged in the destination directory and renamed into place only
//! once fully written, so a consumer never observes a partial blob.

use crate::error::CompileError;
use devtree_abi::{HEADER_SIZE, Header};
use log::{debug, info};
use std::io::Write;
use std::path::Path;

/// The finished, immutable artifact.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Blob(Vec<u8>);

impl Blob {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Lay out the three sections back to back.
///
/// `entries` must be exactly `header.entries_count` records; the header's
/// `name_list_offset` must equal `HEADER_SIZE + entries.len()`.
#[must_use]
pub fn assemble(header: &Header, entries: &[u8], names: &[u8]) -> Blob {
    debug_assert_eq!(
        header.name_list_offset as usize,
        HEADER_SIZE + entries.len(),
        "name table must follow the entry array"
    );

    let mut out = Vec::with_capacity(HEADER_SIZE + entries.len() + names.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(entries);
    out.extend_from_slice(names);
    debug!(
        "blob: {} bytes ({} entry bytes, {} name bytes)",
        out.len(),
        entries.len(),
        names.len()
    );
    Blob(out)
}

/// Write `blob` to `path` via a temporary sibling file and an atomic rename.
///
/// # Errors
/// [`CompileError::Io`] if staging, writing, syncing or renaming fails. The
/// temporary file is removed on every error path.
pub fn write_atomic(path: &Path, blob: &Blob) -> Result<(), CompileError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut staged = tempfile::Builder::new()
        .prefix(".devtree-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| CompileError::io(dir, e))?;

    staged
        .write_all(blob.as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| CompileError::io(staged.path(), e))?;

    staged
        .persist(path)
        .map_err(|e| CompileError::io(path, e.error))?;

    info!("wrote {} bytes to {}", blob.len(), path.display());
    Ok(())
}
