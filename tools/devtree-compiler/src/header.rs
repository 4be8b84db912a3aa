//! # Header Assembler
//!
//! The header's layout fields are pure functions of the entry count, computed
//! once every entry has been encoded.

use crate::error::CompileError;
use devtree_abi::layout::{Field, header};
use devtree_abi::{Header, name_list_offset};
use log::debug;

/// Compose the header for `entries_count` entries.
///
/// # Errors
/// [`CompileError::LayoutOverflow`] if the count or the name table offset does
/// not fit 32 bits.
pub fn assemble(entries_count: usize, flags: u32) -> Result<Header, CompileError> {
    let overflow = |field: Field, value: usize| CompileError::LayoutOverflow {
        field: field.name,
        value: u64::try_from(value).unwrap_or(u64::MAX),
    };

    let count = u32::try_from(entries_count)
        .map_err(|_| overflow(header::ENTRIES_COUNT, entries_count))?;
    let offset = name_list_offset(entries_count)
        .ok_or_else(|| overflow(header::NAME_LIST_OFFSET, usize::MAX))?;
    let offset = u32::try_from(offset).map_err(|_| overflow(header::NAME_LIST_OFFSET, offset))?;

    debug!("header: {count} entries, name table at {offset:#x}, flags {flags:#x}");
    Ok(Header::new(count, offset, flags))
}
